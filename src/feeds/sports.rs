//! Scores from the ESPN scoreboard API.

use super::{FeedKind, FeedRecord, FetchOutcome, HttpClient, Trend, merge_partial};
use crate::config::SportsParams;
use crate::error::FeedError;
use chrono::{DateTime, NaiveDateTime, Utc};
use futures::future::join_all;
use serde::Deserialize;
use std::sync::Arc;

const ESPN_API_BASE: &str = "https://site.api.espn.com/apis/site/v2/sports";

/// Resolve a league short name (or an explicit `sport/league` path) to its ESPN path.
pub fn league_path(league: &str) -> Option<String> {
    let league = league.trim().to_lowercase();
    if league.contains('/') {
        return Some(league);
    }
    let path = match league.as_str() {
        "nba" => "basketball/nba",
        "wnba" => "basketball/wnba",
        "ncaab" => "basketball/mens-college-basketball",
        "nfl" => "football/nfl",
        "ncaaf" => "football/college-football",
        "mlb" => "baseball/mlb",
        "nhl" => "hockey/nhl",
        "mls" => "soccer/usa.1",
        "epl" => "soccer/eng.1",
        _ => return None,
    };
    Some(path.to_string())
}

/// Scoreboards for one or more leagues.
pub struct SportsFeed {
    params: SportsParams,
    http: Arc<dyn HttpClient>,
}

/// Game phase as reported by the scoreboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GameState {
    Live,
    Scheduled,
    Final,
}

#[derive(Debug, Clone)]
struct Game {
    state: GameState,
    start: Option<DateTime<Utc>>,
    record: FeedRecord,
}

#[derive(Deserialize)]
struct EspnEvent {
    #[serde(default)]
    date: String,
    competitions: Vec<EspnCompetition>,
    status: EspnStatus,
}

#[derive(Deserialize)]
struct EspnCompetition {
    competitors: Vec<EspnCompetitor>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EspnCompetitor {
    home_away: String,
    team: EspnTeam,
    #[serde(default)]
    score: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EspnTeam {
    display_name: String,
    #[serde(default)]
    abbreviation: Option<String>,
}

#[derive(Deserialize)]
struct EspnStatus {
    #[serde(rename = "type")]
    status_type: EspnStatusType,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EspnStatusType {
    state: String,
    #[serde(default)]
    short_detail: String,
}

fn parse_start(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ")
                .ok()
                .map(|dt| dt.and_utc())
        })
}

fn convert_event(event: EspnEvent, league: &str) -> Option<Game> {
    let comp = event.competitions.first()?;
    let home = comp.competitors.iter().find(|c| c.home_away == "home")?;
    let away = comp.competitors.iter().find(|c| c.home_away == "away")?;

    let state = match event.status.status_type.state.as_str() {
        "in" => GameState::Live,
        "post" => GameState::Final,
        _ => GameState::Scheduled,
    };
    let name = |c: &EspnCompetitor| {
        c.team
            .abbreviation
            .clone()
            .unwrap_or_else(|| c.team.display_name.clone())
    };
    let score = |c: &EspnCompetitor| c.score.clone().unwrap_or_else(|| "0".to_string());

    let title = match state {
        GameState::Scheduled => format!("{} @ {}", name(away), name(home)),
        _ => format!(
            "{} {} @ {} {}",
            name(away),
            score(away),
            name(home),
            score(home)
        ),
    };
    let trend = match state {
        GameState::Live => Trend::Up,
        GameState::Final => Trend::Flat,
        GameState::Scheduled => Trend::None,
    };
    let start = parse_start(&event.date);

    let record = FeedRecord::new(FeedKind::Sports, title)
        .with_detail(event.status.status_type.short_detail)
        .with_group(league.to_uppercase())
        .with_trend(trend)
        .with_sort_key(start.map(|dt| dt.timestamp()).unwrap_or(i64::MAX));

    Some(Game {
        state,
        start,
        record,
    })
}

/// Parse a scoreboard document for `league`.
///
/// Events that do not deserialize or lack a home/away pair are dropped and
/// counted. Games are ordered live first, then scheduled by start time, then
/// final.
pub fn parse_scoreboard(json: &str, league: &str) -> Result<(Vec<FeedRecord>, usize), FeedError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let events = value
        .get("events")
        .and_then(|e| e.as_array())
        .ok_or_else(|| FeedError::parse("scoreboard has no events array"))?;

    let mut games = Vec::with_capacity(events.len());
    let mut dropped = 0usize;
    for raw in events {
        let game = serde_json::from_value::<EspnEvent>(raw.clone())
            .ok()
            .and_then(|event| convert_event(event, league));
        match game {
            Some(game) => games.push(game),
            None => dropped += 1,
        }
    }

    games.sort_by(|a, b| {
        a.state.cmp(&b.state).then_with(|| match a.state {
            GameState::Final => b.start.cmp(&a.start),
            _ => a.start.cmp(&b.start),
        })
    });

    Ok((games.into_iter().map(|g| g.record).collect(), dropped))
}

impl SportsFeed {
    /// Create a sports feed.
    pub fn new(params: SportsParams, http: Arc<dyn HttpClient>) -> Self {
        Self { params, http }
    }

    async fn fetch_league(&self, league: &str) -> Result<(Vec<FeedRecord>, usize), FeedError> {
        let path = league_path(league)
            .ok_or_else(|| FeedError::parse(format!("unknown league '{}'", league)))?;
        let url = format!("{}/{}/scoreboard", ESPN_API_BASE, path);
        let body = self.http.get_text(&url).await?;
        let label = league.rsplit('/').next().unwrap_or(league);
        parse_scoreboard(&body, label)
    }

    /// Fetch every league concurrently; records are grouped by league in configured order.
    pub async fn fetch(&self) -> Result<FetchOutcome, FeedError> {
        let results = join_all(self.params.leagues.iter().map(|l| self.fetch_league(l))).await;
        let (leagues, failed) = merge_partial(results)?;

        let mut dropped = failed;
        let mut records = Vec::new();
        for (games, malformed) in leagues {
            dropped += malformed;
            records.extend(games);
        }
        Ok(FetchOutcome::new(records, dropped))
    }
}
