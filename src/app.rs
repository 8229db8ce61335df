//! Main application module.
//!
//! This module contains the engine entry point [`run`], the [`Dashboard`]
//! that turns cache snapshots into frames, and the [`App`] that owns the
//! terminal and coordinates input, rendering and polling.

use crate::cache::{FeedCache, FeedSnapshot};
use crate::config::Config;
use crate::error::{Error, FeedError, Result};
use crate::events::EventHandler;
use crate::feeds::{HttpClient, ReqwestClient};
use crate::scheduler::PollScheduler;
use crate::state::{Action, Store};
use crate::ui::Ui;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::{Stream, StreamExt};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};
use std::io::{self, Stdout};
use std::sync::{Arc, Once};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Run the dashboard until the user quits or `shutdown` is cancelled.
///
/// `refresh_override` replaces every feed's interval (raised to the refresh
/// floor if needed). Feed failures never end the run; configuration and
/// terminal errors do, after the terminal has been restored.
pub async fn run(
    config: Config,
    refresh_override: Option<Duration>,
    shutdown: CancellationToken,
) -> Result<()> {
    let config = match refresh_override {
        Some(interval) => config.with_refresh_override(interval),
        None => config,
    };
    config.validate()?;

    let http = http_client(config.request_timeout())?;
    let cache = FeedCache::new(config.enabled_feeds().map(|(id, _)| id.clone()));
    let mut scheduler = PollScheduler::new(&config, cache.clone(), http, shutdown.clone());

    let mut app = App::new(&config, cache, shutdown)?;
    scheduler.start();
    info!("Started {} feed pollers", scheduler.feed_count());

    let result = app.run(&scheduler).await;
    scheduler.shutdown().await;
    drop(app);

    info!("Dashboard stopped");
    result
}

/// Build the shared HTTP client. Failing here is a startup error, not a feed error.
fn http_client(timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    let client = ReqwestClient::new(timeout).map_err(client_setup_error)?;
    Ok(Arc::new(client))
}

fn client_setup_error(err: FeedError) -> Error {
    Error::config(format!("failed to build HTTP client: {}", err))
}

/// Renders cache snapshots into a terminal, skipping unchanged frames.
pub struct Dashboard<B: Backend> {
    terminal: Terminal<B>,
    store: Store,
    cache: FeedCache,
    ui: Ui,
    event_handler: EventHandler,
    frame_interval: Duration,
}

impl<B: Backend> Dashboard<B> {
    /// Create a dashboard showing `config`'s panels from `cache`.
    pub fn new(terminal: Terminal<B>, config: &Config, cache: FeedCache) -> Self {
        Self {
            terminal,
            store: Store::new(config.panels()),
            cache,
            ui: Ui::new(config),
            event_handler: EventHandler::new(
                config.keybindings.clone(),
                config.general.mouse_support,
            ),
            frame_interval: config.frame_interval(),
        }
    }

    /// Current view state.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Apply an action to the view state.
    pub fn reduce(&mut self, action: Action) {
        self.store.reduce(action);
    }

    /// The terminal being drawn to.
    pub fn terminal_mut(&mut self) -> &mut Terminal<B> {
        &mut self.terminal
    }

    /// Current snapshot of every panel, in panel order.
    fn snapshots(&self) -> Vec<Arc<FeedSnapshot>> {
        self.store
            .panels
            .iter()
            .map(|panel| {
                self.cache
                    .get(&panel.feed_id)
                    .unwrap_or_else(|| Arc::new(FeedSnapshot::loading()))
            })
            .collect()
    }

    /// Draw a frame if any snapshot or view state changed since the last one.
    ///
    /// Returns whether the terminal was written to.
    pub fn draw_if_changed(&mut self) -> Result<bool> {
        let snapshots = self.snapshots();
        self.store.sync_snapshots(&snapshots);
        if !self.store.needs_redraw(&snapshots) {
            return Ok(false);
        }

        self.terminal
            .draw(|frame| self.ui.render(frame, &self.store, &snapshots))?;
        self.store.mark_rendered(&snapshots);
        Ok(true)
    }

    /// Run the frame clock and input loop until quit or `shutdown` fires.
    ///
    /// Cancels `shutdown` on the way out so the pollers stop too.
    pub async fn run<S>(
        &mut self,
        mut events: S,
        scheduler: &PollScheduler,
        shutdown: &CancellationToken,
    ) -> Result<()>
    where
        S: Stream<Item = io::Result<Event>> + Unpin,
    {
        let mut frames = tokio::time::interval(self.frame_interval);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Render loop started ({} panels, frame every {:?})",
            self.store.panels.len(),
            self.frame_interval
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Shutdown requested externally");
                    self.store.reduce(Action::Quit);
                }

                _ = frames.tick() => {
                    self.draw_if_changed()?;
                }

                maybe_event = events.next() => match maybe_event {
                    Some(Ok(event)) => {
                        self.event_handler.update_store_snapshot(&self.store);
                        if let Some(action) = self.event_handler.handle_event(&event) {
                            self.handle_action(action, scheduler);
                        }
                    }
                    Some(Err(e)) => return Err(e.into()),
                    None => self.store.reduce(Action::Quit),
                },
            }

            // Check if we should quit
            if self.store.app.should_quit {
                break;
            }
        }

        shutdown.cancel();
        Ok(())
    }

    /// Handle an action.
    fn handle_action(&mut self, action: Action, scheduler: &PollScheduler) {
        debug!("Action: {:?}", action);
        if action == Action::RefreshAll {
            info!("Manual refresh requested");
            scheduler.refresh_all();
        }
        self.store.reduce(action);
    }
}

/// The interactive application.
pub struct App {
    /// Terminal, view state, renderer and input mapping.
    dashboard: Dashboard<CrosstermBackend<Stdout>>,
    /// Whether mouse capture was enabled.
    mouse_capture: bool,
    /// Shared shutdown signal.
    shutdown: CancellationToken,
}

impl App {
    /// Set up the terminal and create the application.
    pub fn new(config: &Config, cache: FeedCache, shutdown: CancellationToken) -> Result<Self> {
        install_panic_hook();

        let mouse_capture = config.general.mouse_support;
        let terminal = setup_terminal(mouse_capture).inspect_err(|_| restore_terminal())?;

        let mut dashboard = Dashboard::new(terminal, config, cache);
        dashboard.reduce(Action::Ready);

        Ok(Self {
            dashboard,
            mouse_capture,
            shutdown,
        })
    }

    /// Run the render and input loop on the terminal's event stream.
    pub async fn run(&mut self, scheduler: &PollScheduler) -> Result<()> {
        self.dashboard
            .run(EventStream::new(), scheduler, &self.shutdown)
            .await
    }
}

impl Drop for App {
    fn drop(&mut self) {
        // Restore terminal state
        let _ = disable_raw_mode();
        let terminal = self.dashboard.terminal_mut();
        if self.mouse_capture {
            let _ = execute!(terminal.backend_mut(), DisableMouseCapture);
        }
        let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
        let _ = terminal.show_cursor();
    }
}

fn setup_terminal(mouse_capture: bool) -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().map_err(|e| Error::terminal(format!("failed to enable raw mode: {}", e)))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)
        .map_err(|e| Error::terminal(format!("failed to enter alternate screen: {}", e)))?;
    if mouse_capture {
        execute!(stdout, EnableMouseCapture)
            .map_err(|e| Error::terminal(format!("failed to capture mouse: {}", e)))?;
    }
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| Error::terminal(e.to_string()))
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
}

/// Restore the terminal before the default panic message is printed.
fn install_panic_hook() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore_terminal();
            original_hook(info);
        }));
    });
}
