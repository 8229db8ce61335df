//! Engine-level state.

/// Lifecycle of the render engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    /// Terminal and placeholder snapshots are being set up.
    #[default]
    Starting,
    /// Normal operation, no panel holds focus.
    Running,
    /// A panel holds input focus.
    Paused,
    /// Quit was requested; the terminal is about to be restored.
    ShuttingDown,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Starting => write!(f, "Starting"),
            Self::Running => write!(f, "Running"),
            Self::Paused => write!(f, "Focused"),
            Self::ShuttingDown => write!(f, "Stopping"),
        }
    }
}

/// Global application state.
#[derive(Debug, Default)]
pub struct AppState {
    /// Engine lifecycle.
    pub engine: EngineState,
    /// Whether to show help overlay.
    pub show_help: bool,
    /// Whether the app should quit.
    pub should_quit: bool,
}

impl AppState {
    /// Create a new application state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the engine is past startup and not shutting down.
    pub fn is_active(&self) -> bool {
        matches!(self.engine, EngineState::Running | EngineState::Paused)
    }
}
