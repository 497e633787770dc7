pub mod app;
pub mod config;
pub mod controller;
pub mod groq;
pub mod handler;
pub mod state;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::{Config, KeySource, KeySources};
pub use controller::{Outcome, PendingRequest, SubmitError};
pub use groq::{GroqClient, GroqError, ParseOutcome};
pub use state::{ChatRole, ChatState, ChatTurn, RequestStatus};
