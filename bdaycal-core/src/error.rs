//! Error types for birthday calendar runs.

use thiserror::Error;

/// Errors that abort a run. Per-item apply failures are not errors; they are
/// collected in the [`ApplyReport`](crate::apply::ApplyReport).
#[derive(Error, Debug)]
pub enum BdayCalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Remote store at {address} unreachable after {attempts} attempts")]
    Unreachable { address: String, attempts: u32 },

    #[error("Could not decode {href}: {reason}")]
    Decode { href: String, reason: String },

    #[error("Contact source error: {0}")]
    Source(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("ICS generation error: {0}")]
    IcsGenerate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BdayCalError {
    /// Pipeline stage a fatal error is reported under.
    pub fn stage(&self) -> &'static str {
        match self {
            BdayCalError::Config(_) | BdayCalError::Io(_) => "config",
            BdayCalError::Unreachable { .. } => "connectivity",
            BdayCalError::Source(_) => "contacts",
            BdayCalError::Decode { .. } | BdayCalError::Transport(_) => "snapshot",
            BdayCalError::IcsGenerate(_) => "apply",
        }
    }
}

/// Result type alias for birthday calendar operations.
pub type BdayCalResult<T> = Result<T, BdayCalError>;
