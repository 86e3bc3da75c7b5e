use thiserror::Error;

/// Unified error type for the Arbor configuration workspace.
///
/// Only operations that touch the outside world return it. Structural misses
/// in the raw tree are `Option`s and rejected option values are reported as
/// warnings, never as errors.
#[derive(Error, Debug)]
pub enum ArborError {
    // ── Config errors ──────────────────────────────────────────
    #[error("config error: {0}")]
    Config(String),

    #[error("config file not found: {0}")]
    NotFound(String),

    // ── Watcher errors ─────────────────────────────────────────
    #[error("file watcher error: {0}")]
    Watch(String),

    // ── Generic wrappers ───────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ArborError>;
