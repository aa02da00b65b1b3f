use thiserror::Error;

/// Unified error type for the entire Ferry coordinator.
#[derive(Error, Debug)]
pub enum FerryError {
    // ── Session errors ─────────────────────────────────────────
    #[error("connection failed: {session}: {reason}")]
    Connection { session: String, reason: String },

    #[error("handshake failed: {session}: {reason}")]
    Handshake { session: String, reason: String },

    #[error("session error: {session}: {reason}")]
    Session { session: String, reason: String },

    // ── Remote procedure errors ────────────────────────────────
    #[error("remote tool failed: {tool}: {message}")]
    Remote { tool: String, message: String },

    // ── Inbound message errors ─────────────────────────────────
    #[error("decode error: {0}")]
    Decode(String),

    // ── Text generation errors ─────────────────────────────────
    #[error("generation failed: {0}")]
    Generation(String),

    // ── Config errors ──────────────────────────────────────────
    #[error("config error: {0}")]
    Config(String),

    #[error("config validation failed: {field}: {reason}")]
    ConfigValidation { field: String, reason: String },

    // ── Generic wrappers ───────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, FerryError>;
