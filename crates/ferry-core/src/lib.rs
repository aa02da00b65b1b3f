//! # ferry-core
//!
//! Core types, traits, and primitives for the Ferry coordinator.
//! This crate defines the shared vocabulary used by every other crate in the workspace.

pub mod error;
pub mod message;
pub mod session;

pub use error::{FerryError, Result};
pub use message::{ChatMessage, NO_MESSAGES, PipelineReport};
pub use session::ToolSession;
