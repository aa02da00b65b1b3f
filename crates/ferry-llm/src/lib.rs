//! # ferry-llm
//!
//! Abstraction layer over the generative-text backend. The coordinator only
//! ever needs one operation: turn a user prompt into a completion.

pub mod gemini;
pub mod mock;
pub mod provider;

pub use gemini::GeminiProvider;
pub use mock::MockGenerator;
pub use provider::TextGenerator;
