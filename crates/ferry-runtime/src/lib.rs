//! # ferry-runtime
//!
//! The coordinator runtime — the never-ending loop that polls the chat
//! session for work, drives each message through the fixed
//! generate/store/notify/reply pipeline against the docs session, and
//! contains per-iteration faults so one bad message or flaky backend never
//! takes the process down.

pub mod coordinator;

pub use coordinator::{Coordinator, Outcome};
