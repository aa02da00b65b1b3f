//! # ferry-config
//!
//! Configuration system for the Ferry coordinator. Reads from `ferry.toml`
//! and environment variables — in that precedence order for paths, with env
//! vars as fallback for credentials.

pub mod loader;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{ConfigWarning, FerryConfig, SPREADSHEET_ID_PLACEHOLDER, WarningSeverity};
