use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Operators sometimes ship a template config with this value still in
/// place; it is treated the same as an unset spreadsheet id.
pub const SPREADSHEET_ID_PLACEHOLDER: &str = "your_spreadsheet_id_here";

/// Root configuration — maps to `ferry.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FerryConfig {
    pub llm: LlmConfig,
    pub chat: ChatConfig,
    pub docs: DocsConfig,
    pub sheets: SheetsConfig,
    pub notify: NotifyConfig,
    pub runtime: RuntimeConfig,
    pub logging: LoggingConfig,
}

// ── Text generation ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key for the generative-language backend. Falls back to the
    /// `GEMINI_API_KEY` environment variable when unset here.
    pub api_key: Option<String>,
    /// Model identifier, e.g. "gemini-2.0-flash".
    pub model: String,
    /// REST endpoint base.
    pub base_url: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.0-flash".into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
        }
    }
}

// ── Chat backend ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// SSE endpoint of the chat MCP server.
    pub sse_url: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            sse_url: "http://localhost:8000/sse".into(),
        }
    }
}

// ── Docs backend ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    /// Command used to spawn the workspace MCP server.
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    /// Extra environment variables passed to the spawned server.
    pub env: HashMap<String, String>,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            command: "python3".into(),
            args: vec!["mcp_server_google.py".into()],
            working_dir: None,
            env: HashMap::new(),
        }
    }
}

// ── Spreadsheet ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    /// Target spreadsheet id. Unset (or the placeholder) triggers lazy
    /// creation of a new sheet on the first processed message.
    pub spreadsheet_id: Option<String>,
    /// When set, the lazily-created id is written here and read back on
    /// the next startup. Without it the id lives in process memory only.
    pub id_file: Option<PathBuf>,
}

impl SheetsConfig {
    /// The explicitly configured id, with the placeholder filtered out.
    pub fn configured_id(&self) -> Option<String> {
        self.spreadsheet_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty() && *id != SPREADSHEET_ID_PLACEHOLDER)
            .map(String::from)
    }

    /// Resolve the id to start with: the configured id, else whatever a
    /// previous run persisted to `id_file`.
    pub fn initial_id(&self) -> Option<String> {
        if let Some(id) = self.configured_id() {
            return Some(id);
        }
        let path = self.id_file.as_ref()?;
        let id = std::fs::read_to_string(path).ok()?;
        let id = id.trim();
        if id.is_empty() { None } else { Some(id.into()) }
    }
}

// ── Notification ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Email address to notify per processed message. Unset skips the
    /// notification stage entirely.
    pub email: Option<String>,
}

// ── Runtime loop ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Idle wait between empty polls, in seconds.
    pub poll_interval_secs: u64,
    /// Backoff after a contained iteration fault, in seconds. Should be
    /// longer than the poll interval.
    pub fault_backoff_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 2,
            fault_backoff_secs: 5,
        }
    }
}

impl RuntimeConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn fault_backoff(&self) -> Duration {
        Duration::from_secs(self.fault_backoff_secs)
    }
}

// ── Logging ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter when RUST_LOG is not set.
    pub level: String,
    /// "pretty" or "json".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

// ── Validation ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
    pub severity: WarningSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Error,
    Warning,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let icon = match self.severity {
            WarningSeverity::Error => "❌",
            WarningSeverity::Warning => "⚠️ ",
        };
        write!(f, "{} {}: {}", icon, self.field, self.message)
    }
}

impl FerryConfig {
    /// Validate the config and return a list of warnings.
    /// Returns `Err` with all messages joined if any severity is Error.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, String> {
        let mut warnings = Vec::new();

        if self.llm.api_key.is_none() {
            warnings.push(ConfigWarning {
                field: "llm.api_key".into(),
                message: "no API key configured; every generation call will fail".into(),
                severity: WarningSeverity::Warning,
            });
        }

        if self.docs.command.trim().is_empty() {
            warnings.push(ConfigWarning {
                field: "docs.command".into(),
                message: "docs server command is empty".into(),
                severity: WarningSeverity::Error,
            });
        }

        if self.chat.sse_url.trim().is_empty() {
            warnings.push(ConfigWarning {
                field: "chat.sse_url".into(),
                message: "chat SSE endpoint is empty".into(),
                severity: WarningSeverity::Error,
            });
        }

        if self.sheets.spreadsheet_id.as_deref() == Some(SPREADSHEET_ID_PLACEHOLDER) {
            warnings.push(ConfigWarning {
                field: "sheets.spreadsheet_id".into(),
                message: "placeholder value treated as unset; a sheet will be created lazily"
                    .into(),
                severity: WarningSeverity::Warning,
            });
        }

        if self.runtime.poll_interval_secs == 0 {
            warnings.push(ConfigWarning {
                field: "runtime.poll_interval_secs".into(),
                message: "poll interval must be non-zero to avoid busy-spinning".into(),
                severity: WarningSeverity::Error,
            });
        }

        if self.runtime.fault_backoff_secs < self.runtime.poll_interval_secs {
            warnings.push(ConfigWarning {
                field: "runtime.fault_backoff_secs".into(),
                message: "fault backoff is shorter than the poll interval".into(),
                severity: WarningSeverity::Warning,
            });
        }

        let errors: Vec<String> = warnings
            .iter()
            .filter(|w| w.severity == WarningSeverity::Error)
            .map(|w| format!("{}: {}", w.field, w.message))
            .collect();

        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(errors.join("; "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = FerryConfig::default();
        let warnings = config.validate().unwrap();
        // Missing API key is only a warning.
        assert!(
            warnings
                .iter()
                .all(|w| w.severity == WarningSeverity::Warning)
        );
    }

    #[test]
    fn test_placeholder_spreadsheet_id_is_unset() {
        let sheets = SheetsConfig {
            spreadsheet_id: Some(SPREADSHEET_ID_PLACEHOLDER.into()),
            id_file: None,
        };
        assert_eq!(sheets.configured_id(), None);

        let sheets = SheetsConfig {
            spreadsheet_id: Some("1AbC".into()),
            id_file: None,
        };
        assert_eq!(sheets.configured_id(), Some("1AbC".into()));
    }

    #[test]
    fn test_empty_docs_command_is_an_error() {
        let mut config = FerryConfig::default();
        config.docs.command = "".into();
        let err = config.validate().unwrap_err();
        assert!(err.contains("docs.command"));
    }

    #[test]
    fn test_zero_poll_interval_is_an_error() {
        let mut config = FerryConfig::default();
        config.runtime.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_initial_id_prefers_configured_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let id_file = dir.path().join("sheet-id");
        std::fs::write(&id_file, "from-file\n").unwrap();

        let sheets = SheetsConfig {
            spreadsheet_id: Some("configured".into()),
            id_file: Some(id_file.clone()),
        };
        assert_eq!(sheets.initial_id(), Some("configured".into()));

        let sheets = SheetsConfig {
            spreadsheet_id: None,
            id_file: Some(id_file),
        };
        assert_eq!(sheets.initial_id(), Some("from-file".into()));
    }

    #[test]
    fn test_parse_minimal_toml() {
        let raw = r#"
            [llm]
            api_key = "k"

            [notify]
            email = "ops@example.com"

            [runtime]
            poll_interval_secs = 1
        "#;
        let config: FerryConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.llm.api_key.as_deref(), Some("k"));
        assert_eq!(config.llm.model, "gemini-2.0-flash");
        assert_eq!(config.notify.email.as_deref(), Some("ops@example.com"));
        assert_eq!(config.runtime.poll_interval_secs, 1);
        assert_eq!(config.runtime.fault_backoff_secs, 5);
    }
}
