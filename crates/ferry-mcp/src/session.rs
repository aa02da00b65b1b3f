use async_trait::async_trait;
use rmcp::handler::client::ClientHandler;
use rmcp::model::{
    CallToolRequestParam, ClientCapabilities, ClientInfo, Implementation, InitializeRequestParams,
    ProtocolVersion,
};
use rmcp::service::{RoleClient, RunningService, serve_client};
use rmcp::transport::child_process::TokioChildProcess;
use rmcp::transport::sse_client::SseClientTransport;
use serde_json::{Map, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use ferry_core::{FerryError, Result, ToolSession};

use crate::transport::{SseConfig, StdioConfig, TransportConfig};

/// Marker prefix used by the remote servers to report application-level
/// failures inside an otherwise-successful tool response.
const ERROR_MARKER: &str = "Error";

/// A connected, initialized session with one MCP server.
///
/// Owns the underlying rmcp service; one logical call at a time, matching
/// the coordinator's sequential pipeline.
pub struct McpSession {
    name: String,
    service: RunningService<RoleClient, FerryClientHandler>,
}

#[derive(Clone)]
struct FerryClientHandler;

impl ClientHandler for FerryClientHandler {
    fn get_info(&self) -> ClientInfo {
        InitializeRequestParams::new(
            ClientCapabilities::default(),
            Implementation::new("ferry", env!("CARGO_PKG_VERSION")),
        )
        .with_protocol_version(ProtocolVersion::V_2024_11_05)
    }
}

impl McpSession {
    /// Establish the transport and complete the MCP handshake.
    ///
    /// Transport establishment failures map to [`FerryError::Connection`],
    /// a failed handshake to [`FerryError::Handshake`]. Both are fatal at
    /// startup — the coordinator has no optional backends.
    pub async fn connect(name: impl Into<String>, transport: &TransportConfig) -> Result<Self> {
        let name = name.into();

        let service = match transport {
            TransportConfig::Stdio(stdio) => {
                let transport = spawn_stdio(&name, stdio)?;
                serve_client(FerryClientHandler, transport)
                    .await
                    .map_err(|e| FerryError::Handshake {
                        session: name.clone(),
                        reason: e.to_string(),
                    })?
            }
            TransportConfig::Sse(sse) => {
                let transport = SseClientTransport::start(sse.url.clone())
                    .await
                    .map_err(|e| FerryError::Connection {
                        session: name.clone(),
                        reason: e.to_string(),
                    })?;
                serve_client(FerryClientHandler, transport)
                    .await
                    .map_err(|e| FerryError::Handshake {
                        session: name.clone(),
                        reason: e.to_string(),
                    })?
            }
        };

        if let Some(peer_info) = service.peer().peer_info() {
            info!(
                session = name.as_str(),
                server = peer_info.server_info.name.as_str(),
                "session established"
            );
        }

        Ok(Self { name, service })
    }

    /// Cancel the underlying service. For stdio sessions this also tears
    /// down the child process.
    pub fn shutdown(&self) {
        self.service.cancellation_token().cancel();
    }
}

#[async_trait]
impl ToolSession for McpSession {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, tool: &str, args: Value) -> Result<String> {
        debug!(session = self.name.as_str(), tool, "invoking tool");

        let mut params = CallToolRequestParam::new(tool.to_owned());
        if let Some(arguments) = normalize_arguments(args) {
            params = params.with_arguments(arguments);
        }
        let result = self
            .service
            .call_tool(params)
            .await
            .map_err(|e| FerryError::Session {
                session: self.name.clone(),
                reason: e.to_string(),
            })?;

        let result = serde_json::to_value(&result)?;
        decode_result(tool, &result)
    }
}

/// Spawn the MCP server as a child process with piped stdio.
fn spawn_stdio(name: &str, config: &StdioConfig) -> Result<TokioChildProcess> {
    let mut command = Command::new(&config.command);
    command.args(&config.args).kill_on_drop(true);
    if let Some(dir) = &config.working_dir {
        command.current_dir(dir);
    }
    for (key, value) in &config.env {
        command.env(key, value);
    }

    let (transport, stderr) = TokioChildProcess::builder(command)
        .stderr(std::process::Stdio::piped())
        .spawn()
        .map_err(|e| FerryError::Connection {
            session: name.to_string(),
            reason: e.to_string(),
        })?;

    // Drain the server's stderr into our logs so its diagnostics survive.
    if let Some(stderr) = stderr {
        let session = name.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(session = session.as_str(), "server stderr: {line}");
            }
        });
    }

    Ok(transport)
}

/// Tool arguments must be a JSON object on the wire; wrap anything else.
fn normalize_arguments(args: Value) -> Option<Map<String, Value>> {
    match args {
        Value::Null => None,
        Value::Object(map) => Some(map),
        other => {
            let mut map = Map::new();
            map.insert("value".to_owned(), other);
            Some(map)
        }
    }
}

/// Decode a serialized `CallToolResult` into the session's outcome.
///
/// The transport contract does not distinguish application success from
/// failure — both arrive as a successful response whose body may carry an
/// error flag or an `Error ...` text payload. That distinction is made
/// here, once, so callers branch on a structured result instead of
/// substring-inspecting payloads.
fn decode_result(tool: &str, result: &Value) -> Result<String> {
    let is_error = result
        .get("isError")
        .or_else(|| result.get("is_error"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let text = result
        .get("content")
        .and_then(Value::as_array)
        .map(|content| {
            content
                .iter()
                .filter_map(|block| block.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    if is_error || text.trim_start().starts_with(ERROR_MARKER) {
        return Err(FerryError::Remote {
            tool: tool.to_owned(),
            message: if text.is_empty() {
                "unspecified tool error".to_owned()
            } else {
                text
            },
        });
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_text_payload() {
        let result = json!({
            "content": [{ "type": "text", "text": "sheet-123" }],
            "isError": false,
        });
        assert_eq!(decode_result("create_sheet", &result).unwrap(), "sheet-123");
    }

    #[test]
    fn test_decode_joins_multiple_text_blocks() {
        let result = json!({
            "content": [
                { "type": "text", "text": "line one" },
                { "type": "text", "text": "line two" },
            ],
        });
        assert_eq!(
            decode_result("get_next_message", &result).unwrap(),
            "line one\nline two"
        );
    }

    #[test]
    fn test_decode_error_flag() {
        let result = json!({
            "content": [{ "type": "text", "text": "boom" }],
            "isError": true,
        });
        let err = decode_result("append_to_sheet", &result).unwrap_err();
        assert!(matches!(err, FerryError::Remote { ref tool, .. } if tool == "append_to_sheet"));
    }

    #[test]
    fn test_decode_error_marker_in_payload() {
        // FastMCP-style servers report failures as successful responses
        // whose text starts with "Error".
        let result = json!({
            "content": [{ "type": "text", "text": "Error creating sheet: quota exceeded" }],
        });
        let err = decode_result("create_sheet", &result).unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn test_decode_empty_content() {
        let result = json!({ "content": [] });
        assert_eq!(decode_result("send_reply", &result).unwrap(), "");
    }

    #[test]
    fn test_normalize_arguments() {
        assert!(normalize_arguments(Value::Null).is_none());
        let map = normalize_arguments(json!({ "chat_id": 42 })).unwrap();
        assert_eq!(map["chat_id"], 42);
        let wrapped = normalize_arguments(json!("bare")).unwrap();
        assert_eq!(wrapped["value"], "bare");
    }
}
