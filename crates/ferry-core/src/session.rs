use async_trait::async_trait;
use serde_json::Value;

/// A long-lived handle to one remote backend supporting a request/response
/// "invoke named tool" operation.
///
/// Implemented by the MCP sessions in `ferry-mcp` and by scripted fakes in
/// tests. One logical call is in flight at a time per session; the
/// coordinator's pipeline is strictly sequential.
#[async_trait]
pub trait ToolSession: Send + Sync {
    /// Identifier used in logs and errors (e.g. "chat", "docs").
    fn name(&self) -> &str;

    /// Invoke a named tool and await its textual payload.
    ///
    /// Application-level failures reported inside an otherwise-successful
    /// response are decoded at the session boundary into
    /// [`FerryError::Remote`](crate::FerryError::Remote); transport-level
    /// failures surface as [`FerryError::Session`](crate::FerryError::Session).
    /// No retries happen here — retry policy belongs to the caller.
    async fn invoke(&self, tool: &str, args: Value) -> crate::Result<String>;
}
