use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use ferry_config::FerryConfig;
use ferry_core::{ChatMessage, NO_MESSAGES, PipelineReport, Result, ToolSession};
use ferry_llm::TextGenerator;

// Tool names of the chat collaborator.
const GET_NEXT_MESSAGE: &str = "get_next_message";
const SEND_REPLY: &str = "send_reply";

// Tool names of the docs collaborator.
const CREATE_SHEET: &str = "create_sheet";
const APPEND_TO_SHEET: &str = "append_to_sheet";
const SEND_EMAIL: &str = "send_email_with_attachment";

/// What one loop iteration did.
#[derive(Debug)]
pub enum Outcome {
    /// The chat queue was empty.
    Idle,
    /// A message went through the pipeline and the reply stage was reached.
    Processed(PipelineReport),
    /// The inbound payload failed to decode and was dropped.
    Discarded,
    /// The pipeline aborted before reaching the reply stage.
    Aborted,
}

/// The orchestration loop.
///
/// Owns both sessions, the text generator, and the lazily-created
/// spreadsheet handle. Everything is driven from a single task — the
/// shared handle needs no locking because no other context ever writes it.
pub struct Coordinator {
    chat: Arc<dyn ToolSession>,
    docs: Arc<dyn ToolSession>,
    llm: Arc<dyn TextGenerator>,
    config: FerryConfig,
    /// Single-writer cell: filled once, either from config/persisted state
    /// at startup or by the first successful `create_sheet`.
    spreadsheet_id: Option<String>,
}

impl Coordinator {
    pub fn new(
        chat: Arc<dyn ToolSession>,
        docs: Arc<dyn ToolSession>,
        llm: Arc<dyn TextGenerator>,
        config: FerryConfig,
    ) -> Self {
        let spreadsheet_id = config.sheets.initial_id();
        if let Some(id) = &spreadsheet_id {
            info!(spreadsheet_id = id.as_str(), "using existing spreadsheet");
        }
        Self {
            chat,
            docs,
            llm,
            config,
            spreadsheet_id,
        }
    }

    /// Run until the token is cancelled.
    ///
    /// No fault propagates past an iteration: transport errors and anything
    /// else unexpected are logged and followed by an extended backoff so a
    /// persistently failing dependency never turns into a tight crash-loop.
    pub async fn run(&mut self, cancel: CancellationToken) {
        info!(
            generator = self.llm.name(),
            "coordinator running, polling for messages"
        );

        loop {
            let outcome = tokio::select! {
                _ = cancel.cancelled() => break,
                outcome = self.iteration() => outcome,
            };

            match outcome {
                Ok(Outcome::Idle) => {
                    if !self.wait(self.config.runtime.poll_interval(), &cancel).await {
                        break;
                    }
                }
                Ok(outcome) => {
                    debug!(?outcome, "iteration complete");
                }
                Err(e) => {
                    error!(error = %e, "iteration failed, backing off");
                    if !self.wait(self.config.runtime.fault_backoff(), &cancel).await {
                        break;
                    }
                }
            }
        }

        info!("coordinator stopped");
    }

    /// One poll-and-process pass.
    async fn iteration(&mut self) -> Result<Outcome> {
        let payload = self
            .chat
            .invoke(GET_NEXT_MESSAGE, serde_json::json!({}))
            .await?;

        if payload == NO_MESSAGES {
            return Ok(Outcome::Idle);
        }

        let message = match ChatMessage::decode(&payload) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, payload = payload.as_str(), "discarding undecodable message");
                return Ok(Outcome::Discarded);
            }
        };

        info!(
            chat_id = message.chat_id,
            user = message.user.as_str(),
            "processing message"
        );

        match self.process_message(&message).await {
            Ok(report) => Ok(Outcome::Processed(report)),
            Err(e) => {
                error!(error = %e, chat_id = message.chat_id, "pipeline aborted");
                Ok(Outcome::Aborted)
            }
        }
    }

    /// Drive one message through the fixed pipeline.
    ///
    /// Only the spreadsheet-resolution stage may abort the pass (`Err`);
    /// generation, append, notify, and reply failures are absorbed so the
    /// user still gets an acknowledgment whenever the message decoded.
    async fn process_message(&mut self, message: &ChatMessage) -> Result<PipelineReport> {
        let llm_response = match self.llm.generate(&message.text).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "text generation failed, replying with the error");
                format!("Error processing request: {e}")
            }
        };

        let spreadsheet_id = self.resolve_spreadsheet(&message.user).await?;

        let sheet_status = match self
            .docs
            .invoke(
                APPEND_TO_SHEET,
                serde_json::json!({
                    "spreadsheet_id": spreadsheet_id,
                    "values": [message.user, message.text, llm_response],
                }),
            )
            .await
        {
            Ok(status) => {
                debug!(status = status.as_str(), "appended interaction row");
                Some(status)
            }
            Err(e) => {
                warn!(error = %e, "failed to append interaction row");
                None
            }
        };

        let email_status = match &self.config.notify.email {
            Some(to_email) => {
                let sheet_url = format!("https://docs.google.com/spreadsheets/d/{spreadsheet_id}");
                let result = self
                    .docs
                    .invoke(
                        SEND_EMAIL,
                        serde_json::json!({
                            "to_email": to_email,
                            "subject": format!("New Agent Task from {}", message.user),
                            "body": format!(
                                "User Query: {}\n\nAgent Response: {}\n\nView in Google Sheets: {}",
                                message.text, llm_response, sheet_url,
                            ),
                        }),
                    )
                    .await;
                match result {
                    Ok(status) => {
                        debug!(status = status.as_str(), "notification sent");
                        Some(status)
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to send notification");
                        None
                    }
                }
            }
            None => None,
        };

        let reply = format!("Processed your request: {llm_response}");
        if let Err(e) = self
            .chat
            .invoke(
                SEND_REPLY,
                serde_json::json!({ "chat_id": message.chat_id, "text": reply }),
            )
            .await
        {
            warn!(error = %e, chat_id = message.chat_id, "failed to deliver reply");
        }

        Ok(PipelineReport {
            llm_response,
            sheet_status,
            email_status,
        })
    }

    /// Return the process-wide spreadsheet id, creating the sheet on first
    /// use when none was configured.
    async fn resolve_spreadsheet(&mut self, user: &str) -> Result<String> {
        if let Some(id) = &self.spreadsheet_id {
            return Ok(id.clone());
        }

        info!("no spreadsheet configured, creating a new one");
        let id = self
            .docs
            .invoke(
                CREATE_SHEET,
                serde_json::json!({ "title": format!("Agent Tasks - {user}") }),
            )
            .await?;
        info!(spreadsheet_id = id.as_str(), "created spreadsheet");

        if let Some(path) = &self.config.sheets.id_file {
            if let Err(e) = std::fs::write(path, &id) {
                warn!(error = %e, path = %path.display(), "failed to persist spreadsheet id");
            }
        }

        self.spreadsheet_id = Some(id.clone());
        Ok(id)
    }

    /// Sleep, but wake immediately on cancellation. Returns false when the
    /// loop should stop.
    async fn wait(&self, duration: Duration, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}
