use async_trait::async_trait;
use ferry_core::Result;

/// Trait implemented by each text-generation backend (Gemini, mock, ...).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Human-readable name, e.g. "gemini".
    fn name(&self) -> &str;

    /// Generate a completion for the given prompt.
    ///
    /// Fails with [`FerryError::Generation`](ferry_core::FerryError::Generation);
    /// the caller decides whether that aborts anything (the pipeline
    /// substitutes the error description and carries on).
    async fn generate(&self, prompt: &str) -> Result<String>;
}
