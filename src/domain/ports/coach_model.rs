/// Coach model port
///
/// Abstraction over the language-model collaborator. The engine issues two
/// request shapes per turn at most: an extraction+decision request (expects a
/// structured JSON payload back) and a render request (expects plain message
/// text). Both return the raw completion; parsing and fail-soft handling are
/// the caller's job, because the model must be allowed to return free text
/// without crashing anything.
use anyhow::Result;
use async_trait::async_trait;

/// A single prompt for the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    /// System prompt establishing role and output contract.
    pub system: String,
    /// User-turn prompt with stage context, record snapshot, and history.
    pub prompt: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature (0.0-1.0).
    pub temperature: f32,
}

/// Language-model collaborator trait.
#[async_trait]
pub trait CoachModel: Send + Sync {
    /// Extraction+decision call. The completion is expected to be JSON but
    /// may be anything; errors and free text both resolve to the fail-soft
    /// path upstream.
    async fn extract(&self, request: ModelRequest) -> Result<String>;

    /// Render call. The completion is the coach message verbatim. On error
    /// the talker falls back to a canned stage message.
    async fn render(&self, request: ModelRequest) -> Result<String>;
}
