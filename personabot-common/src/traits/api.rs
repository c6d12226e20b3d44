// File: personabot-common/src/traits/api.rs

use async_trait::async_trait;

use crate::error::Error;
use crate::models::ConversationMessage;

/// One-shot request/response seam to the remote inference service.
#[async_trait]
pub trait InferenceApi: Send + Sync {
    async fn generate_reply(
        &self,
        persona: &str,
        conversation: &[ConversationMessage],
        filter_enabled: bool,
    ) -> Result<String, Error>;
}
