// File: personabot-ai/src/models.rs

use serde::{Deserialize, Serialize};

use personabot_common::models::ConversationMessage;

/// Request body for the inference endpoint. Field names follow the
/// service's wire format.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceRequest<'a> {
    pub persona_identifier: &'a str,
    pub conversation: &'a [ConversationMessage],
    pub filter_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceResponse {
    pub success: bool,
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
