// File: personabot-ai/src/client.rs

use async_trait::async_trait;
use tracing::debug;

use personabot_common::error::Error;
use personabot_common::models::ConversationMessage;
use personabot_common::traits::InferenceApi;

use crate::models::{InferenceRequest, InferenceResponse};

/// One-shot request/response client for the remote inference service.
/// No retry and no timeout beyond what reqwest enforces; retry policy
/// belongs to the caller.
pub struct HttpInferenceClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpInferenceClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl InferenceApi for HttpInferenceClient {
    async fn generate_reply(
        &self,
        persona: &str,
        conversation: &[ConversationMessage],
        filter_enabled: bool,
    ) -> Result<String, Error> {
        debug!(
            "inference request: persona='{persona}', {} turns",
            conversation.len()
        );

        let body = InferenceRequest {
            persona_identifier: persona,
            conversation,
            filter_enabled,
        };

        let response: InferenceResponse = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !response.success {
            return Err(Error::Inference(
                response
                    .error
                    .unwrap_or_else(|| "inference service reported failure".to_string()),
            ));
        }
        response
            .reply
            .ok_or_else(|| Error::Inference("inference service returned no reply".to_string()))
    }
}
