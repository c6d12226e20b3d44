// File: personabot-core/src/services/chat_service.rs

use std::sync::Arc;

use tracing::{debug, error, info};

use personabot_common::error::Error;
use personabot_common::models::{ChatMessageEvent, PersonaConfig};
use personabot_common::traits::{ChatPlatform, InferenceApi};

use crate::cache::DEFAULT_FETCH_LIMIT;
use crate::services::context_service::ContextService;

const FETCH_APOLOGY: &str = "Sorry, I couldn't read the conversation just now.";
const INFERENCE_APOLOGY: &str = "Sorry, I couldn't come up with a reply.";

/// Reaction path for one bot instance: an addressed inbound message
/// triggers a (cached) conversation fetch, one inference call, and a
/// reply into the same channel.
pub struct ChatService<P: ChatPlatform, I: InferenceApi> {
    platform: Arc<P>,
    context: ContextService<P>,
    inference: Arc<I>,
    persona: PersonaConfig,
    fetch_limit: usize,
}

impl<P: ChatPlatform, I: InferenceApi> ChatService<P, I> {
    pub fn new(platform: Arc<P>, inference: Arc<I>, persona: PersonaConfig) -> Self {
        Self {
            context: ContextService::new(platform.clone()),
            platform,
            inference,
            persona,
            fetch_limit: DEFAULT_FETCH_LIMIT,
        }
    }

    pub fn with_fetch_limit(mut self, limit: usize) -> Self {
        self.fetch_limit = limit;
        self
    }

    /// Overrides the conversation cache's freshness window.
    pub fn with_cache_ttl(mut self, ttl_ms: i64) -> Self {
        self.context = ContextService::with_ttl(self.platform.clone(), ttl_ms);
        self
    }

    pub fn context(&self) -> &ContextService<P> {
        &self.context
    }

    /// Processes one inbound message event:
    ///  1. Ignores anything not addressed to this bot.
    ///  2. Assembles conversation context through the ephemeral cache.
    ///  3. Forwards the context to the inference service.
    ///  4. Relays the reply (or a short apology) into the channel.
    pub async fn handle_message_event(&self, event: &ChatMessageEvent) -> Result<(), Error> {
        if !event.addressed {
            debug!(
                "ignoring unaddressed message in channel {}",
                event.channel.channel_id
            );
            return Ok(());
        }

        info!(
            "persona '{}' triggered by {} in channel {}",
            self.persona.persona, event.author_handle, event.channel.channel_id
        );

        let conversation = match self
            .context
            .cached_conversation(&event.channel, self.fetch_limit)
            .await
        {
            Ok(c) => c,
            Err(e) => {
                error!(
                    "conversation fetch failed in channel {}: {e}",
                    event.channel.channel_id
                );
                let _ = self
                    .platform
                    .send_message(&event.channel.channel_id, FETCH_APOLOGY)
                    .await;
                return Err(e);
            }
        };

        match self
            .inference
            .generate_reply(
                &self.persona.persona,
                &conversation,
                self.persona.filter_enabled,
            )
            .await
        {
            Ok(reply) => {
                self.platform
                    .send_message(&event.channel.channel_id, &reply)
                    .await
            }
            Err(e) => {
                error!(
                    "inference call failed for persona '{}': {e}",
                    self.persona.persona
                );
                let _ = self
                    .platform
                    .send_message(&event.channel.channel_id, INFERENCE_APOLOGY)
                    .await;
                Err(e)
            }
        }
    }
}
