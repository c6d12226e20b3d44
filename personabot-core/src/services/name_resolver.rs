// File: personabot-core/src/services/name_resolver.rs

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::warn;

use personabot_common::models::{ChannelRef, NameKey, RawChatMessage};
use personabot_common::traits::ChatPlatform;

use crate::cache::{DISPLAY_NAME_TTL_MS, SWEEP_THRESHOLD, TtlStore};

/// Resolves a stable display name for a message author.
///
/// Preference order inside a community channel: per-community nickname,
/// then the author's global display name, then the bare handle. Direct
/// channels have no nickname tier. Results are cached for an hour under
/// a key that discriminates by community, since the same user can carry
/// different nicknames in different communities.
///
/// Resolution is infallible by contract: a failed membership lookup is
/// logged and degrades down the fallback chain, and the bare handle is
/// always available from the message itself.
pub struct DisplayNameResolver<P: ChatPlatform> {
    platform: Arc<P>,
    cache: Mutex<TtlStore<NameKey, String>>,
}

impl<P: ChatPlatform> DisplayNameResolver<P> {
    pub fn new(platform: Arc<P>) -> Self {
        Self::with_ttl(platform, DISPLAY_NAME_TTL_MS)
    }

    pub fn with_ttl(platform: Arc<P>, ttl_ms: i64) -> Self {
        Self {
            platform,
            cache: Mutex::new(TtlStore::new(ttl_ms, SWEEP_THRESHOLD)),
        }
    }

    pub async fn resolve(&self, msg: &RawChatMessage, channel: &ChannelRef) -> String {
        let key = NameKey::for_channel(channel, &msg.author_id);
        {
            let cache = self.cache.lock().await;
            if let Some(name) = cache.get(&key, Utc::now()) {
                return name.clone();
            }
        }

        let resolved = match channel.community_id() {
            Some(community_id) => self.resolve_in_community(msg, community_id).await,
            None => self.fallback_name(msg),
        };

        // Write-back happens whichever fallback tier produced the name,
        // so repeat lookups inside the TTL stay local.
        let mut cache = self.cache.lock().await;
        cache.put(key, resolved.clone(), Utc::now());
        resolved
    }

    async fn resolve_in_community(&self, msg: &RawChatMessage, community_id: &str) -> String {
        match self
            .platform
            .fetch_community_member(community_id, &msg.author_id)
            .await
        {
            Ok(Some(profile)) => profile
                .nickname
                .unwrap_or_else(|| self.fallback_name(msg)),
            Ok(None) => self.fallback_name(msg),
            Err(e) => {
                warn!(
                    "membership lookup failed for user {} in community {}: {e}",
                    msg.author_id, community_id
                );
                self.fallback_name(msg)
            }
        }
    }

    fn fallback_name(&self, msg: &RawChatMessage) -> String {
        msg.author_global_name
            .clone()
            .unwrap_or_else(|| msg.author_handle.clone())
    }
}
