// File: personabot-core/src/services/context_service.rs

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use personabot_common::error::Error;
use personabot_common::models::{ChannelRef, ConversationMessage};
use personabot_common::traits::ChatPlatform;

use crate::cache::{CONVERSATION_TTL_MS, SWEEP_THRESHOLD, TtlStore};
use crate::services::name_resolver::DisplayNameResolver;

/// Assembles recent channel history into normalized conversation
/// context, with a short-TTL memo per channel so a burst of triggers in
/// the same channel collapses into one upstream fetch.
pub struct ContextService<P: ChatPlatform> {
    platform: Arc<P>,
    resolver: DisplayNameResolver<P>,
    conversations: Mutex<TtlStore<String, Vec<ConversationMessage>>>,
    /// Per-channel miss gate. Concurrent misses on one channel wait on
    /// the same lock and re-check the cache, so only the first issues
    /// the upstream fetch. Distinct channels never contend.
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl<P: ChatPlatform> ContextService<P> {
    pub fn new(platform: Arc<P>) -> Self {
        Self::with_ttl(platform, CONVERSATION_TTL_MS)
    }

    pub fn with_ttl(platform: Arc<P>, ttl_ms: i64) -> Self {
        Self {
            resolver: DisplayNameResolver::new(platform.clone()),
            platform,
            conversations: Mutex::new(TtlStore::new(ttl_ms, SWEEP_THRESHOLD)),
            in_flight: DashMap::new(),
        }
    }

    /// Uncached fetch: pulls up to `limit` recent messages, orders them
    /// oldest-first, and resolves display names once per distinct
    /// author. Any upstream history failure aborts with `Error::Fetch`
    /// and no partial result.
    pub async fn fetch_conversation(
        &self,
        channel: &ChannelRef,
        limit: usize,
    ) -> Result<Vec<ConversationMessage>, Error> {
        let mut raw = self
            .platform
            .fetch_recent_messages(channel, limit)
            .await
            .map_err(|e| {
                Error::Fetch(format!(
                    "history read failed for channel {}: {e}",
                    channel.channel_id
                ))
            })?;

        // The platform does not guarantee order. Stable sort keeps the
        // fetch's insertion order for equal timestamps.
        raw.sort_by_key(|m| m.timestamp);

        // Resolve each distinct author once; a membership lookup can be
        // a network round-trip, so this bounds lookups by the number of
        // distinct speakers rather than the number of messages.
        let mut names: HashMap<String, String> = HashMap::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for msg in raw.iter().filter(|m| seen.insert(m.author_id.as_str())) {
            let name = self.resolver.resolve(msg, channel).await;
            names.insert(msg.author_id.clone(), name);
        }

        let conversation = raw
            .iter()
            .map(|m| ConversationMessage {
                username: names
                    .get(&m.author_id)
                    .cloned()
                    .unwrap_or_else(|| m.author_handle.clone()),
                text: m.text.clone(),
                timestamp: m.timestamp,
            })
            .collect();

        Ok(conversation)
    }

    /// Memoized fetch keyed by channel. A fresh entry is returned
    /// verbatim; on miss or staleness the result of one upstream fetch
    /// is stored wholesale. A failed fetch is never cached, so the
    /// next call retries unconditionally.
    pub async fn cached_conversation(
        &self,
        channel: &ChannelRef,
        limit: usize,
    ) -> Result<Vec<ConversationMessage>, Error> {
        let key = channel.channel_id.clone();
        {
            let cache = self.conversations.lock().await;
            if let Some(messages) = cache.get(&key, Utc::now()) {
                debug!("conversation cache hit for channel {key}");
                return Ok(messages.clone());
            }
        }

        let gate = self
            .in_flight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = gate.lock().await;

        // A racing miss may have filled the cache while we waited.
        {
            let cache = self.conversations.lock().await;
            if let Some(messages) = cache.get(&key, Utc::now()) {
                debug!("conversation cache filled while waiting for channel {key}");
                return Ok(messages.clone());
            }
        }

        let result = self.fetch_conversation(channel, limit).await;
        if let Ok(messages) = &result {
            let mut cache = self.conversations.lock().await;
            cache.put(key.clone(), messages.clone(), Utc::now());
        }

        drop(guard);
        drop(gate);
        // Idle gates would otherwise accumulate one per channel ever seen.
        self.in_flight
            .remove_if(&key, |_, gate| Arc::strong_count(gate) == 1);

        result
    }
}
