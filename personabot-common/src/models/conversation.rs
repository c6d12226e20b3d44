// File: personabot-common/src/models/conversation.rs

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Whether a channel lives inside a community (guild/server) or is a
/// one-to-one direct conversation. Communities carry per-user nickname
/// overrides; direct channels do not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelScope {
    Community { community_id: String },
    Direct,
}

/// A channel identifier plus its scope tag, so downstream code branches
/// on an explicit variant instead of inspecting platform types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    pub channel_id: String,
    pub scope: ChannelScope,
}

impl ChannelRef {
    pub fn community(channel_id: impl Into<String>, community_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            scope: ChannelScope::Community {
                community_id: community_id.into(),
            },
        }
    }

    pub fn direct(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            scope: ChannelScope::Direct,
        }
    }

    pub fn community_id(&self) -> Option<&str> {
        match &self.scope {
            ChannelScope::Community { community_id } => Some(community_id),
            ChannelScope::Direct => None,
        }
    }
}

/// One raw message as handed back by the messaging platform, before
/// display-name resolution. Carries enough author metadata that name
/// resolution can always fall back to the bare handle.
#[derive(Debug, Clone)]
pub struct RawChatMessage {
    pub author_id: String,
    pub author_handle: String,
    pub author_global_name: Option<String>,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Community membership record for one user, as far as the core cares.
#[derive(Debug, Clone, Default)]
pub struct CommunityProfile {
    pub nickname: Option<String>,
}

/// One normalized conversation turn, in the shape the inference service
/// consumes. `timestamp` serializes as an ISO-8601 instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationMessage {
    pub username: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// One inbound message event, normalized off the platform gateway.
#[derive(Debug, Clone)]
pub struct ChatMessageEvent {
    pub channel: ChannelRef,
    pub author_id: String,
    pub author_handle: String,
    pub text: String,
    /// True when the bot itself was mentioned.
    pub addressed: bool,
}

/// Display-name cache key. The same user may carry different nicknames
/// in different communities, so community-scoped resolutions must not
/// collide with each other or with the direct-message resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NameKey {
    Community {
        community_id: String,
        user_id: String,
    },
    Direct {
        user_id: String,
    },
}

impl NameKey {
    pub fn for_channel(channel: &ChannelRef, user_id: &str) -> Self {
        match channel.community_id() {
            Some(community_id) => NameKey::Community {
                community_id: community_id.to_string(),
                user_id: user_id.to_string(),
            },
            None => NameKey::Direct {
                user_id: user_id.to_string(),
            },
        }
    }
}
