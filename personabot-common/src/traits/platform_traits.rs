// File: personabot-common/src/traits/platform_traits.rs

use async_trait::async_trait;

use crate::error::Error;
use crate::models::{ChannelRef, CommunityProfile, RawChatMessage};

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error(String),
}

/// The messaging-platform seam the core talks through. Connection
/// lifecycle, auth, and event subscription live on the concrete
/// platform type; the core only reads history, reads membership, and
/// writes replies.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Up to `limit` most recent messages in the channel, in whatever
    /// order the platform hands them back.
    async fn fetch_recent_messages(
        &self,
        channel: &ChannelRef,
        limit: usize,
    ) -> Result<Vec<RawChatMessage>, Error>;

    /// Community membership record for one user, or `None` if the user
    /// is not (or no longer) a member.
    async fn fetch_community_member(
        &self,
        community_id: &str,
        user_id: &str,
    ) -> Result<Option<CommunityProfile>, Error>;

    async fn send_message(&self, channel_id: &str, text: &str) -> Result<(), Error>;
}
