// File: personabot-common/src/models/mod.rs
pub mod conversation;
pub mod persona;

pub use conversation::{
    ChannelRef, ChannelScope, ChatMessageEvent, CommunityProfile, ConversationMessage, NameKey,
    RawChatMessage,
};
pub use persona::PersonaConfig;
