// File: personabot-core/src/platforms/mod.rs

pub mod discord;

pub use discord::DiscordPlatform;
