// File: personabot-core/src/cache/mod.rs

pub mod store;

pub use store::TtlStore;

/// Freshness window for resolved display names.
pub const DISPLAY_NAME_TTL_MS: i64 = 3_600_000;

/// Freshness window for a cached channel conversation.
pub const CONVERSATION_TTL_MS: i64 = 5_000;

/// Entry count past which an insert triggers the opportunistic sweep.
pub const SWEEP_THRESHOLD: usize = 1000;

/// Default number of recent messages pulled per conversation fetch.
pub const DEFAULT_FETCH_LIMIT: usize = 30;
