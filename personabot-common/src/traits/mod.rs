// File: personabot-common/src/traits/mod.rs
pub mod api;
pub mod platform_traits;

pub use api::InferenceApi;
pub use platform_traits::{ChatPlatform, ConnectionStatus};
