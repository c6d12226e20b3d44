// File: personabot-core/src/lib.rs

pub mod cache;
pub mod platforms;
pub mod services;

pub use personabot_common::error::Error;
