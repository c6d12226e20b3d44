// File: personabot-core/src/services/mod.rs

pub mod chat_service;
pub mod context_service;
pub mod name_resolver;

pub use chat_service::ChatService;
pub use context_service::ContextService;
pub use name_resolver::DisplayNameResolver;
