// File: personabot-common/src/models/persona.rs

/// Configuration for one bot instance: which persona answers, with
/// which platform credentials, and whether the content filter is on.
#[derive(Debug, Clone)]
pub struct PersonaConfig {
    /// Identifier the inference service uses to select a behavior profile.
    pub persona: String,
    /// Platform bot token for this instance.
    pub token: String,
    pub filter_enabled: bool,
}
