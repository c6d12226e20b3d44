// File: personabot-ai/src/lib.rs

pub mod client;
pub mod models;

pub use client::HttpInferenceClient;
pub use models::{InferenceRequest, InferenceResponse};
