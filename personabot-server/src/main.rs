// File: personabot-server/src/main.rs

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use personabot_ai::HttpInferenceClient;
use personabot_core::Error;
use personabot_core::platforms::DiscordPlatform;
use personabot_core::services::ChatService;

mod config;
use config::AppConfig;

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("personabot=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub).expect("Failed to set global subscriber");
}

struct BotHandle {
    persona: String,
    platform: Arc<DiscordPlatform>,
    task: JoinHandle<()>,
}

async fn start_bot(
    persona_cfg: personabot_common::models::PersonaConfig,
    inference: Arc<HttpInferenceClient>,
    fetch_limit: Option<usize>,
    cache_ttl_ms: Option<i64>,
) -> Result<BotHandle, Error> {
    let persona = persona_cfg.persona.clone();

    let platform = Arc::new(DiscordPlatform::new(persona_cfg.token.clone()));
    platform.connect().await?;
    info!("persona '{persona}' connected");

    let mut service = ChatService::new(platform.clone(), inference, persona_cfg);
    if let Some(limit) = fetch_limit {
        service = service.with_fetch_limit(limit);
    }
    if let Some(ttl_ms) = cache_ttl_ms {
        service = service.with_cache_ttl(ttl_ms);
    }

    let loop_platform = platform.clone();
    let loop_persona = persona.clone();
    let task = tokio::spawn(async move {
        while let Some(event) = loop_platform.next_message_event().await {
            if let Err(e) = service.handle_message_event(&event).await {
                error!("persona '{loop_persona}': event handling failed: {e}");
            }
        }
        info!("persona '{loop_persona}': event loop ended");
    });

    Ok(BotHandle {
        persona,
        platform,
        task,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    info!(
        "personabot starting: {} bot(s), inference at {}",
        config.bots.len(),
        config.inference_url
    );

    let inference = Arc::new(HttpInferenceClient::new(config.inference_url.clone()));

    let mut handles = Vec::new();
    for persona_cfg in config.bots.clone() {
        let handle = start_bot(
            persona_cfg,
            inference.clone(),
            config.fetch_limit,
            config.cache_ttl_ms,
        )
        .await?;
        handles.push(handle);
    }

    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received; shutting down");

    for handle in handles {
        if let Err(e) = handle.platform.disconnect().await {
            error!("persona '{}': disconnect failed: {e}", handle.persona);
        }
        // The event loop drains to None once the shards close.
        let _ = handle.task.await;
        info!("persona '{}' stopped", handle.persona);
    }

    Ok(())
}
