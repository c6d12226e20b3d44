// File: personabot-server/src/config.rs

use std::env;

use personabot_common::error::Error;
use personabot_common::models::PersonaConfig;

/// Process configuration, sourced from the environment (after dotenv).
///
/// Required:
///   PERSONABOT_INFERENCE_URL
///   PERSONABOT_BOT_COUNT
///   PERSONABOT_BOT_<n>_TOKEN / PERSONABOT_BOT_<n>_PERSONA  (n = 1..count)
/// Optional per bot:
///   PERSONABOT_BOT_<n>_FILTER  ("true"/"false", default true)
/// Optional global:
///   PERSONABOT_FETCH_LIMIT    (default 30)
///   PERSONABOT_CACHE_TTL_MS   (default 5000)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub inference_url: String,
    pub bots: Vec<PersonaConfig>,
    pub fetch_limit: Option<usize>,
    pub cache_ttl_ms: Option<i64>,
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, Error> {
    raw.parse()
        .map_err(|_| Error::Config(format!("could not parse env var {name}='{raw}'")))
}

impl AppConfig {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any name -> value lookup. `from_env` is
    /// the production path; tests supply a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| -> Result<String, Error> {
            lookup(name).ok_or_else(|| Error::Config(format!("missing required env var {name}")))
        };
        let optional = |name: &str| -> Result<Option<i64>, Error> {
            match lookup(name) {
                Some(raw) => Ok(Some(parse_var(name, &raw)?)),
                None => Ok(None),
            }
        };

        let inference_url = required("PERSONABOT_INFERENCE_URL")?;

        let count_raw = required("PERSONABOT_BOT_COUNT")?;
        let count: usize = parse_var("PERSONABOT_BOT_COUNT", &count_raw)?;
        if count == 0 {
            return Err(Error::Config("PERSONABOT_BOT_COUNT must be at least 1".into()));
        }

        let mut bots = Vec::with_capacity(count);
        for n in 1..=count {
            let token = required(&format!("PERSONABOT_BOT_{n}_TOKEN"))?;
            let persona = required(&format!("PERSONABOT_BOT_{n}_PERSONA"))?;
            let filter_name = format!("PERSONABOT_BOT_{n}_FILTER");
            let filter_enabled = match lookup(&filter_name) {
                Some(raw) => parse_var(&filter_name, &raw)?,
                None => true,
            };
            bots.push(PersonaConfig {
                persona,
                token,
                filter_enabled,
            });
        }

        let fetch_limit = match lookup("PERSONABOT_FETCH_LIMIT") {
            Some(raw) => Some(parse_var::<usize>("PERSONABOT_FETCH_LIMIT", &raw)?),
            None => None,
        };
        let cache_ttl_ms = optional("PERSONABOT_CACHE_TTL_MS")?;

        Ok(Self {
            inference_url,
            bots,
            fetch_limit,
            cache_ttl_ms,
        })
    }
}
