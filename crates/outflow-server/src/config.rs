use anyhow::{Context, Result};
use outflow_browser::Pacing;
use std::path::PathBuf;

const DEFAULT_BIND: &str = "0.0.0.0:3000";
const DEFAULT_DB_PATH: &str = "outflow.db";
const DEFAULT_WORKERS: usize = 2;
const DEFAULT_ORIGINS: &str = "https://slack-outreach-buddy.lovable.app,http://localhost:3000";

/// Service configuration, read once at startup and injected into the
/// state. No global mutable configuration exists anywhere else.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub db_path: PathBuf,
    /// Base64-encoded 32-byte key for cookie encryption at rest.
    pub master_key_b64: String,
    pub worker_count: usize,
    pub allowed_origins: Vec<String>,
    pub pacing: Pacing,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        let master_key_b64 =
            std::env::var("OUTFLOW_MASTER_KEY").context("OUTFLOW_MASTER_KEY is not set")?;

        let bind_addr =
            std::env::var("OUTFLOW_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let db_path = std::env::var("OUTFLOW_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_PATH));

        let worker_count = std::env::var("OUTFLOW_WORKERS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_WORKERS);

        let origins_raw = std::env::var("OUTFLOW_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| DEFAULT_ORIGINS.to_string());

        let defaults = Pacing::default();
        let pacing = Pacing {
            profile_settle_ms: env_ms("OUTFLOW_PROFILE_SETTLE_MS", defaults.profile_settle_ms),
            composer_settle_ms: env_ms("OUTFLOW_COMPOSER_SETTLE_MS", defaults.composer_settle_ms),
            replies_settle_ms: env_ms("OUTFLOW_REPLIES_SETTLE_MS", defaults.replies_settle_ms),
        };

        Ok(Self {
            bind_addr,
            db_path,
            master_key_b64,
            worker_count,
            allowed_origins: parse_origins(&origins_raw),
            pacing,
        })
    }
}

fn env_ms(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
