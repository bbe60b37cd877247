use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Duration;
use tracing::warn;

use yaca_api::GatewayAccess;

const DEV_JWT_SECRET: &str = "dev-secret-change-me";

/// Ten years.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 10;

/// Which storage backend to run on. Chosen once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Sqlite { path: PathBuf },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub jwt_secret: String,
    /// `None` disables token expiry
    pub token_ttl: Option<Duration>,
    pub storage: StorageBackend,
    pub reset_storage: bool,
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    pub gateway_access: GatewayAccess,
}

impl Config {
    /// Read `YACA_*` variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = var("YACA_HOST", "0.0.0.0");
        let port: u16 = var("YACA_PORT", "3000")
            .parse()
            .context("YACA_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        let jwt_secret = match lookup("YACA_JWT_SECRET") {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                warn!("YACA_JWT_SECRET is not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let token_ttl_hours: i64 = var("YACA_TOKEN_TTL_HOURS", "24")
            .parse()
            .context("YACA_TOKEN_TTL_HOURS must be a whole number of hours")?;
        if !(0..=MAX_TOKEN_TTL_HOURS).contains(&token_ttl_hours) {
            bail!(
                "YACA_TOKEN_TTL_HOURS must be between 0 and {}",
                MAX_TOKEN_TTL_HOURS
            );
        }
        let token_ttl = match token_ttl_hours {
            0 => None,
            hours => Some(
                Duration::try_hours(hours).context("YACA_TOKEN_TTL_HOURS is out of range")?,
            ),
        };

        let storage = match var("YACA_STORAGE", "sqlite").to_ascii_lowercase().as_str() {
            "memory" => StorageBackend::Memory,
            "sqlite" => StorageBackend::Sqlite {
                path: PathBuf::from(var("YACA_DB_PATH", "yaca.db")),
            },
            other => bail!("unknown YACA_STORAGE '{}', expected 'memory' or 'sqlite'", other),
        };

        let reset_storage = parse_bool(&var("YACA_RESET_STORAGE", "false"))
            .context("YACA_RESET_STORAGE must be true or false")?;

        let argon2_memory_kib = var("YACA_ARGON2_MEMORY_KIB", "19456")
            .parse()
            .context("YACA_ARGON2_MEMORY_KIB must be a number")?;
        let argon2_iterations = var("YACA_ARGON2_ITERATIONS", "2")
            .parse()
            .context("YACA_ARGON2_ITERATIONS must be a number")?;

        let gateway_access = match var("YACA_GATEWAY_AUTH", "token").to_ascii_lowercase().as_str() {
            "open" => GatewayAccess::Open,
            "token" => GatewayAccess::Authenticated,
            other => bail!("unknown YACA_GATEWAY_AUTH '{}', expected 'open' or 'token'", other),
        };

        Ok(Self {
            addr,
            jwt_secret,
            token_ttl,
            storage,
            reset_storage,
            argon2_memory_kib,
            argon2_iterations,
            gateway_access,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
