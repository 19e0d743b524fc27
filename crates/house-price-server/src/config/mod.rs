//! Configuration loading and resolution.

use std::path::PathBuf;
use std::time::Duration;

use house_price::DEFAULT_MODEL_FILENAME;

use crate::types::{ServerError, ServerResult};

pub const DEFAULT_ADDR: &str = "127.0.0.1:5000";
pub const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 60;
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

pub const ENV_MODEL: &str = "HOUSE_PRICE_MODEL";
pub const ENV_ADDR: &str = "HOUSE_PRICE_ADDR";
pub const ENV_SESSION_TTL: &str = "HOUSE_PRICE_SESSION_TTL_SECS";
pub const ENV_MAX_SESSIONS: &str = "HOUSE_PRICE_MAX_SESSIONS";

/// Resolve the model artifact path.
///
/// Order: explicit flag, `HOUSE_PRICE_MODEL`, `./houseprice_pred.onnx`,
/// then `~/.house-price/houseprice_pred.onnx`.
pub fn resolve_model_path(explicit: Option<&str>) -> PathBuf {
    if let Some(path) = explicit {
        return PathBuf::from(path);
    }

    if let Ok(env_path) = std::env::var(ENV_MODEL) {
        return PathBuf::from(env_path);
    }

    let cwd_model = PathBuf::from(DEFAULT_MODEL_FILENAME);
    if cwd_model.exists() {
        return cwd_model;
    }

    resolve_default_model_path()
}

fn resolve_default_model_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());

    PathBuf::from(home)
        .join(".house-price")
        .join(DEFAULT_MODEL_FILENAME)
}

/// Everything `serve` needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
    pub model_path: PathBuf,
    pub session_ttl: Duration,
    pub max_sessions: usize,
}

/// Command-line values; `None` means "not given".
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub addr: Option<String>,
    pub model: Option<String>,
    pub session_ttl_secs: Option<u64>,
    pub max_sessions: Option<usize>,
}

impl ServerConfig {
    /// Resolve the config: flags, then environment, then defaults.
    pub fn resolve(overrides: ConfigOverrides) -> ServerResult<Self> {
        let addr = overrides
            .addr
            .or_else(|| std::env::var(ENV_ADDR).ok())
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());

        let session_ttl_secs = match overrides.session_ttl_secs {
            Some(secs) => secs,
            None => env_number(ENV_SESSION_TTL)?.unwrap_or(DEFAULT_SESSION_TTL_SECS),
        };
        if session_ttl_secs == 0 {
            return Err(ServerError::Config(
                "session TTL must be at least one second".to_string(),
            ));
        }

        let max_sessions = match overrides.max_sessions {
            Some(n) => n,
            None => env_number(ENV_MAX_SESSIONS)?.unwrap_or(DEFAULT_MAX_SESSIONS),
        };
        if max_sessions == 0 {
            return Err(ServerError::Config(
                "max sessions must be at least one".to_string(),
            ));
        }

        Ok(Self {
            addr,
            model_path: resolve_model_path(overrides.model.as_deref()),
            session_ttl: Duration::from_secs(session_ttl_secs),
            max_sessions,
        })
    }
}

fn env_number<T: std::str::FromStr>(name: &str) -> ServerResult<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ServerError::Config(format!("{name} must be a number, got {raw:?}"))),
        Err(_) => Ok(None),
    }
}
