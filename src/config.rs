use std::net::IpAddr;
use std::path::PathBuf;

use ipnet::IpNet;

use crate::models::tracking::DEFAULT_TRACKING_KEYS;
use crate::relay::RelayMode;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string; without one, submissions are kept in memory.
    pub database_url: Option<String>,
    pub host: IpAddr,
    pub port: u16,
    pub max_body_size: usize,
    pub trusted_proxies: Vec<IpNet>,
    pub log_level: String,
    pub upload_dir: PathBuf,
    pub static_dir: PathBuf,
    pub relay: RelayConfig,
    pub tracking_keys: Vec<String>,
    pub rate_limit: u32,
    pub rate_limit_window_secs: u64,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// The partner form's submit URL.
    pub target_url: String,
    /// Where applicants are sent after intake.
    pub thank_you_url: String,
    pub mode: RelayMode,
    pub timeout_secs: u64,
    pub disclosure_sections: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let host: IpAddr = env_or("FORMRELAY_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid FORMRELAY_HOST: {e}"))?;

        let port: u16 = env_or("FORMRELAY_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid FORMRELAY_PORT: {e}"))?;

        // Résumé uploads ride in the same body as the form fields.
        let max_body_size: usize = env_or("FORMRELAY_MAX_BODY_SIZE", "10485760")
            .parse()
            .map_err(|e| format!("Invalid FORMRELAY_MAX_BODY_SIZE: {e}"))?;

        let trusted_proxies: Vec<IpNet> = env_or("FORMRELAY_TRUSTED_PROXIES", "")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| format!("Invalid FORMRELAY_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let log_level = env_or("FORMRELAY_LOG_LEVEL", "info");
        let upload_dir = PathBuf::from(env_or("FORMRELAY_UPLOAD_DIR", "uploads"));
        let static_dir = PathBuf::from(env_or("FORMRELAY_STATIC_DIR", "static"));

        let target_url = env_or("FORMRELAY_TARGET_URL", "https://main-web-1.onrender.com/apply");
        let thank_you_url =
            env_or("FORMRELAY_THANK_YOU_URL", "https://main-web-1.onrender.com/success");

        let mode_raw = env_or("FORMRELAY_RELAY_MODE", "humanized");
        let mode = RelayMode::parse(&mode_raw)
            .ok_or_else(|| format!("Invalid FORMRELAY_RELAY_MODE: {mode_raw}"))?;

        let timeout_secs: u64 = env_or("FORMRELAY_RELAY_TIMEOUT_SECS", "30")
            .parse()
            .map_err(|e| format!("Invalid FORMRELAY_RELAY_TIMEOUT_SECS: {e}"))?;

        let disclosure_sections: usize = env_or("FORMRELAY_DISCLOSURE_SECTIONS", "1")
            .parse()
            .map_err(|e| format!("Invalid FORMRELAY_DISCLOSURE_SECTIONS: {e}"))?;

        let tracking_keys = match std::env::var("FORMRELAY_TRACKING_KEYS") {
            Ok(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => default_tracking_keys(),
        };

        let rate_limit: u32 = env_or("FORMRELAY_RATE_LIMIT", "10")
            .parse()
            .map_err(|e| format!("Invalid FORMRELAY_RATE_LIMIT: {e}"))?;

        let rate_limit_window_secs: u64 = env_or("FORMRELAY_RATE_LIMIT_WINDOW_SECS", "60")
            .parse()
            .map_err(|e| format!("Invalid FORMRELAY_RATE_LIMIT_WINDOW_SECS: {e}"))?;

        Ok(Config {
            database_url,
            host,
            port,
            max_body_size,
            trusted_proxies,
            log_level,
            upload_dir,
            static_dir,
            relay: RelayConfig {
                target_url,
                thank_you_url,
                mode,
                timeout_secs,
                disclosure_sections,
            },
            tracking_keys,
            rate_limit,
            rate_limit_window_secs,
        })
    }
}

pub fn default_tracking_keys() -> Vec<String> {
    DEFAULT_TRACKING_KEYS.iter().map(|k| k.to_string()).collect()
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
