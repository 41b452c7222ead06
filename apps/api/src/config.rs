use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::pagination::page_setup::{
    PageSetup, DEFAULT_SAFETY_MARGIN_PX, DEFAULT_SECTION_SPACING_PX,
};

const DEFAULT_PREVIEW_IDLE_SECS: u64 = 30 * 60;

/// Application configuration loaded from environment variables.
/// Every variable is optional; a value that is present but malformed fails startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Page setup used when a request does not specify paper, margin or font.
    pub page_defaults: PageSetup,
    /// Preview sessions untouched for this long are evicted.
    pub preview_idle_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = PageSetup::default();
        let page_defaults = PageSetup {
            paper: env_or("DEFAULT_PAPER_SIZE", defaults.paper)?,
            margin: env_or("DEFAULT_MARGIN", defaults.margin)?,
            font: env_or("DEFAULT_FONT", defaults.font)?,
            safety_margin_px: env_or("LAYOUT_SAFETY_MARGIN_PX", DEFAULT_SAFETY_MARGIN_PX)?,
            section_spacing_px: env_or("SECTION_SPACING_PX", DEFAULT_SECTION_SPACING_PX)?,
        };
        if page_defaults.safety_margin_px < 0.0 || page_defaults.section_spacing_px < 0.0 {
            return Err(anyhow!(
                "LAYOUT_SAFETY_MARGIN_PX and SECTION_SPACING_PX must not be negative"
            ));
        }

        let idle_secs: u64 = env_or("PREVIEW_IDLE_TIMEOUT_SECS", DEFAULT_PREVIEW_IDLE_SECS)?;
        if idle_secs == 0 {
            return Err(anyhow!("PREVIEW_IDLE_TIMEOUT_SECS must be at least 1"));
        }

        Ok(Config {
            port: env_or("PORT", 8080u16).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            page_defaults,
            preview_idle_timeout: Duration::from_secs(idle_secs),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            page_defaults: PageSetup::default(),
            preview_idle_timeout: Duration::from_secs(DEFAULT_PREVIEW_IDLE_SECS),
        }
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'"))
}
