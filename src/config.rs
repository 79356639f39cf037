use anyhow::{Context, Result, bail};
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://dhlottery.co.kr/common.do";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Ko,
}

impl FromStr for Locale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "ko" => Ok(Locale::Ko),
            other => bail!("unknown locale '{}' (expected en or ko)", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff: Duration,
    pub request_delay: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 5,
            backoff: Duration::from_secs(1),
            request_delay: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub api: ApiConfig,
    pub locale: Locale,
    /// Local hour on Saturday at which the weekly update runs.
    pub draw_hour: u32,
}

pub fn load() -> Result<Config> {
    load_from(|key| env::var(key).ok())
}

pub fn load_from<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = ApiConfig::default();

    let database_url = lookup("LOTTO_DB_PATH").unwrap_or_else(|| "data/lotto.db".to_string());
    let base_url = lookup("LOTTO_API_URL").unwrap_or(defaults.base_url);

    let timeout_secs = parse_var(&lookup, "LOTTO_TIMEOUT_SECS", defaults.timeout.as_secs())?;
    let max_retries = parse_var(&lookup, "LOTTO_MAX_RETRIES", defaults.max_retries)?;
    let backoff_ms = parse_var(
        &lookup,
        "LOTTO_BACKOFF_MS",
        defaults.backoff.as_millis() as u64,
    )?;
    let delay_ms = parse_var(
        &lookup,
        "LOTTO_REQUEST_DELAY_MS",
        defaults.request_delay.as_millis() as u64,
    )?;
    let locale = parse_var(&lookup, "LOTTO_LOCALE", Locale::default())?;
    let draw_hour = parse_var(&lookup, "LOTTO_DRAW_HOUR", 22u32)?;
    if draw_hour > 23 {
        bail!("LOTTO_DRAW_HOUR must be between 0 and 23, got {}", draw_hour);
    }

    Ok(Config {
        database_url,
        api: ApiConfig {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            max_retries,
            backoff: Duration::from_millis(backoff_ms),
            request_delay: Duration::from_millis(delay_ms),
        },
        locale,
        draw_hour,
    })
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("invalid value for {}: '{}'", key, raw)),
        None => Ok(default),
    }
}
