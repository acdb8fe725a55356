use anyhow::{anyhow, Result};
use std::{env, fmt::Display, net::SocketAddr, str::FromStr, time::Duration};
use tracing::{info, warn};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080/api";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";
const DEFAULT_WEB_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_PAGE_SIZE: &str = "20";
const DEFAULT_DEBOUNCE_MS: &str = "500";
const DEFAULT_LOCALE: &str = "en";
const DEFAULT_SESSION_TTL_SECS: &str = "1800";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" => Ok(Locale::En),
            "zh" | "zh-cn" => Ok(Locale::Zh),
            other => Err(format!("unsupported locale '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub image_base_url: String,
    pub web_addr: SocketAddr,
    pub page_size: u32,
    pub debounce: Duration,
    pub locale: Locale,
    pub session_ttl: Duration,
}

impl Config {
    /// Reads the process environment. Unset variables fall back to their
    /// defaults; a set but unparsable value is an error.
    pub fn from_env() -> Result<Self> {
        let api_url: String = try_load("ANIME_API_URL", DEFAULT_API_URL)?;
        let image_base_url: String = try_load("ANIME_IMAGE_BASE_URL", DEFAULT_IMAGE_BASE_URL)?;
        let debounce_ms: u64 = try_load("ANIME_SEARCH_DEBOUNCE_MS", DEFAULT_DEBOUNCE_MS)?;
        let session_ttl_secs: u64 = try_load("ANIME_SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;
        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            image_base_url: image_base_url.trim_end_matches('/').to_string(),
            web_addr: try_load("ANIME_WEB_ADDR", DEFAULT_WEB_ADDR)?,
            page_size: try_load("ANIME_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            debounce: Duration::from_millis(debounce_ms),
            locale: try_load("ANIME_LOCALE", DEFAULT_LOCALE)?,
            session_ttl: Duration::from_secs(session_ttl_secs),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            web_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            page_size: 20,
            debounce: Duration::from_millis(500),
            locale: Locale::En,
            session_ttl: Duration::from_secs(1800),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = match env::var(key) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => {
            info!("{key} not set, using default: {default}");
            default.to_string()
        }
    };
    raw.trim().parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        anyhow!("Environment variable {key} has an invalid value '{raw}': {e}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_parses_known_tags() {
        assert_eq!("EN".parse::<Locale>(), Ok(Locale::En));
        assert_eq!("zh-CN".parse::<Locale>(), Ok(Locale::Zh));
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn builtin_defaults_parse() {
        let addr: SocketAddr = DEFAULT_WEB_ADDR.parse().unwrap();
        assert_eq!(addr, Config::default().web_addr);
        let size: u32 = DEFAULT_PAGE_SIZE.parse().unwrap();
        assert_eq!(size, Config::default().page_size);
        let locale: Locale = DEFAULT_LOCALE.parse().unwrap();
        assert_eq!(locale, Locale::default());
        let ttl: u64 = DEFAULT_SESSION_TTL_SECS.parse().unwrap();
        assert_eq!(Duration::from_secs(ttl), Config::default().session_ttl);
    }
}
