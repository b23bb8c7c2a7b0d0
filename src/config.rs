use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderConfig,
    pub debounce: Duration,
}

/// Which recommendation/search strategy the gateway talks to
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    Remote(RemoteConfig),
    Local(LocalConfig),
}

/// A recommender service reachable over HTTP
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub timeout: Duration,
}

/// A SQLite catalog for search plus a local program for recommendations
#[derive(Debug, Clone)]
pub struct LocalConfig {
    pub catalog_path: PathBuf,
    pub program: String,
    pub args: Vec<String>,
    pub workdir: Option<PathBuf>,
    pub timeout: Duration,
    pub search_limit: usize,
}

/// Load configuration from `.env` and environment
pub fn load_config() -> Result<Config> {
    // Load `.env` file if present
    dotenv::dotenv().ok();
    Config::from_lookup(|key| std::env::var(key).ok())
}

impl Config {
    /// Build the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let debounce =
            Duration::from_millis(parse_or(&lookup, "SEARCH_DEBOUNCE_MS", DEFAULT_DEBOUNCE_MS)?);
        let search_limit = parse_or(&lookup, "SEARCH_LIMIT", DEFAULT_SEARCH_LIMIT)?;

        let provider = match lookup("RECOMMENDER_PROVIDER").as_deref().map(str::trim) {
            None | Some("") | Some("remote") => {
                let base_url = lookup("BACKEND_URL")
                    .filter(|url| !url.trim().is_empty())
                    .context("BACKEND_URL must be set for the remote provider")?;
                ProviderConfig::Remote(RemoteConfig {
                    base_url: base_url.trim().trim_end_matches('/').to_string(),
                    timeout: Duration::from_secs(parse_or(&lookup, "HTTP_TIMEOUT_SECS", 30)?),
                })
            }
            Some("local") => {
                let catalog_path = lookup("CATALOG_DB")
                    .filter(|path| !path.trim().is_empty())
                    .context("CATALOG_DB must be set for the local provider")?;
                let script =
                    lookup("RECOMMEND_SCRIPT").unwrap_or_else(|| "recommend.py".to_string());
                ProviderConfig::Local(LocalConfig {
                    catalog_path: PathBuf::from(catalog_path),
                    program: lookup("RECOMMEND_PROGRAM").unwrap_or_else(|| "python".to_string()),
                    args: vec![script],
                    workdir: lookup("RECOMMEND_WORKDIR").map(PathBuf::from),
                    timeout: Duration::from_secs(parse_or(&lookup, "RECOMMEND_TIMEOUT_SECS", 120)?),
                    search_limit,
                })
            }
            Some(other) => {
                return Err(anyhow::anyhow!(
                    "Unknown RECOMMENDER_PROVIDER '{}' (expected 'remote' or 'local')",
                    other
                ));
            }
        };

        Ok(Config { provider, debounce })
    }

    /// Path of the local catalog, if one is configured
    pub fn catalog_path(&self) -> Option<&PathBuf> {
        match &self.provider {
            ProviderConfig::Local(local) => Some(&local.catalog_path),
            ProviderConfig::Remote(_) => None,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value '{value}'")),
        None => Ok(default),
    }
}
