//! Runtime settings, read once from the environment at startup.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::SecretString;
use url::Url;

use crate::duration::SHORTS_FLOOR_SECS;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_CREDENTIAL_NAME: &str = "YOUTUBE_API_KEY";
/// Environment variables with this prefix are captured as API credentials.
pub const CREDENTIAL_PREFIX: &str = "YOUTUBE_API_KEY";
/// Upstream cap on `maxResults` and on ids per `videos.list` call.
pub const MAX_BATCH: usize = 50;

#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub query_suffix: String,
    pub page_size: usize,
    pub pages_per_strategy: usize,
    pub min_duration_secs: u32,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            query_suffix: "Christian Sermons".to_string(),
            page_size: MAX_BATCH,
            pages_per_strategy: 1,
            min_duration_secs: SHORTS_FLOOR_SECS,
        }
    }
}

#[derive(Debug)]
pub struct Settings {
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub api_base: Url,
    pub default_credential_name: String,
    pub ingest: IngestSettings,
    pub reconcile_interval: Duration,
    pub reconcile_on_start: bool,
    pub http_timeout: Duration,
    pub admin_token: Option<SecretString>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(&std::env::vars().collect())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| lookup(vars, key);

        let api_base = Url::parse(get("YOUTUBE_API_BASE").unwrap_or(DEFAULT_API_BASE))
            .context("YOUTUBE_API_BASE is not a valid URL")?;

        let ingest = IngestSettings {
            query_suffix: get("SEARCH_QUERY_SUFFIX")
                .unwrap_or("Christian Sermons")
                .to_string(),
            page_size: parse_or(get("SEARCH_PAGE_SIZE"), MAX_BATCH, "SEARCH_PAGE_SIZE")?
                .clamp(1, MAX_BATCH),
            pages_per_strategy: parse_or(
                get("SEARCH_PAGES_PER_STRATEGY"),
                1,
                "SEARCH_PAGES_PER_STRATEGY",
            )?
            .max(1),
            min_duration_secs: parse_or(
                get("MIN_DURATION_SECS"),
                SHORTS_FLOOR_SECS,
                "MIN_DURATION_SECS",
            )?,
        };

        let interval_hours: u64 =
            parse_or(get("RECONCILE_INTERVAL_HOURS"), 6, "RECONCILE_INTERVAL_HOURS")?;
        if interval_hours == 0 {
            anyhow::bail!("RECONCILE_INTERVAL_HOURS must be at least 1");
        }

        Ok(Self {
            database_url: get("DATABASE_URL").map(str::to_string),
            host: get("HOST").unwrap_or("0.0.0.0").to_string(),
            port: parse_or(get("PORT"), 5000, "PORT")?,
            api_base,
            default_credential_name: get("DEFAULT_CREDENTIAL_NAME")
                .unwrap_or(DEFAULT_CREDENTIAL_NAME)
                .to_string(),
            ingest,
            reconcile_interval: Duration::from_secs(interval_hours * 60 * 60),
            reconcile_on_start: parse_or(get("RECONCILE_ON_START"), false, "RECONCILE_ON_START")?,
            http_timeout: Duration::from_secs(parse_or(
                get("HTTP_TIMEOUT_SECS"),
                30,
                "HTTP_TIMEOUT_SECS",
            )?),
            admin_token: get("ADMIN_TOKEN").map(|t| SecretString::new(t.to_string())),
        })
    }

    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set")
    }
}

fn lookup<'a>(vars: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_or<T>(raw: Option<&str>, default: T, key: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .parse()
            .with_context(|| format!("{key} has an invalid value: {value:?}")),
        None => Ok(default),
    }
}
