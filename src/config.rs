use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const DEFAULT_PAGE_SIZE: u32 = 30;
pub const MAX_PAGE_SIZE: u32 = 100;

/// What happens to an optimistically liked vacancy when the backend rejects the approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollbackPolicy {
    /// Leave the card removed.
    #[default]
    Keep,
    /// Put the card back at the end of the held list.
    Restore,
}

impl FromStr for RollbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(RollbackPolicy::Keep),
            "restore" => Ok(RollbackPolicy::Restore),
            other => Err(format!("expected `keep` or `restore`, got `{}`", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: Url,
    pub init_data: Option<String>,
    pub mock_bot_token: Option<String>,
    pub mock_user_id: Option<i64>,
    pub page_size: u32,
    pub request_timeout: Option<Duration>,
    pub like_rollback: RollbackPolicy,
}

impl Config {
    /// Minimal configuration pointing at `backend_url`, everything else defaulted.
    pub fn new(backend_url: &str) -> Result<Self> {
        Ok(Self {
            backend_url: parse_backend_url(backend_url)?,
            init_data: None,
            mock_bot_token: None,
            mock_user_id: None,
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: None,
            like_rollback: RollbackPolicy::default(),
        })
    }

    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let page_size = get_env_parse_or("FEED_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(Error::Config(format!(
                "Invalid value for FEED_PAGE_SIZE: must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        Ok(Self {
            backend_url: parse_backend_url(&get_env("IUSTIA_BACKEND_URL")?)?,
            init_data: get_env_opt("TMA_INIT_DATA"),
            mock_bot_token: get_env_opt("TMA_MOCK_BOT_TOKEN"),
            mock_user_id: get_env_opt_parse("TMA_MOCK_USER_ID")?,
            page_size,
            request_timeout: get_env_opt_parse::<u64>("HTTP_TIMEOUT_SECS")?
                .map(Duration::from_secs),
            like_rollback: get_env_parse_or("LIKE_ROLLBACK", RollbackPolicy::default())?,
        })
    }
}

/// Relative paths are appended to the origin, so it always ends with a slash.
fn parse_backend_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    let url = Url::parse(&with_slash)
        .map_err(|e| Error::Config(format!("Invalid backend URL {}: {}", raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(Error::Config(format!(
            "Backend URL {} cannot be used as a base",
            raw
        )));
    }
    Ok(url)
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_opt_parse<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_opt(name)
        .map(|raw| {
            raw.parse()
                .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
        })
        .transpose()
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(get_env_opt_parse(name)?.unwrap_or(default))
}
