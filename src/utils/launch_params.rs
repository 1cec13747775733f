use std::fmt;

use serde_json::json;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::utils::telegram_auth;

/// Authorization scheme the backend expects in front of raw init data.
pub const AUTH_SCHEME: &str = "tma";

const MOCK_USER_ID: i64 = 99_281_932;

/// Raw launch parameters handed over by the Telegram host.
#[derive(Clone, PartialEq, Eq)]
pub struct LaunchParams {
    raw: String,
}

impl LaunchParams {
    pub fn from_raw(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into().trim().to_string();
        if raw.is_empty() {
            return Err(Error::Config("Launch parameters are empty".to_string()));
        }
        if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(Error::Config(
                "Launch parameters must not contain whitespace".to_string(),
            ));
        }
        Ok(Self { raw })
    }

    /// Takes `TMA_INIT_DATA` when present, otherwise signs mock data with the
    /// development bot token.
    pub fn from_config(config: &Config) -> Result<Self> {
        if let Some(raw) = &config.init_data {
            return Self::from_raw(raw.clone());
        }
        match &config.mock_bot_token {
            Some(token) => Self::mock(config.mock_user_id.unwrap_or(MOCK_USER_ID), token),
            None => Err(Error::Config(
                "Missing environment variable: TMA_INIT_DATA (or TMA_MOCK_BOT_TOKEN)".to_string(),
            )),
        }
    }

    pub fn mock(user_id: i64, bot_token: &str) -> Result<Self> {
        let user = json!({
            "id": user_id,
            "first_name": "Andrew",
            "last_name": "Rogue",
            "username": "rogue",
            "language_code": "en",
        });
        let fields = [
            ("auth_date", chrono::Utc::now().timestamp().to_string()),
            ("user", user.to_string()),
            ("start_param", "debug".to_string()),
        ];
        let raw = telegram_auth::sign_init_data(&fields, bot_token)
            .ok_or_else(|| Error::Internal("failed to sign mock launch parameters".to_string()))?;
        Self::from_raw(raw)
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Value of the `Authorization` header: `tma <raw>`.
    pub fn authorization(&self) -> String {
        format!("{} {}", AUTH_SCHEME, self.raw)
    }

    pub fn user_id(&self) -> Option<i64> {
        telegram_auth::user_id(&self.raw)
    }
}

impl fmt::Debug for LaunchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchParams")
            .field("user_id", &self.user_id())
            .finish_non_exhaustive()
    }
}
