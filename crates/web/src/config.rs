use serde::Deserialize;
use taskmate_db::{ParseTimeZoneError, TimeZone};

/// Web server settings, read from `TASKMATE_*` environment variables.
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Secret used to sign session and API tokens
    pub jwt_secret: String,
    /// Lifetime of issued tokens, in hours
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    /// Page size of the task list API
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Zone used to decide what "today" is for overdue checks
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    /// Mark the session cookie `Secure`
    #[serde(default)]
    pub secure_cookies: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("TASKMATE").try_parsing(true))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        Ok(config)
    }

    /// Defaults for everything except the signing secret
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            jwt_secret: jwt_secret.into(),
            token_ttl_hours: default_token_ttl_hours(),
            page_size: default_page_size(),
            time_zone: default_time_zone(),
            secure_cookies: false,
        }
    }

    /// Parsed `time_zone` setting
    pub fn time_zone(&self) -> Result<TimeZone, ParseTimeZoneError> {
        self.time_zone.parse()
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_token_ttl_hours() -> i64 {
    24
}

fn default_page_size() -> usize {
    10
}

fn default_time_zone() -> String {
    "UTC".to_string()
}
