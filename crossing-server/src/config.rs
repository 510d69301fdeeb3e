//! Application configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `FEED_URL` | Sugar Land rail monitor |
//! | `FEED_FILE` | unset; serve a fixed feed document instead of `FEED_URL` |
//! | `DATABASE_URL` | unset; in-memory store |
//! | `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`, `TWILIO_PHONE_NUMBER` | unset; messages are only logged |
//! | `BIND_ADDR` | `127.0.0.1:3000` |
//! | `CHECK_INTERVAL_SECS` | 60 |
//! | `REFRESH_INTERVAL_SECS` | 21600 (6 hours) |
//! | `CHECK_DEADLINE_MS` | 3000 |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::check::CycleConfig;
use crate::domain::{DomainError, PhoneNumber};
use crate::feed::FeedConfig;
use crate::notify::TwilioConfig;

/// Errors from reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("invalid {name}: {value:?}")]
    Invalid { name: &'static str, value: String },

    /// Only some of a group of variables are set
    #[error("incomplete configuration: {0}")]
    Incomplete(&'static str),

    #[error("invalid TWILIO_PHONE_NUMBER: {0}")]
    PhoneNumber(#[from] DomainError),
}

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub feed: FeedConfig,
    /// Fixed feed document served instead of the live feed
    pub feed_file: Option<PathBuf>,
    pub database_url: Option<String>,
    /// SMS credentials; `None` logs messages instead of sending them
    pub twilio: Option<TwilioConfig>,
    pub bind_addr: SocketAddr,
    pub check_interval: Duration,
    pub refresh_interval: Duration,
    pub cycle: CycleConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feed: FeedConfig::default(),
            feed_file: None,
            database_url: None,
            twilio: None,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            check_interval: Duration::from_secs(60),
            refresh_interval: Duration::from_secs(6 * 60 * 60),
            cycle: CycleConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's
    /// value if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get("FEED_URL") {
            config.feed = FeedConfig::new(url);
        }
        config.feed_file = get("FEED_FILE").map(PathBuf::from);
        config.database_url = get("DATABASE_URL");
        config.twilio = twilio_config(&get)?;

        if let Some(addr) = get("BIND_ADDR") {
            config.bind_addr = parse("BIND_ADDR", addr)?;
        }
        if let Some(secs) = get("CHECK_INTERVAL_SECS") {
            config.check_interval = Duration::from_secs(parse_positive("CHECK_INTERVAL_SECS", secs)?);
        }
        if let Some(secs) = get("REFRESH_INTERVAL_SECS") {
            config.refresh_interval =
                Duration::from_secs(parse_positive("REFRESH_INTERVAL_SECS", secs)?);
        }
        if let Some(ms) = get("CHECK_DEADLINE_MS") {
            let deadline = Duration::from_millis(parse_positive("CHECK_DEADLINE_MS", ms)?);
            config.cycle = config.cycle.with_deadline(deadline);
        }

        Ok(config)
    }
}

fn twilio_config(
    get: &impl Fn(&str) -> Option<String>,
) -> Result<Option<TwilioConfig>, ConfigError> {
    match (
        get("TWILIO_ACCOUNT_SID"),
        get("TWILIO_AUTH_TOKEN"),
        get("TWILIO_PHONE_NUMBER"),
    ) {
        (Some(sid), Some(token), Some(from)) => {
            let from = PhoneNumber::parse(&from)?;
            Ok(Some(TwilioConfig::new(sid, token, from)))
        }
        (None, None, None) => Ok(None),
        _ => Err(ConfigError::Incomplete(
            "TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN and TWILIO_PHONE_NUMBER must be set together",
        )),
    }
}

fn parse<T: FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

fn parse_positive(name: &'static str, value: String) -> Result<u64, ConfigError> {
    match parse::<u64>(name, value.clone())? {
        0 => Err(ConfigError::Invalid { name, value }),
        n => Ok(n),
    }
}
