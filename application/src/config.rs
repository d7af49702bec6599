//! [`Config`]-related definitions.

use std::time;

use common::{money::InvalidCurrencyCode, CurrencyCode};
use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use secrecy::SecretString;
use serde::Deserialize;
use service::{domain::opportunity::Probability, infra::rest};
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Record store configuration.
    pub record_store: RecordStore,

    /// Service configuration.
    pub service: Service,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Record store configuration.
#[derive(Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct RecordStore {
    /// Base URL of the record store service root.
    #[default("http://127.0.0.1:8080/odata".to_owned())]
    pub url: String,

    /// Bearer token to authenticate with, if any.
    pub token: Option<SecretString>,

    /// Timeout of a single request.
    #[default(time::Duration::from_secs(30))]
    #[serde(with = "humantime_serde")]
    pub timeout: time::Duration,
}

impl From<RecordStore> for rest::Config {
    fn from(value: RecordStore) -> Self {
        let RecordStore {
            url,
            token,
            timeout,
        } = value;
        Self {
            url,
            token,
            timeout,
        }
    }
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// Currency new opportunities are priced in.
    #[default("USD".to_owned())]
    pub default_currency: String,

    /// Chance of winning new opportunities, in percents.
    #[default(50)]
    pub default_probability: u8,
}

impl TryFrom<Service> for service::Config {
    type Error = InvalidCurrencyCode;

    fn try_from(value: Service) -> Result<Self, Self::Error> {
        let Service {
            default_currency,
            default_probability,
        } = value;
        Ok(Self {
            default_currency: CurrencyCode::try_from(default_currency)?,
            default_probability: Probability::clamped(
                default_probability.into(),
            ),
        })
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}
