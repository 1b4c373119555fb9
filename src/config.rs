//! TOML configuration for the demo binary.
//!
//! A `[stream]` section pins the slave side of the conversion: the slave
//! rate is required once the section exists, the slave format stays
//! negotiable unless named. Unknown keys are rejected rather than ignored
//! so a typo fails loudly instead of silently falling back to defaults.

use serde::{Deserialize, Serialize};

use crate::audio::codec::SampleFormat;
use crate::audio::constants::{RATE_MAX, RATE_MIN};
use crate::common::errors::{RateError, RateResult};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub stream: StreamConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct StreamConfig {
    pub name: Option<String>,
    pub target_rate: Option<u32>,
    pub target_format: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub filters: Option<String>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            name: None,
            target_rate: Some(48_000),
            target_format: None,
        }
    }
}

impl Config {
    /// Reads `config.toml` from the working directory. A missing or empty
    /// file yields the defaults; a file that fails to parse is an error.
    pub fn load() -> RateResult<Self> {
        let config_str = std::fs::read_to_string("config.toml").unwrap_or_default();
        if config_str.is_empty() {
            return Ok(Config::default());
        }
        let config: Config = toml::from_str(&config_str)?;
        Ok(config)
    }
}

impl StreamConfig {
    /// Validates the section into a slave rate and an optional pinned
    /// slave format.
    pub fn resolve(&self) -> RateResult<(u32, Option<SampleFormat>)> {
        let rate = self
            .target_rate
            .ok_or(RateError::MissingField("stream.target_rate"))?;
        if !(RATE_MIN..=RATE_MAX).contains(&rate) {
            return Err(RateError::RateOutOfRange(rate));
        }
        let format = match self.target_format.as_deref() {
            Some(name) => {
                let format = SampleFormat::from_name(name)
                    .ok_or_else(|| RateError::UnknownFormat(name.to_string()))?;
                if !format.is_linear() {
                    return Err(RateError::NonLinearFormat(format));
                }
                Some(format)
            }
            None => None,
        };
        Ok((rate, format))
    }
}
