//! Service configuration.
//!
//! All settings come from environment variables and fall back to the values
//! the service is deployed with.

use std::env;

use crate::error::{GcError, Result};

/// Default name of the request table
pub const DEFAULT_TABLE_NAME: &str = "GrammarCorrect";

/// Default name of the artifact bucket
pub const DEFAULT_BUCKET: &str = "grammar-correct-audio";

/// Default AWS region
pub const DEFAULT_REGION: &str = "eu-central-1";

/// Default record lifetime: seven days
pub const DEFAULT_REQUEST_TTL_SECS: u64 = 7 * 24 * 60 * 60;

pub const TABLE_ENV: &str = "GRAMMAR_CORRECT_TABLE";
pub const BUCKET_ENV: &str = "GRAMMAR_CORRECT_BUCKET";
pub const REGION_ENV: &str = "GRAMMAR_CORRECT_REGION";
pub const REQUEST_TTL_ENV: &str = "GRAMMAR_CORRECT_REQUEST_TTL_SECS";
pub const STORE_CORRECTED_AUDIO_ENV: &str = "GRAMMAR_CORRECT_STORE_CORRECTED_AUDIO";

/// Process-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Name of the request table
    pub table_name: String,
    /// Name of the artifact bucket
    pub bucket: String,
    /// Region the table and bucket live in
    pub region: String,
    /// Behaviour of the dispatcher
    pub dispatch: DispatchConfig,
}

/// Settings that change how events are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Lifetime of a new request record, in seconds
    pub request_ttl_secs: u64,
    /// Whether run-events write the corrected artifact to the object store
    pub store_corrected_audio: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            request_ttl_secs: DEFAULT_REQUEST_TTL_SECS,
            store_corrected_audio: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            region: DEFAULT_REGION.to_string(),
            dispatch: DispatchConfig::default(),
        }
    }
}

impl Config {
    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load the configuration through `lookup`, which returns the value of a variable if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let text = |name: &str, default: String| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(default)
        };

        let request_ttl_secs = match lookup(REQUEST_TTL_ENV) {
            Some(value) => value.trim().parse::<u64>().map_err(|e| {
                GcError::Config(format!("{} must be a number of seconds: {}", REQUEST_TTL_ENV, e))
            })?,
            None => defaults.dispatch.request_ttl_secs,
        };

        let store_corrected_audio = match lookup(STORE_CORRECTED_AUDIO_ENV) {
            Some(value) => parse_flag(STORE_CORRECTED_AUDIO_ENV, &value)?,
            None => defaults.dispatch.store_corrected_audio,
        };

        Ok(Self {
            table_name: text(TABLE_ENV, defaults.table_name),
            bucket: text(BUCKET_ENV, defaults.bucket),
            region: text(REGION_ENV, defaults.region),
            dispatch: DispatchConfig {
                request_ttl_secs,
                store_corrected_audio,
            },
        })
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(GcError::Config(format!(
            "{} must be a boolean, got '{}'",
            name, other
        ))),
    }
}
