use crate::constants;
use chrono::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Runtime configuration, read once from the environment at process start
/// and passed down explicitly.
#[derive(Debug, Clone)]
pub struct ReaperConfig {
    pub volume_age: Duration,
    pub snapshot_age: Duration,
    pub dry_run: bool,
    pub bypass_tag: String,
    pub azure_subscription_id: Option<String>,
}

impl ReaperConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the config through a variable-lookup closure, so parsing is
    /// testable without touching the process environment.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            volume_age: parse_age("REAP_AGE_VOLUMES", lookup("REAP_AGE_VOLUMES"))?,
            snapshot_age: parse_age("REAP_AGE_SNAPSHOTS", lookup("REAP_AGE_SNAPSHOTS"))?,
            dry_run: parse_bool("REAP_DRYRUN", lookup("REAP_DRYRUN"))?,
            bypass_tag: lookup("REAP_BYPASS_TAG")
                .unwrap_or_else(|| constants::DEFAULT_BYPASS_TAG.to_string()),
            azure_subscription_id: lookup("AZURE_SUBSCRIPTION_ID"),
        })
    }
}

fn parse_age(var: &'static str, value: Option<String>) -> Result<Duration, ConfigError> {
    let Some(value) = value else {
        return Ok(Duration::seconds(constants::REAP_AGE_DEFAULT_SECS));
    };
    let secs = value
        .parse::<i64>()
        .map_err(|_| ConfigError::Invalid { var, value })?;
    Ok(Duration::seconds(secs))
}

fn parse_bool(var: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { var, value }),
    }
}
