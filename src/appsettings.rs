use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;
use chrono::TimeDelta;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::notifier::NotifierOptions;

#[derive(Deserialize, Debug)]
pub struct NotifierSettings {
    pub poll_interval_secs: u64,
    pub catch_up_secs: i64,
    pub timezone: String,
}

#[derive(Deserialize, Debug)]
pub struct StorageSettings {
    pub seed_file: Option<PathBuf>,
}

#[derive(Deserialize, Debug)]
pub struct AppSettings {
    pub notifier: NotifierSettings,
    pub storage: StorageSettings,
}

impl AppSettings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("notifier.poll_interval_secs", 60)?
            .set_default("notifier.catch_up_secs", 0)?
            .set_default("notifier.timezone", "UTC")?
            .add_source(File::with_name("appsettings").required(false))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

impl NotifierSettings {
    pub fn to_options(&self) -> anyhow::Result<NotifierOptions> {
        if self.poll_interval_secs == 0 {
            anyhow::bail!("notifier.poll_interval_secs must be positive");
        }
        if self.catch_up_secs < 0 {
            anyhow::bail!("notifier.catch_up_secs must not be negative");
        }

        let timezone = self
            .timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|error| anyhow!("Invalid timezone {}: {}", self.timezone, error))?;
        let catch_up = TimeDelta::try_seconds(self.catch_up_secs)
            .ok_or_else(|| anyhow!("notifier.catch_up_secs is out of range"))?;

        Ok(NotifierOptions {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            catch_up,
            timezone,
        })
    }
}
