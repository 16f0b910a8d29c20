use std::time::Duration;

use ledgerly_core::constants::{
    DEFAULT_INVOICE_SCHEDULE_HOUR, DEFAULT_INVOICE_SCHEDULE_MINUTE, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_PRICE_REFRESH_INTERVAL_HOURS, DEFAULT_RECURRENCE_INTERVAL_HOURS,
    DEFAULT_RUN_TIMEOUT_SECS,
};
use ledgerly_core::scheduler::{parse_time_zone, WorkerSettings};
use ledgerly_core::{Error, Result};

pub struct Config {
    pub db_path: String,
    pub log_format: String,
    pub settings: WorkerSettings,
}

fn parse_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            Error::InvalidConfigValue(format!("{} must be a whole number, got '{}'", key, raw))
        }),
    }
}

impl Config {
    /// Reads `LEDGERLY_*` variables, after loading a `.env` file when present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = lookup("LEDGERLY_DB_PATH").unwrap_or_else(|| "./db/ledgerly.db".into());
        let log_format = lookup("LEDGERLY_LOG_FORMAT").unwrap_or_else(|| "text".into());
        let time_zone = match lookup("LEDGERLY_SCHEDULE_TIME_ZONE") {
            Some(name) => parse_time_zone(&name)?,
            None => chrono_tz::Tz::UTC,
        };

        let settings = WorkerSettings {
            recurrence_interval_hours: parse_number(
                &lookup,
                "LEDGERLY_RECURRENCE_INTERVAL_HOURS",
                DEFAULT_RECURRENCE_INTERVAL_HOURS,
            )?,
            invoice_schedule_hour: parse_number(
                &lookup,
                "LEDGERLY_INVOICE_SCHEDULE_HOUR",
                DEFAULT_INVOICE_SCHEDULE_HOUR,
            )?,
            invoice_schedule_minute: parse_number(
                &lookup,
                "LEDGERLY_INVOICE_SCHEDULE_MINUTE",
                DEFAULT_INVOICE_SCHEDULE_MINUTE,
            )?,
            time_zone,
            poll_interval: Duration::from_secs(parse_number(
                &lookup,
                "LEDGERLY_POLL_INTERVAL_SECS",
                DEFAULT_POLL_INTERVAL_SECS,
            )?),
            run_timeout: Duration::from_secs(parse_number(
                &lookup,
                "LEDGERLY_RUN_TIMEOUT_SECS",
                DEFAULT_RUN_TIMEOUT_SECS,
            )?),
            price_refresh_interval_hours: parse_number(
                &lookup,
                "LEDGERLY_PRICE_REFRESH_INTERVAL_HOURS",
                DEFAULT_PRICE_REFRESH_INTERVAL_HOURS,
            )?,
        };
        settings.validate()?;

        Ok(Self {
            db_path,
            log_format,
            settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.db_path, "./db/ledgerly.db");
        assert_eq!(config.log_format, "text");
        assert_eq!(config.settings, WorkerSettings::default());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("LEDGERLY_SCHEDULE_TIME_ZONE", "America/Sao_Paulo"),
            ("LEDGERLY_INVOICE_SCHEDULE_HOUR", "3"),
            ("LEDGERLY_PRICE_REFRESH_INTERVAL_HOURS", "0"),
        ])
        .unwrap();
        assert_eq!(config.settings.time_zone, chrono_tz::America::Sao_Paulo);
        assert_eq!(config.settings.invoice_schedule_hour, 3);
        assert!(config.settings.price_refresh_schedule().is_none());
    }

    #[test]
    fn test_rejects_bad_values() {
        for (key, value) in [
            ("LEDGERLY_RECURRENCE_INTERVAL_HOURS", "0"),
            ("LEDGERLY_RECURRENCE_INTERVAL_HOURS", "25"),
            ("LEDGERLY_INVOICE_SCHEDULE_MINUTE", "60"),
            ("LEDGERLY_POLL_INTERVAL_SECS", "1"),
            ("LEDGERLY_RUN_TIMEOUT_SECS", "three"),
            ("LEDGERLY_SCHEDULE_TIME_ZONE", "Mars/Olympus"),
        ] {
            let err = config_from(&[(key, value)]).err();
            assert!(
                matches!(err, Some(Error::InvalidConfigValue(_))),
                "{}={} should be rejected",
                key,
                value
            );
        }
    }
}
