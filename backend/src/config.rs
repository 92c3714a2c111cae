use anyhow::{anyhow, Context};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::models::leave_balance::LeaveAllotments;

pub const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: u64,
    pub time_zone: Tz,
    pub server_addr: String,
    pub frontend_url: String,
    pub db_max_connections: u32,
    pub tx_max_attempts: u32,
    pub tx_retry_base_ms: u64,
    pub leave_allotments: LeaveAllotments,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;

        let jwt_secret = lookup("JWT_SECRET").ok_or_else(|| anyhow!("JWT_SECRET must be set"))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(anyhow!(
                "JWT_SECRET must be at least {} characters",
                MIN_JWT_SECRET_LENGTH
            ));
        }

        let time_zone_name = lookup("APP_TIMEZONE").unwrap_or_else(|| "UTC".to_string());
        let time_zone: Tz = time_zone_name
            .parse()
            .map_err(|_| anyhow!("Invalid APP_TIMEZONE value: {}", time_zone_name))?;

        let tx_max_attempts: u32 = parse_or(&lookup, "TX_MAX_ATTEMPTS", 3)?;
        if tx_max_attempts == 0 {
            return Err(anyhow!("TX_MAX_ATTEMPTS must be at least 1"));
        }

        let defaults = LeaveAllotments::default();
        let leave_allotments = LeaveAllotments {
            annual: parse_or(&lookup, "LEAVE_DEFAULT_ANNUAL", defaults.annual)?,
            sick: parse_or(&lookup, "LEAVE_DEFAULT_SICK", defaults.sick)?,
            maternity: parse_or(&lookup, "LEAVE_DEFAULT_MATERNITY", defaults.maternity)?,
            paternity: parse_or(&lookup, "LEAVE_DEFAULT_PATERNITY", defaults.paternity)?,
            bereavement: parse_or(&lookup, "LEAVE_DEFAULT_BEREAVEMENT", defaults.bereavement)?,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            jwt_expiration_hours: parse_or(&lookup, "JWT_EXPIRATION_HOURS", 8)?,
            time_zone,
            server_addr: lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:4000".to_string()),
            frontend_url: lookup("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            tx_max_attempts,
            tx_retry_base_ms: parse_or(&lookup, "TX_RETRY_BASE_MS", 50)?,
            leave_allotments,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {} value: {}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_optional_vars_missing() {
        let config = load(&[("DATABASE_URL", "postgres://db"), ("JWT_SECRET", SECRET)]).unwrap();
        assert_eq!(config.jwt_expiration_hours, 8);
        assert_eq!(config.time_zone, chrono_tz::UTC);
        assert_eq!(config.server_addr, "0.0.0.0:4000");
        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.tx_max_attempts, 3);
        assert_eq!(config.tx_retry_base_ms, 50);
        assert_eq!(config.leave_allotments, LeaveAllotments::default());
    }

    #[test]
    fn required_vars_are_enforced() {
        assert!(load(&[("JWT_SECRET", SECRET)]).is_err());
        assert!(load(&[("DATABASE_URL", "postgres://db")]).is_err());
        let err = load(&[("DATABASE_URL", "postgres://db"), ("JWT_SECRET", "short")]).unwrap_err();
        assert!(err.to_string().contains("at least 32"));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("DATABASE_URL", "postgres://db"),
            ("JWT_SECRET", SECRET),
            ("APP_TIMEZONE", "Asia/Tokyo"),
            ("LEAVE_DEFAULT_ANNUAL", "25"),
            ("TX_MAX_ATTEMPTS", "5"),
        ])
        .unwrap();
        assert_eq!(config.time_zone, chrono_tz::Asia::Tokyo);
        assert_eq!(config.leave_allotments.annual, 25);
        assert_eq!(config.leave_allotments.sick, 10);
        assert_eq!(config.tx_max_attempts, 5);
    }

    #[test]
    fn invalid_values_are_reported() {
        let base = [("DATABASE_URL", "postgres://db"), ("JWT_SECRET", SECRET)];
        for (key, value) in [
            ("APP_TIMEZONE", "Mars/Olympus"),
            ("DB_MAX_CONNECTIONS", "many"),
            ("TX_MAX_ATTEMPTS", "0"),
        ] {
            let mut pairs = base.to_vec();
            pairs.push((key, value));
            let err = load(&pairs).unwrap_err();
            assert!(err.to_string().contains(key), "{key}: {err}");
        }
    }
}
