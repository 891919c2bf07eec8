use std::env;
use std::fmt::Display;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use chrono::NaiveTime;
use dotenvy::dotenv;

use crate::model::leave::{DecisionRules, LeaveSeed, ShortfallPolicy};
use crate::service::attendance::Workday;
use crate::utils::time_input::parse_time_text;

#[derive(Clone, Debug)]
pub struct BootstrapAccount {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub db_max_connections: u32,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    pub log_dir: String,
    pub log_level: tracing::Level,

    // Attendance cutoffs
    pub workday_start: NaiveTime,
    pub workday_end: NaiveTime,

    pub leave_seed: LeaveSeed,
    pub shortfall_policy: ShortfallPolicy,

    pub bootstrap_hr: Option<BootstrapAccount>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bootstrap_hr = match (lookup("BOOTSTRAP_HR_EMAIL"), lookup("BOOTSTRAP_HR_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAccount { email, password }),
            (None, None) => None,
            _ => {
                return Err(anyhow!(
                    "BOOTSTRAP_HR_EMAIL and BOOTSTRAP_HR_PASSWORD must be set together"
                ));
            }
        };

        let workday_start = time_or(&lookup, "WORKDAY_START", "09:00")?;
        let workday_end = time_or(&lookup, "WORKDAY_END", "17:00")?;
        if workday_end <= workday_start {
            return Err(anyhow!("WORKDAY_END must be later than WORKDAY_START"));
        }

        let defaults = LeaveSeed::default();

        Ok(Self {
            server_addr: required(&lookup, "SERVER_ADDR")?,
            database_url: required(&lookup, "DATABASE_URL")?,
            jwt_secret: required(&lookup, "JWT_SECRET")?,
            access_token_ttl: parsed_or(&lookup, "ACCESS_TOKEN_TTL", 900)?, // default 15 min
            db_max_connections: parsed_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,

            rate_login_per_min: parsed_or(&lookup, "RATE_LOGIN_PER_MIN", 60)?,
            rate_register_per_min: parsed_or(&lookup, "RATE_REGISTER_PER_MIN", 30)?,
            rate_protected_per_min: parsed_or(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),

            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            log_level: parsed_or(&lookup, "LOG_LEVEL", tracing::Level::DEBUG)?,

            workday_start,
            workday_end,

            leave_seed: LeaveSeed {
                annual: seed_or(&lookup, "LEAVE_SEED_ANNUAL", defaults.annual)?,
                sick: seed_or(&lookup, "LEAVE_SEED_SICK", defaults.sick)?,
                casual: seed_or(&lookup, "LEAVE_SEED_CASUAL", defaults.casual)?,
            },
            shortfall_policy: parsed_or(&lookup, "LEAVE_SHORTFALL_POLICY", ShortfallPolicy::Floor)?,

            bootstrap_hr,
        })
    }

    pub fn workday(&self) -> Workday {
        Workday {
            start: self.workday_start,
            end: self.workday_end,
        }
    }

    pub fn decision_rules(&self) -> DecisionRules {
        DecisionRules {
            seed: self.leave_seed,
            shortfall: self.shortfall_policy,
        }
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<String> {
    lookup(key).ok_or_else(|| anyhow!("{key} must be set"))
}

fn parsed_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key} has an invalid value {raw:?}: {e}")),
        None => Ok(default),
    }
}

fn time_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> anyhow::Result<NaiveTime> {
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    parse_time_text(&raw).with_context(|| format!("{key} is not a time of day"))
}

fn seed_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: f64,
) -> anyhow::Result<f64> {
    let value: f64 = parsed_or(lookup, key, default)?;
    if value < 0.0 || !value.is_finite() {
        return Err(anyhow!("{key} must be a non-negative number"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("SERVER_ADDR", "127.0.0.1:8080"),
        ("DATABASE_URL", "mysql://hr:hr@localhost/hrms"),
        ("JWT_SECRET", "secret"),
    ];

    #[test]
    fn defaults_apply_when_optional_keys_are_absent() {
        let config = config_from(REQUIRED).unwrap();

        assert_eq!(config.access_token_ttl, 900);
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.rate_protected_per_min, 1000);
        assert_eq!(config.workday_start, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(config.workday_end, NaiveTime::from_hms_opt(17, 0, 0).unwrap());
        assert_eq!(config.leave_seed, LeaveSeed::default());
        assert_eq!(config.shortfall_policy, ShortfallPolicy::Floor);
        assert_eq!(config.log_level, tracing::Level::DEBUG);
        assert!(config.bootstrap_hr.is_none());
    }

    #[test]
    fn missing_required_key_is_reported() {
        let err = config_from(&REQUIRED[..2]).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn overrides_are_parsed() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("WORKDAY_START", "8:30 AM"),
            ("WORKDAY_END", "16:45"),
            ("LEAVE_SEED_SICK", "7.5"),
            ("LEAVE_SHORTFALL_POLICY", "Block"),
            ("LOG_LEVEL", "info"),
        ]);
        let config = config_from(&pairs).unwrap();

        assert_eq!(config.workday_start, NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert_eq!(config.workday_end, NaiveTime::from_hms_opt(16, 45, 0).unwrap());
        assert_eq!(config.leave_seed.sick, 7.5);
        assert_eq!(config.shortfall_policy, ShortfallPolicy::Block);
        assert_eq!(config.log_level, tracing::Level::INFO);
    }

    #[test]
    fn bad_values_are_errors() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("ACCESS_TOKEN_TTL", "soon"));
        assert!(config_from(&pairs).is_err());

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("LEAVE_SEED_ANNUAL", "-1"));
        assert!(config_from(&pairs).is_err());

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("BOOTSTRAP_HR_EMAIL", "hr@example.com"));
        assert!(config_from(&pairs).is_err());
    }
}
