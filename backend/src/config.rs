//! Runtime configuration.
//!
//! Read from the environment (a `.env` file is loaded first, if present).
//! CLI flags override individual fields after loading.

use chrono::FixedOffset;
use std::env;
use std::path::PathBuf;

use crate::bank_codes::BankCodeTable;
use crate::error::{BankCodeResult, ConfigError};

/// HTTP listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// West Africa Time, UTC+01:00 all year.
pub const DEFAULT_UTC_OFFSET_SECS: i32 = 3600;

/// Naira.
pub const DEFAULT_CURRENCY_SYMBOL: &str = "₦";

/// 10 MB upload limit.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const ENV_PORT: &str = "DISBURSE_PORT";
const ENV_UTC_OFFSET: &str = "DISBURSE_UTC_OFFSET";
const ENV_CURRENCY: &str = "DISBURSE_CURRENCY";
const ENV_BANK_CODES: &str = "DISBURSE_BANK_CODES";
const ENV_MAX_UPLOAD_BYTES: &str = "DISBURSE_MAX_UPLOAD_BYTES";
const ENV_STATIC_DIR: &str = "DISBURSE_STATIC_DIR";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    /// Offset used to timestamp export file names.
    pub utc_offset: FixedOffset,
    pub currency_symbol: String,
    /// JSON table replacing the built-in bank codes.
    pub bank_codes_path: Option<PathBuf>,
    pub max_upload_bytes: usize,
    /// Directory served for paths the API does not handle.
    pub static_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            utc_offset: default_offset(),
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            bank_codes_path: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            static_dir: None,
        }
    }
}

impl Config {
    /// Load `.env` (if any) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unset or blank variables keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(value) = get(ENV_PORT) {
            config.port = value
                .trim()
                .parse()
                .map_err(|_| invalid(ENV_PORT, &value))?;
        }
        if let Some(value) = get(ENV_UTC_OFFSET) {
            config.utc_offset =
                parse_utc_offset(&value).ok_or_else(|| invalid(ENV_UTC_OFFSET, &value))?;
        }
        if let Some(value) = get(ENV_CURRENCY) {
            config.currency_symbol = value.trim().to_string();
        }
        if let Some(value) = get(ENV_BANK_CODES) {
            config.bank_codes_path = Some(PathBuf::from(value.trim()));
        }
        if let Some(value) = get(ENV_MAX_UPLOAD_BYTES) {
            config.max_upload_bytes = value
                .trim()
                .parse()
                .map_err(|_| invalid(ENV_MAX_UPLOAD_BYTES, &value))?;
        }
        if let Some(value) = get(ENV_STATIC_DIR) {
            config.static_dir = Some(PathBuf::from(value.trim()));
        }

        Ok(config)
    }

    /// Build the bank-code table this configuration names.
    ///
    /// Called once at startup; the table is then shared read-only.
    pub fn load_bank_codes(&self) -> BankCodeResult<BankCodeTable> {
        match self.bank_codes_path {
            Some(ref path) => BankCodeTable::load(path),
            None => Ok(BankCodeTable::builtin()),
        }
    }
}

/// Parse `+01:00`, `-0530`, `+1` or `Z` into a fixed offset.
pub fn parse_utc_offset(value: &str) -> Option<FixedOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match value.as_bytes().first()? {
        b'+' => (1, &value[1..]),
        b'-' => (-1, &value[1..]),
        _ => return None,
    };

    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };

    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..=23).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn default_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECS).expect("default offset is within a day")
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
