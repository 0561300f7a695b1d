use std::time::Duration;

use crate::config::parse_duration_value;
use crate::error::{AppError, AppResult, ConfigError};

pub(crate) fn parse_var(s: &str) -> Result<(String, String), ConfigError> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.to_owned()))
        }
        Some(_) | None => Err(ConfigError::InvalidVar {
            value: s.to_owned(),
        }),
    }
}

pub(crate) fn parse_bool_env(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "" | "1" | "true" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "no" | "n" | "off" => Ok(false),
        _ => Err(format!("Invalid boolean '{}'.", s)),
    }
}

pub(crate) fn parse_duration_arg(s: &str) -> AppResult<Duration> {
    parse_duration_value(s).map_err(|message| {
        AppError::config(ConfigError::InvalidDuration {
            field: "--timeout",
            message,
        })
    })
}
