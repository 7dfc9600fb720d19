use crate::{utils, CapacityError};
use chrono::{FixedOffset, Offset, Utc};
use std::time::Duration;

const DEFAULT_MARKER: &str = "function";
const DEFAULT_DATA_VARIABLE: &str = "data";
const DEFAULT_STATE_BLOB: &str = "rotation-state.json";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorKind {
    Text,
    Structured,
}

/// Everything one invocation needs, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub url: String,
    pub xpath: String,
    pub blob_connection_string: String,
    pub blob_container_name: String,
    pub current_blob: Option<String>,
    pub last_update_day: Option<String>,
    pub snippet_marker: String,
    pub data_variable: String,
    pub utc_offset: FixedOffset,
    pub fetch_timeout: Duration,
    pub blob_timeout: Duration,
    pub state_blob: String,
    pub accumulator: AccumulatorKind,
}

impl Config {
    pub fn from_env() -> Result<Config, CapacityError> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, CapacityError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| optional(key).ok_or(CapacityError::ConfigMissing(key));

        let url = required("url")?;
        let xpath = required("xpath")?;
        let blob_connection_string = required("BlobConnectionString")?;
        let blob_container_name = required("BlobContainerName")?;

        let utc_offset = match optional("utcOffset") {
            Some(s) => utils::parse_utc_offset(&s).ok_or(CapacityError::ConfigInvalid {
                key: "utcOffset",
                reason: format!("expected ±HH:MM, got `{}`", s),
            })?,
            None => Utc.fix(),
        };

        let accumulator = match optional("accumulator").as_deref() {
            None | Some("text") => AccumulatorKind::Text,
            Some("structured") => AccumulatorKind::Structured,
            Some(other) => {
                return Err(CapacityError::ConfigInvalid {
                    key: "accumulator",
                    reason: format!("expected `text` or `structured`, got `{}`", other),
                })
            }
        };

        Ok(Config {
            url,
            xpath,
            blob_connection_string,
            blob_container_name,
            current_blob: optional("currentBlob"),
            last_update_day: optional("lastUpdateDay"),
            snippet_marker: optional("snippetMarker").unwrap_or_else(|| DEFAULT_MARKER.into()),
            data_variable: optional("dataVariable")
                .unwrap_or_else(|| DEFAULT_DATA_VARIABLE.into()),
            utc_offset,
            fetch_timeout: seconds(optional("fetchTimeoutSecs"), "fetchTimeoutSecs")?,
            blob_timeout: seconds(optional("blobTimeoutSecs"), "blobTimeoutSecs")?,
            state_blob: optional("stateBlob").unwrap_or_else(|| DEFAULT_STATE_BLOB.into()),
            accumulator,
        })
    }
}

fn seconds(value: Option<String>, key: &'static str) -> Result<Duration, CapacityError> {
    match value {
        None => Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        Some(v) => match v.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(CapacityError::ConfigInvalid {
                key,
                reason: format!("expected a positive number of seconds, got `{}`", v),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("url", "https://example.com/capacity"),
        ("xpath", "/html[1]/body[1]/script[2]"),
        ("BlobConnectionString", "sqlite:capacity.sqlite3"),
        ("BlobContainerName", "capacity"),
    ];

    #[test]
    fn defaults_are_applied() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.url, "https://example.com/capacity");
        assert_eq!(config.snippet_marker, "function");
        assert_eq!(config.data_variable, "data");
        assert_eq!(config.utc_offset, FixedOffset::east_opt(0).unwrap());
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
        assert_eq!(config.state_blob, "rotation-state.json");
        assert_eq!(config.accumulator, AccumulatorKind::Text);
        assert_eq!(config.current_blob, None);
        assert_eq!(config.last_update_day, None);
    }

    #[test]
    fn missing_key_is_named() {
        for (missing, _) in REQUIRED {
            let pairs: Vec<_> = REQUIRED
                .iter()
                .copied()
                .filter(|(k, _)| *k != missing)
                .collect();
            let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
            assert!(matches!(err, CapacityError::ConfigMissing(k) if k == missing));
        }
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let mut pairs = REQUIRED.to_vec();
        pairs[0] = ("url", "  ");
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, CapacityError::ConfigMissing("url")));
    }

    #[test]
    fn optional_values_are_read() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("currentBlob", "10-11-2026.json"),
            ("lastUpdateDay", "Saturday"),
            ("utcOffset", "+07:00"),
            ("blobTimeoutSecs", "5"),
            ("accumulator", "structured"),
        ]);
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.current_blob.as_deref(), Some("10-11-2026.json"));
        assert_eq!(config.last_update_day.as_deref(), Some("Saturday"));
        assert_eq!(config.utc_offset, FixedOffset::east_opt(7 * 3600).unwrap());
        assert_eq!(config.blob_timeout, Duration::from_secs(5));
        assert_eq!(config.accumulator, AccumulatorKind::Structured);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("fetchTimeoutSecs", "0"));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(
            err,
            CapacityError::ConfigInvalid {
                key: "fetchTimeoutSecs",
                ..
            }
        ));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("utcOffset", "CET"));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(
            err,
            CapacityError::ConfigInvalid {
                key: "utcOffset",
                ..
            }
        ));
    }
}
