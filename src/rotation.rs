use crate::{BlobIoError, BlobStore, Config};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const DEFAULT_BLOB_NAME: &str = "data.json";

/// Rotate exactly on the first Sunday run after a Saturday run.
///
/// A missing `last_update_day` counts as today, so uninitialized state never
/// rotates. An unparsable one is logged and treated as "no rotation".
pub fn should_rotate(today: Weekday, last_update_day: Option<&str>) -> bool {
    let last = match last_update_day {
        None => today,
        Some(day) => match day.trim().parse::<Weekday>() {
            Ok(day) => day,
            Err(_) => {
                warn!("Unrecognized last update day `{}`, not rotating", day);
                return false;
            }
        },
    };
    today == Weekday::Sun && last == Weekday::Sat
}

pub fn rotated_blob_name(today: NaiveDate) -> String {
    today.format("%m-%d-%Y.json").to_string()
}

pub fn resolve_target_name(rotate: bool, previous: Option<&str>, today: NaiveDate) -> String {
    if rotate {
        rotated_blob_name(today)
    } else {
        previous.unwrap_or(DEFAULT_BLOB_NAME).to_string()
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Which document is being written and when the job last wrote one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationState {
    pub current_blob: Option<String>,
    pub last_update_day: Option<String>,
}

impl RotationState {
    pub fn seeded_from(config: &Config) -> RotationState {
        RotationState {
            current_blob: config.current_blob.clone(),
            last_update_day: config.last_update_day.clone(),
        }
    }

    pub async fn load<S>(store: &S, name: &str, seed: RotationState) -> Result<Self, BlobIoError>
    where
        S: BlobStore + ?Sized + Sync,
    {
        match store.read(name).await? {
            Some(text) if !text.trim().is_empty() => match serde_json::from_str(&text) {
                Ok(state) => Ok(state),
                Err(e) => {
                    warn!(
                        "Unreadable rotation state at {} ({}), using seed {:?}",
                        name, e, seed
                    );
                    Ok(seed)
                }
            },
            _ => {
                debug!("No rotation state at {}, using seed {:?}", name, seed);
                Ok(seed)
            }
        }
    }

    pub async fn save<S>(&self, store: &S, name: &str) -> Result<(), BlobIoError>
    where
        S: BlobStore + ?Sized + Sync,
    {
        store.write(name, &serde_json::to_string(self)?).await
    }
}

/// The document this invocation appends to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub rotated: bool,
}

/// Picks the target for `today`. On rotation, the new pointer is persisted
/// and the new document created empty before returning.
pub async fn resolve_target<S>(
    store: &S,
    state: &mut RotationState,
    state_blob: &str,
    today: NaiveDate,
) -> Result<Target, BlobIoError>
where
    S: BlobStore + ?Sized + Sync,
{
    let rotate = should_rotate(today.weekday(), state.last_update_day.as_deref());
    let name = resolve_target_name(rotate, state.current_blob.as_deref(), today);

    if rotate {
        info!("Rotating to {}", name);
        state.current_blob = Some(name.clone());
        state.save(store, state_blob).await?;
        if store.create_if_missing(&name).await? {
            debug!("Created {}", name);
        }
    }

    Ok(Target {
        name,
        rotated: rotate,
    })
}
