use crate::{get_now, BlobStore, JobRunner, PageFetcher, ScriptEvaluator};
use chrono::NaiveTime;
use lazy_regex::regex_captures;
use std::{fmt, str::FromStr, time::Duration};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

pub const DEFAULT_EVERY_MINUTES: u64 = 15;

/// Interval for a cadence given in minutes, `None` if it does not fit.
pub fn cadence(minutes: u64) -> Option<Duration> {
    minutes.checked_mul(60).map(Duration::from_secs)
}

/// Time-of-day window, bounds inclusive. `end < start` wraps past midnight;
/// `start == end` means always.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl ActiveHours {
    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.start == self.end {
            true
        } else if self.end < self.start {
            t <= self.end || t >= self.start
        } else {
            t >= self.start && t <= self.end
        }
    }
}

impl FromStr for ActiveHours {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || format!("expected HH:MM-HH:MM, got `{}`", s);
        let (_, sh, sm, eh, em) =
            regex_captures!(r"^(\d{1,2}):(\d{2})-(\d{1,2}):(\d{2})$", s.trim()).ok_or_else(bad)?;
        let time = |h: &str, m: &str| {
            NaiveTime::from_hms_opt(h.parse().ok()?, m.parse().ok()?, 0)
        };
        Ok(ActiveHours {
            start: time(sh, sm).ok_or_else(bad)?,
            end: time(eh, em).ok_or_else(bad)?,
        })
    }
}

impl fmt::Display for ActiveHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// Runs the job on every tick, forever. The first tick fires immediately and
/// ticks missed while a run is still going are skipped.
pub async fn run_schedule<F, E, S>(
    runner: &JobRunner<F, E, S>,
    every: Duration,
    active_hours: Option<ActiveHours>,
) where
    F: PageFetcher + Sync,
    E: ScriptEvaluator + Sync,
    S: BlobStore + Sync,
{
    info!(
        "Running every {}s{}",
        every.as_secs(),
        active_hours
            .map(|w| format!(" during {}", w))
            .unwrap_or_default()
    );
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        let now = get_now(runner.config().utc_offset);
        match active_hours {
            Some(window) if !window.contains(now.time()) => {
                debug!("Outside active hours {}, skipping", window);
            }
            _ => {
                runner.run_and_log(now).await;
            }
        }
    }
}
