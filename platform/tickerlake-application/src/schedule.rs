use chrono::{DateTime, Duration, NaiveTime, Utc};
use std::fmt;

/// A recurring once-a-day trigger at a fixed wall-clock time (UTC).
///
/// The schedule itself is pure: `next_run_after` computes the next trigger
/// instant from an arbitrary reference point, so tests can exercise the
/// firing rules without waiting on a real clock. The polling loop that
/// drives it lives with the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    time: NaiveTime,
}

impl DailySchedule {
    pub fn new(hour: u32, minute: u32) -> Result<Self, String> {
        let time = NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or_else(|| format!("invalid schedule time {hour:02}:{minute:02}"))?;
        Ok(Self { time })
    }

    /// Parse an "HH:MM" wall-clock time.
    pub fn parse(value: &str) -> Result<Self, String> {
        let time = NaiveTime::parse_from_str(value.trim(), "%H:%M")
            .map_err(|err| format!("invalid schedule time {value:?} (expected HH:MM): {err}"))?;
        Ok(Self { time })
    }

    /// The next trigger strictly after `from`: today's HH:MM if that is
    /// still ahead, otherwise the same time tomorrow. A trigger that falls
    /// while the process is not running is skipped, never queued.
    pub fn next_run_after(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        let candidate = from.date_naive().and_time(self.time).and_utc();
        if candidate > from {
            candidate
        } else {
            candidate + Duration::days(1)
        }
    }
}

impl fmt::Display for DailySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.time.format("%H:%M"))
    }
}
