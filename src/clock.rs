//! Time context in the assistant's reference timezone.
//!
//! Every timestamp the assistant stores or shows is anchored to one configured
//! IANA timezone, so "tomorrow" means the same thing in the prompt, in stored
//! task text, and in entry metadata.

use anyhow::{anyhow, bail, Result};
use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday,
};
use chrono_tz::Tz;
use serde::Serialize;
use std::str::FromStr;

/// Formatted time information handed to the model and stamped into stored
/// entries.
#[derive(Debug, Clone, Serialize)]
pub struct TimeContext {
    /// RFC 3339 timestamp with the reference-timezone offset.
    pub rfc3339: String,
    /// Long human form, e.g. `"Monday, April 29, 2024 at 03:12 PM (America/Montreal)"`.
    pub formatted: String,
    pub day_of_week: String,
    pub date: String,
    pub time: String,
    pub timezone: String,
}

/// Clock pinned to the configured reference timezone.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    tz: Tz,
}

impl Clock {
    pub fn new(timezone: &str) -> Result<Self> {
        let tz = timezone
            .parse::<Tz>()
            .map_err(|_| anyhow!("unknown timezone: {timezone}"))?;
        Ok(Self { tz })
    }

    pub fn timezone_name(&self) -> &'static str {
        self.tz.name()
    }

    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }

    /// Time context for the current instant.
    pub fn context(&self) -> TimeContext {
        self.context_for(self.now())
    }

    /// Time context for an arbitrary instant, rendered in the reference timezone.
    pub fn context_for(&self, instant: DateTime<Tz>) -> TimeContext {
        TimeContext {
            rfc3339: instant.to_rfc3339(),
            formatted: format!(
                "{} ({})",
                instant.format("%A, %B %d, %Y at %I:%M %p"),
                self.tz.name()
            ),
            day_of_week: instant.format("%A").to_string(),
            date: instant.format("%B %d, %Y").to_string(),
            time: instant.format("%I:%M %p").to_string(),
            timezone: self.tz.name().to_string(),
        }
    }

    /// Parse a date expression into an instant in the reference timezone.
    ///
    /// Accepts RFC 3339, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]`, the relative
    /// words `now`/`today`/`tomorrow`/`yesterday`, and bare weekday names
    /// (resolved to the next occurrence).
    pub fn parse(&self, input: &str) -> Result<DateTime<Tz>> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            bail!("empty date input");
        }

        match trimmed.to_lowercase().as_str() {
            "now" | "today" => return Ok(self.now()),
            "tomorrow" => return Ok(self.now() + Duration::days(1)),
            "yesterday" => return Ok(self.now() - Duration::days(1)),
            other => {
                if let Ok(weekday) = Weekday::from_str(other) {
                    return Ok(self.next_weekday(weekday));
                }
            }
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(dt.with_timezone(&self.tz));
        }
        for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
                return self.resolve_local(naive);
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            let naive = date
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| anyhow!("invalid date: {trimmed}"))?;
            return self.resolve_local(naive);
        }

        bail!("could not parse date input: {trimmed}")
    }

    /// Next occurrence of `weekday`, strictly after today, at midnight.
    fn next_weekday(&self, weekday: Weekday) -> DateTime<Tz> {
        let today = self.now().date_naive();
        let mut ahead = (weekday.num_days_from_monday() as i64
            - today.weekday().num_days_from_monday() as i64)
            .rem_euclid(7);
        if ahead == 0 {
            ahead = 7;
        }
        let date = today + Duration::days(ahead);
        date.and_hms_opt(0, 0, 0)
            .and_then(|naive| self.tz.from_local_datetime(&naive).earliest())
            .unwrap_or_else(|| self.now() + Duration::days(ahead))
    }

    fn resolve_local(&self, naive: NaiveDateTime) -> Result<DateTime<Tz>> {
        self.tz
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| anyhow!("time does not exist in {}: {naive}", self.tz.name()))
    }
}
