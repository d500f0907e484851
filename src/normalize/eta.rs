//! Delivery ETA extraction from announcement text.
//!
//! Announcements are short HTML snippets such as
//! `Doručíme za <span style="color:#e30613">5</span> minut`. The meaningful
//! number, date or time is wrapped in a coloured span, so the structured
//! heuristics look for that span. In order:
//!
//! 1. "in N minutes" phrasing with an emphasized number: now + N minutes
//! 2. emphasized `D.M.` date and `HH:MM` time: that moment in the current year
//! 3. emphasized `HH:MM` time: today, or tomorrow if already past
//! 4. any bare `HH:MM` in the plain text, same rollover as 3
//!
//! The bare-time fallback can pick up unrelated digits that happen to look
//! like a time; callers should treat the result as a hint.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::text::{strip_tags, unescape_unicode};

lazy_static! {
    static ref MINUTES_PHRASE_RE: Regex =
        Regex::new(r"(?i)(přibližně za|za)\s*.*\s*(minut|minuty|min)").unwrap();
    static ref EMPHASIZED_NUMBER_RE: Regex =
        Regex::new(r"<span[^>]*color:[^>]*>([0-9]+)</span>").unwrap();
    static ref EMPHASIZED_DATE_RE: Regex =
        Regex::new(r"<span[^>]*color:[^>]*>([0-9]{1,2}\.[0-9]{1,2}\.)</span>").unwrap();
    static ref EMPHASIZED_TIME_RE: Regex =
        Regex::new(r"<span[^>]*color:[^>]*>([0-9]{1,2}:[0-9]{2})</span>").unwrap();
    static ref BARE_TIME_RE: Regex = Regex::new(r"\b([0-9]{1,2}:[0-9]{2})\b").unwrap();
}

/// Which heuristic produced an ETA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EtaSource {
    RelativeMinutes,
    DateAndTime,
    TimeOnly,
    BareTime,
}

/// An extracted delivery time.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryEta {
    pub at: DateTime<Tz>,
    pub source: EtaSource,
}

/// Extracts delivery times in a fixed reference timezone.
#[derive(Debug, Clone, Copy)]
pub struct EtaExtractor {
    tz: Tz,
}

impl Default for EtaExtractor {
    fn default() -> Self {
        Self::new(chrono_tz::Europe::Prague)
    }
}

impl EtaExtractor {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Extract relative to the current wall clock.
    pub fn extract(&self, text: &str) -> Option<DeliveryEta> {
        self.extract_at(text, Utc::now().with_timezone(&self.tz))
    }

    /// Extract relative to `now`.
    pub fn extract_at(&self, text: &str, now: DateTime<Tz>) -> Option<DeliveryEta> {
        let now = now.with_timezone(&self.tz);
        let clean = unescape_unicode(text);
        let plain = strip_tags(&clean);

        if MINUTES_PHRASE_RE.is_match(&plain) {
            let at = first_capture(&EMPHASIZED_NUMBER_RE, &clean)
                .and_then(|m| m.parse::<i64>().ok())
                .and_then(Duration::try_minutes)
                .and_then(|d| now.checked_add_signed(d));
            if let Some(at) = at {
                return Some(found(at, EtaSource::RelativeMinutes));
            }
            debug!("Minutes phrase without a usable number: {:?}", plain);
        }

        let date = first_capture(&EMPHASIZED_DATE_RE, &clean);
        let time = first_capture(&EMPHASIZED_TIME_RE, &clean);

        if let (Some(date), Some(time)) = (date, time) {
            if let Some(at) = self.date_and_time(date, time, now.year()) {
                return Some(found(at, EtaSource::DateAndTime));
            }
        }

        if let Some(time) = time {
            if let Some(at) = self.next_occurrence(time, &now) {
                return Some(found(at, EtaSource::TimeOnly));
            }
        }

        if let Some(time) = first_capture(&BARE_TIME_RE, &plain) {
            if let Some(at) = self.next_occurrence(time, &now) {
                return Some(found(at, EtaSource::BareTime));
            }
        }

        None
    }

    /// `26.4.` plus `08:00`; the announcement carries no year.
    fn date_and_time(&self, date: &str, time: &str, year: i32) -> Option<DateTime<Tz>> {
        let mut parts = date.split('.').filter(|p| !p.is_empty());
        let day: u32 = parts.next()?.parse().ok()?;
        let month: u32 = parts.next()?.parse().ok()?;

        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        self.localize(date.and_time(parse_clock(time)?))
    }

    /// Today at `time`, or tomorrow if that is already in the past.
    fn next_occurrence(&self, time: &str, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let time = parse_clock(time)?;
        let today = now.date_naive();

        let candidate = self.localize(today.and_time(time))?;
        if candidate < *now {
            let tomorrow = today.succ_opt()?;
            return self.localize(tomorrow.and_time(time));
        }
        Some(candidate)
    }

    fn localize(&self, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
        self.tz.from_local_datetime(&naive).earliest()
    }
}

fn found(at: DateTime<Tz>, source: EtaSource) -> DeliveryEta {
    debug!("Delivery ETA {} via {:?}", at, source);
    DeliveryEta { at, source }
}

fn first_capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// `HH:MM` to a time of day; out-of-range values give `None`.
fn parse_clock(s: &str) -> Option<NaiveTime> {
    let (hour, minute) = s.split_once(':')?;
    NaiveTime::from_hms_opt(hour.parse().ok()?, minute.parse().ok()?, 0)
}
