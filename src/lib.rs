//! # Rohlik Agent
//!
//! A local tracker for a Rohlik grocery-delivery account.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (orders, calendar events, delivery info)
//! - **normalize**: Vendor payload parsing (datetimes, order feeds, delivery ETA)
//! - **calendar**: Delivery calendar reconciliation
//! - **spend**: Monthly spend accumulation
//! - **hub**: Account data owner and update fan-out
//! - **fetch**: Account data sources (file, HTTP)
//! - **sync**: Periodic polling
//! - **storage**: Persisted state between runs
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calendar;
pub mod config;
pub mod fetch;
pub mod hub;
pub mod models;
pub mod normalize;
pub mod spend;
pub mod storage;
pub mod sync;

pub use models::*;

use std::time::Duration;

/// Parse a poll interval such as "10m", "1h", "90s" or "1d".
///
/// A bare number is taken as seconds. Returns `None` for anything else,
/// including values that overflow.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    if digits.is_empty() {
        return None;
    }

    let seconds_per_unit: u64 = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86_400,
        _ => return None,
    };

    let count: u64 = digits.parse().ok()?;
    count.checked_mul(seconds_per_unit).map(Duration::from_secs)
}
