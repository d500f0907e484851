//! Delivery calendar records.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use super::NormalizedOrder;

/// Summary prefix for orders that have been delivered.
pub const DELIVERED_PREFIX: &str = "[Delivered] ";

/// One delivery window shown on the calendar, keyed by order id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub order_id: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub summary: String,
    pub description: Option<String>,
}

impl CalendarEvent {
    /// Build the event for an upcoming order.
    pub fn for_order(order: &NormalizedOrder, currency: &str) -> Self {
        Self {
            order_id: order.id.clone(),
            start: order.start,
            end: order.end,
            summary: format!("Order {}", order.id),
            description: describe_order(
                order.status.as_deref(),
                order.items_count,
                order.price,
                currency,
            ),
        }
    }

    /// Build the event for a delivered order from its remembered slot.
    pub fn delivered(
        order_id: &str,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
        description: Option<String>,
    ) -> Self {
        Self {
            order_id: order_id.to_string(),
            start,
            end,
            summary: format!("{}Order {}", DELIVERED_PREFIX, order_id),
            description,
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.summary.starts_with(DELIVERED_PREFIX.trim_end())
    }

    /// Prefix the summary with the delivered tag. Returns `false` if it was
    /// already tagged.
    pub fn mark_delivered(&mut self) -> bool {
        if self.is_delivered() {
            return false;
        }
        self.summary = format!("{}{}", DELIVERED_PREFIX, self.summary);
        true
    }

    /// `start <= at < end`
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.start.with_timezone(&Utc) <= at && at < self.end.with_timezone(&Utc)
    }

    /// Half-open interval intersection with `[range_start, range_end)`.
    pub fn overlaps(&self, range_start: DateTime<Utc>, range_end: DateTime<Utc>) -> bool {
        self.end.with_timezone(&Utc) > range_start && self.start.with_timezone(&Utc) < range_end
    }
}

/// Description lines for the fields that are present, or `None` if none are.
pub fn describe_order(
    status: Option<&str>,
    items_count: Option<i64>,
    price: Option<f64>,
    currency: &str,
) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(status) = status.filter(|s| !s.is_empty()) {
        parts.push(format!("Status: {}", status));
    }
    if let Some(items) = items_count {
        parts.push(format!("Items: {}", items));
    }
    if let Some(price) = price {
        parts.push(format!("Price: {} {}", format_price(price), currency));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

/// Whole amounts keep one decimal place (`640.0`), others print as-is.
fn format_price(price: f64) -> String {
    if price.is_finite() && price.fract() == 0.0 {
        format!("{:.1}", price)
    } else {
        price.to_string()
    }
}

/// A remembered delivery slot, stored as RFC 3339 strings so it survives
/// restarts unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSlot {
    pub start: String,
    pub end: String,
}

impl StoredSlot {
    pub fn from_order(order: &NormalizedOrder) -> Self {
        Self {
            start: order.start.to_rfc3339(),
            end: order.end.to_rfc3339(),
        }
    }

    /// Parse both bounds back; `None` if either is corrupt.
    pub fn bounds(&self) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
        let start = DateTime::parse_from_rfc3339(&self.start).ok()?;
        let end = DateTime::parse_from_rfc3339(&self.end).ok()?;
        Some((start, end))
    }
}
