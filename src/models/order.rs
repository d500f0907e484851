//! Vendor order shapes.
//!
//! Orders arrive as loosely typed JSON whose schema the vendor does not
//! guarantee. `RawOrder` borrows a `serde_json::Value` and exposes tolerant
//! accessors: anything missing or of the wrong type reads as `None`.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Borrowed view over one vendor order object.
#[derive(Debug, Clone, Copy)]
pub struct RawOrder<'a>(&'a Value);

impl<'a> RawOrder<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self(value)
    }

    /// Order id rendered as a string.
    ///
    /// Null, `0` and `""` count as missing, matching how the vendor marks
    /// placeholder entries.
    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
            _ => None,
        }
    }

    /// The `deliverySlot` object, if present.
    pub fn delivery_slot(&self) -> Option<RawSlot<'a>> {
        let slot = self.0.get("deliverySlot")?;
        slot.is_object().then_some(RawSlot(slot))
    }

    pub fn status(&self) -> Option<&'a str> {
        self.0
            .get("status")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn items_count(&self) -> Option<i64> {
        self.0.get("itemsCount").and_then(Value::as_i64)
    }

    /// `orderTime` as sent by the vendor (not parsed).
    pub fn order_time(&self) -> Option<&'a str> {
        self.0.get("orderTime").and_then(Value::as_str)
    }

    /// Final price from `priceComposition.total.amount`.
    ///
    /// Accepts JSON numbers and numeric strings; non-finite values are rejected.
    pub fn total_amount(&self) -> Option<f64> {
        let amount = self.0.pointer("/priceComposition/total/amount")?;
        let value = match amount {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        value.is_finite().then_some(value)
    }
}

/// Borrowed view over an order's `deliverySlot`.
#[derive(Debug, Clone, Copy)]
pub struct RawSlot<'a>(&'a Value);

impl<'a> RawSlot<'a> {
    pub fn since(&self) -> Option<&'a str> {
        self.0.get("since").and_then(Value::as_str)
    }

    pub fn till(&self) -> Option<&'a str> {
        self.0.get("till").and_then(Value::as_str)
    }
}

/// An order with a resolved delivery window.
///
/// Only constructed when both slot bounds parse and `start < end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedOrder {
    pub id: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub status: Option<String>,
    pub items_count: Option<i64>,
    pub price: Option<f64>,
}

/// The next delivery window, taken from the earliest upcoming order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextOrderWindow {
    pub order_id: Option<String>,
    pub since: DateTime<FixedOffset>,
    pub till: Option<DateTime<FixedOffset>>,
}

/// Summary of the most recently placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastOrder {
    pub order_time: Option<DateTime<FixedOffset>>,
    pub items_count: Option<i64>,
    pub price: Option<f64>,
}
