//! Monthly spend state.

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Running total of finalized orders for one calendar month.
///
/// Field names on the wire match the attributes the tracker has always
/// persisted, so older state files restore unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlySpendState {
    #[serde(rename = "monthly_total", default)]
    pub total: f64,

    #[serde(rename = "processed_orders", default)]
    pub processed_order_ids: BTreeSet<String>,

    /// `YYYY-MM` of the month being accumulated.
    #[serde(rename = "current_month", default)]
    pub month_key: Option<String>,

    #[serde(default)]
    pub last_reset: Option<DateTime<FixedOffset>>,
}

impl MonthlySpendState {
    pub fn is_empty(&self) -> bool {
        self.processed_order_ids.is_empty() && self.total == 0.0 && self.month_key.is_none()
    }
}
