//! Monthly spend accumulation.
//!
//! Sums the final price of delivered orders placed in the current calendar
//! month (in the reference timezone). Each order id is counted at most once;
//! the running state resets when the month changes.

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::models::{MonthlySpendState, RawOrder};

/// What one [`MonthlySpend::refresh_at`] call did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendRefresh {
    pub month_key: String,
    pub reset: bool,
    pub counted: usize,
    pub added: f64,
    pub total: f64,
}

/// Read-side view of the monthly spend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendSnapshot {
    pub month: Option<String>,
    pub total: f64,
    pub processed_orders: usize,
    pub last_reset: Option<DateTime<FixedOffset>>,
}

/// Running total of the current month's delivered orders.
#[derive(Debug, Clone)]
pub struct MonthlySpend {
    tz: Tz,
    state: MonthlySpendState,
}

impl MonthlySpend {
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            state: MonthlySpendState::default(),
        }
    }

    /// Replace the in-memory state with a persisted one. Call before the
    /// first refresh.
    pub fn restore(&mut self, state: MonthlySpendState) {
        debug!(
            "Restored monthly spend {} for {:?} ({} orders)",
            state.total,
            state.month_key,
            state.processed_order_ids.len()
        );
        self.state = state;
    }

    pub fn state(&self) -> &MonthlySpendState {
        &self.state
    }

    /// Current total, floored at zero.
    pub fn total(&self) -> f64 {
        self.state.total.max(0.0)
    }

    pub fn snapshot(&self) -> SpendSnapshot {
        SpendSnapshot {
            month: self.state.month_key.clone(),
            total: self.total(),
            processed_orders: self.state.processed_order_ids.len(),
            last_reset: self.state.last_reset,
        }
    }

    /// `YYYY-MM` for `now` in the reference timezone.
    pub fn month_key(&self, now: DateTime<Utc>) -> String {
        now.with_timezone(&self.tz).format("%Y-%m").to_string()
    }

    pub fn refresh(&mut self, delivered: &[Value]) -> SpendRefresh {
        self.refresh_at(delivered, Utc::now())
    }

    /// Fold the delivered feed into the running total as of `now`.
    pub fn refresh_at(&mut self, delivered: &[Value], now: DateTime<Utc>) -> SpendRefresh {
        let month_key = self.month_key(now);
        let reset = self.state.month_key.as_deref() != Some(month_key.as_str());

        if reset {
            info!(
                "Starting monthly spend for {} (was {:?})",
                month_key, self.state.month_key
            );
            self.state = MonthlySpendState {
                total: 0.0,
                processed_order_ids: Default::default(),
                month_key: Some(month_key.clone()),
                last_reset: Some(now.with_timezone(&self.tz).fixed_offset()),
            };
        }

        // orderTime is matched as text, not parsed
        let pattern = format!("{}-", month_key);
        let mut counted = 0;
        let mut added = 0.0;

        for value in delivered {
            let order = RawOrder::new(value);
            if !order.order_time().is_some_and(|t| t.contains(&pattern)) {
                continue;
            }
            let Some(id) = order.id() else {
                debug!("Skipping delivered order without id");
                continue;
            };
            if self.state.processed_order_ids.contains(&id) {
                continue;
            }
            let Some(amount) = order.total_amount() else {
                debug!("Order {} has no final amount yet", id);
                continue;
            };

            self.state.total += amount;
            self.state.processed_order_ids.insert(id);
            counted += 1;
            added += amount;
        }

        if counted > 0 {
            info!(
                "Added {} orders ({:.2}) to {} spend, total {:.2}",
                counted,
                added,
                month_key,
                self.total()
            );
        }

        SpendRefresh {
            month_key,
            reset,
            counted,
            added,
            total: self.total(),
        }
    }
}
