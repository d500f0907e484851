//! Order normalization.
//!
//! Merges the upcoming and delivered feeds into one list of orders with
//! resolved delivery windows. Upcoming orders are processed first, so when
//! an id appears in both feeds the upcoming version wins.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::datetime::parse_vendor_datetime;
use crate::models::{LastOrder, NextOrderWindow, NormalizedOrder, RawOrder};

/// Orders left out of a normalization pass, by reason. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    pub missing_id: usize,
    pub missing_slot: usize,
    pub unparseable_slot: usize,
    pub empty_window: usize,
    pub duplicate: usize,
}

impl SkipCounts {
    pub fn total(&self) -> usize {
        self.missing_id + self.missing_slot + self.unparseable_slot + self.empty_window + self.duplicate
    }
}

/// Output of [`normalize_orders`].
#[derive(Debug, Clone, Default)]
pub struct NormalizedOrders {
    /// Sorted ascending by `start`
    pub orders: Vec<NormalizedOrder>,
    pub skipped: SkipCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    MissingSlot,
    UnparseableSlot,
    EmptyWindow,
}

/// Normalize both order feeds into one deduplicated, start-sorted list.
///
/// The sort is stable, so orders sharing a start keep feed order.
pub fn normalize_orders(upcoming: &[Value], delivered: &[Value]) -> NormalizedOrders {
    let mut seen: HashSet<String> = HashSet::new();
    let mut result = NormalizedOrders::default();

    for value in upcoming.iter().chain(delivered.iter()) {
        let order = RawOrder::new(value);
        let Some(id) = order.id() else {
            result.skipped.missing_id += 1;
            continue;
        };

        if seen.contains(&id) {
            debug!("Ignoring repeated order {}", id);
            result.skipped.duplicate += 1;
            continue;
        }

        match normalize_order(id, order) {
            Ok(normalized) => {
                seen.insert(normalized.id.clone());
                result.orders.push(normalized);
            }
            Err((id, reason)) => {
                debug!("Skipping order {}: {:?}", id, reason);
                match reason {
                    SkipReason::MissingSlot => result.skipped.missing_slot += 1,
                    SkipReason::UnparseableSlot => result.skipped.unparseable_slot += 1,
                    SkipReason::EmptyWindow => result.skipped.empty_window += 1,
                }
            }
        }
    }

    result.orders.sort_by_key(|o| o.start);

    if result.skipped.total() > 0 {
        debug!(
            "Normalized {} orders, skipped {:?}",
            result.orders.len(),
            result.skipped
        );
    }

    result
}

fn normalize_order(id: String, order: RawOrder<'_>) -> Result<NormalizedOrder, (String, SkipReason)> {
    let Some(slot) = order.delivery_slot() else {
        return Err((id, SkipReason::MissingSlot));
    };
    if slot.since().is_none() || slot.till().is_none() {
        return Err((id, SkipReason::MissingSlot));
    }

    let (Some(start), Some(end)) = (
        parse_vendor_datetime(slot.since()),
        parse_vendor_datetime(slot.till()),
    ) else {
        return Err((id, SkipReason::UnparseableSlot));
    };

    if start >= end {
        return Err((id, SkipReason::EmptyWindow));
    }

    Ok(NormalizedOrder {
        id,
        start,
        end,
        status: order.status().map(str::to_string),
        items_count: order.items_count(),
        price: order.total_amount(),
    })
}

/// The upcoming order whose slot starts first.
///
/// Orders without a parseable `since` are ignored; ties keep the first seen.
pub fn earliest_upcoming_order(upcoming: &[Value]) -> Option<NextOrderWindow> {
    let mut earliest: Option<NextOrderWindow> = None;

    for value in upcoming {
        let order = RawOrder::new(value);
        let Some(slot) = order.delivery_slot() else {
            continue;
        };
        let Some(since) = parse_vendor_datetime(slot.since()) else {
            continue;
        };

        if earliest.as_ref().map_or(true, |e| since < e.since) {
            earliest = Some(NextOrderWindow {
                order_id: order.id(),
                since,
                till: parse_vendor_datetime(slot.till()),
            });
        }
    }

    earliest
}

/// Summary of the first entry in the `last_order` feed.
pub fn last_order(orders: &[Value]) -> Option<LastOrder> {
    let order = RawOrder::new(orders.first()?);
    Some(LastOrder {
        order_time: parse_vendor_datetime(order.order_time()),
        items_count: order.items_count(),
        price: order.total_amount(),
    })
}
