//! Delivery calendar reconciliation.
//!
//! Keeps one event per order id across refreshes. Upcoming orders carry a
//! delivery slot and produce events directly. Delivered orders usually
//! arrive without a slot, so the calendar remembers every slot it has seen
//! and uses that memory to keep (or rebuild after a restart) the event once
//! the order moves to the delivered feed.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::models::{describe_order, CalendarEvent, RawOrder, StoredSlot};
use crate::normalize::normalize_orders;

/// What changed during one [`DeliveryCalendar::reconcile`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub tagged_delivered: usize,
    pub reconstructed: usize,
    pub total: usize,
}

/// Calendar of delivery windows keyed by order id.
#[derive(Debug, Clone)]
pub struct DeliveryCalendar {
    currency: String,
    events_by_order_id: BTreeMap<String, CalendarEvent>,
    slot_memory: BTreeMap<String, StoredSlot>,
    /// Sorted view over `events_by_order_id`, rebuilt on every reconcile
    events: Vec<CalendarEvent>,
}

impl Default for DeliveryCalendar {
    fn default() -> Self {
        Self::new("CZK")
    }
}

impl DeliveryCalendar {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            events_by_order_id: BTreeMap::new(),
            slot_memory: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// Merge remembered slots from durable storage. Call before the first
    /// reconcile; entries for the same order id are overwritten.
    pub fn restore_slot_memory(&mut self, slots: BTreeMap<String, StoredSlot>) {
        if slots.is_empty() {
            return;
        }
        debug!("Restored {} stored delivery slots", slots.len());
        self.slot_memory.extend(slots);
    }

    /// Slot memory for persistence.
    pub fn stored_delivery_slots(&self) -> &BTreeMap<String, StoredSlot> {
        &self.slot_memory
    }

    /// All events, ascending by start.
    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    /// Fold fresh order feeds into the calendar.
    pub fn reconcile(&mut self, upcoming: &[Value], delivered: &[Value]) -> ReconcileSummary {
        debug!(
            "Updating calendar events - upcoming: {}, delivered: {}",
            upcoming.len(),
            delivered.len()
        );

        let upcoming_ids = order_ids(upcoming);
        let delivered_ids = order_ids(delivered);
        let mut summary = ReconcileSummary::default();

        // Orders gone from both feeds lose their event and their slot.
        let before = self.events_by_order_id.len();
        self.events_by_order_id
            .retain(|id, _| upcoming_ids.contains(id) || delivered_ids.contains(id));
        summary.removed = before - self.events_by_order_id.len();
        self.slot_memory
            .retain(|id, _| upcoming_ids.contains(id) || delivered_ids.contains(id));

        // Delivered orders never source new events directly.
        let normalized = normalize_orders(upcoming, &[]);
        for order in &normalized.orders {
            self.slot_memory
                .insert(order.id.clone(), StoredSlot::from_order(order));

            let event = CalendarEvent::for_order(order, &self.currency);
            match self.events_by_order_id.insert(order.id.clone(), event) {
                Some(_) => summary.updated += 1,
                None => {
                    debug!(
                        "Created calendar event for order {}: {} to {}",
                        order.id, order.start, order.end
                    );
                    summary.created += 1;
                }
            }
        }

        for value in delivered {
            let order = RawOrder::new(value);
            let Some(id) = order.id() else {
                continue;
            };

            if let Some(event) = self.events_by_order_id.get_mut(&id) {
                if !upcoming_ids.contains(&id) && event.mark_delivered() {
                    debug!("Tagged order {} as delivered", id);
                    summary.tagged_delivered += 1;
                }
                continue;
            }

            let Some(slot) = self.slot_memory.get(&id) else {
                continue;
            };
            let Some((start, end)) = slot.bounds() else {
                warn!("Stored delivery slot for order {} is unreadable", id);
                continue;
            };

            let description = describe_order(
                order.status(),
                order.items_count(),
                order.total_amount(),
                &self.currency,
            );
            debug!(
                "Recreated calendar event for delivered order {} from stored slot: {} to {}",
                id, start, end
            );
            self.events_by_order_id
                .insert(id.clone(), CalendarEvent::delivered(&id, start, end, description));
            summary.reconstructed += 1;
        }

        self.rebuild_events();
        summary.total = self.events.len();

        info!("Calendar updated with {} events", summary.total);
        summary
    }

    pub fn event(&self, order_id: &str) -> Option<&CalendarEvent> {
        self.events_by_order_id.get(order_id)
    }

    /// The event in progress at `now`, else the next one to start.
    pub fn current_or_next_event(&self, now: DateTime<Utc>) -> Option<&CalendarEvent> {
        self.events
            .iter()
            .find(|e| e.is_active_at(now))
            .or_else(|| {
                self.events
                    .iter()
                    .find(|e| e.start.with_timezone(&Utc) > now)
            })
    }

    /// Events intersecting `[range_start, range_end)`, ascending by start.
    pub fn events_in_range(
        &self,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Vec<&CalendarEvent> {
        self.events
            .iter()
            .filter(|e| e.overlaps(range_start, range_end))
            .collect()
    }

    fn rebuild_events(&mut self) {
        self.events = self.events_by_order_id.values().cloned().collect();
        // BTreeMap iteration is id-ordered, so ties on start stay deterministic
        self.events.sort_by_key(|e| e.start);
    }
}

fn order_ids(orders: &[Value]) -> HashSet<String> {
    orders.iter().filter_map(|o| RawOrder::new(o).id()).collect()
}
