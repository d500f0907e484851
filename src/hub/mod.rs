//! Account hub.
//!
//! Owns the latest account data document and every piece of state derived
//! from it. Each update runs calendar reconciliation and the spend refresh,
//! then notifies registered observers. Callers that share a hub across
//! tasks wrap it in a lock; the hub itself never blocks.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::calendar::{DeliveryCalendar, ReconcileSummary};
use crate::config::{AppConfig, ConfigError};
use crate::models::{
    AccountOverview, CalendarEvent, DeliveryInfo, LastOrder, NextOrderWindow, PreselectedSlot,
    SlotKind,
};
use crate::normalize::{
    account_profile, cart_info, delivery_info, earliest_upcoming_order, first_delivery, last_order,
    premium_info, preselected_slot, reusable_bags, unwrap_feed, EtaExtractor, ResponseEnvelope,
};
use crate::spend::{MonthlySpend, SpendRefresh, SpendSnapshot};
use crate::storage::PersistedState;

/// A hub shared between the poller and the API.
pub type SharedHub = Arc<tokio::sync::RwLock<AccountHub>>;

/// Keys of the account data document.
pub mod keys {
    pub const NEXT_ORDER: &str = "next_order";
    pub const DELIVERED_ORDERS: &str = "delivered_orders";
    pub const DELIVERY_ANNOUNCEMENTS: &str = "delivery_announcements";
    pub const NEXT_DELIVERY_SLOT: &str = "next_delivery_slot";
    pub const LAST_ORDER: &str = "last_order";
    pub const LOGIN: &str = "login";
    pub const BAGS: &str = "bags";
    pub const DELIVERY: &str = "delivery";
    pub const CART: &str = "cart";
}

/// One poll's worth of vendor payloads, keyed by feed name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountData(Map<String, Value>);

impl AccountData {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The order list under `key`, with any response envelope removed.
    ///
    /// Silent; envelope anomalies are logged once per update instead.
    pub fn orders(&self, key: &str) -> &[Value] {
        ResponseEnvelope::classify(self.0.get(key)).items()
    }
}

impl From<Map<String, Value>> for AccountData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Receives a callback after every hub update.
pub trait AccountObserver: Send + Sync {
    fn on_update(&self, hub: &AccountHub);
}

impl<F> AccountObserver for F
where
    F: Fn(&AccountHub) + Send + Sync,
{
    fn on_update(&self, hub: &AccountHub) {
        self(hub)
    }
}

/// Handle returned by [`AccountHub::register_observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// What one [`AccountHub::apply_update`] changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateReport {
    pub calendar: ReconcileSummary,
    pub spend: SpendRefresh,
    pub observers_notified: usize,
}

/// Everything the tracker knows about the account at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub generated_at: DateTime<Utc>,
    pub last_update: Option<DateTime<Utc>>,
    pub delivery: Option<DeliveryInfo>,
    pub next_order: Option<NextOrderWindow>,
    pub current_or_next_event: Option<CalendarEvent>,
    pub preselected_slots: Vec<PreselectedSlot>,
    pub last_order: Option<LastOrder>,
    pub account: AccountOverview,
    pub monthly_spend: SpendSnapshot,
}

/// Owner of account data and its derived state.
pub struct AccountHub {
    data: AccountData,
    extractor: EtaExtractor,
    calendar: DeliveryCalendar,
    spend: MonthlySpend,
    observers: Vec<(ObserverId, Arc<dyn AccountObserver>)>,
    next_observer_id: u64,
    last_update: Option<DateTime<Utc>>,
}

impl fmt::Debug for AccountHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountHub")
            .field("timezone", &self.extractor.timezone())
            .field("events", &self.calendar.events().len())
            .field("observers", &self.observers.len())
            .field("last_update", &self.last_update)
            .finish()
    }
}

impl AccountHub {
    pub fn new(tz: Tz, currency: &str) -> Self {
        Self {
            data: AccountData::default(),
            extractor: EtaExtractor::new(tz),
            calendar: DeliveryCalendar::new(currency),
            spend: MonthlySpend::new(tz),
            observers: Vec::new(),
            next_observer_id: 0,
            last_update: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.tz()?, &config.currency))
    }

    pub fn into_shared(self) -> SharedHub {
        Arc::new(tokio::sync::RwLock::new(self))
    }

    pub fn data(&self) -> &AccountData {
        &self.data
    }

    pub fn calendar(&self) -> &DeliveryCalendar {
        &self.calendar
    }

    pub fn spend(&self) -> &MonthlySpend {
        &self.spend
    }

    pub fn extractor(&self) -> &EtaExtractor {
        &self.extractor
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    /// Apply persisted state. Call once, before the first update.
    pub fn restore(&mut self, state: PersistedState) {
        self.calendar.restore_slot_memory(state.stored_delivery_slots);
        if !state.monthly_spend.is_empty() {
            self.spend.restore(state.monthly_spend);
        }
    }

    /// Snapshot of everything that must survive a restart.
    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            stored_delivery_slots: self.calendar.stored_delivery_slots().clone(),
            monthly_spend: self.spend.state().clone(),
        }
    }

    pub fn register_observer(&mut self, observer: Arc<dyn AccountObserver>) -> ObserverId {
        let id = ObserverId(self.next_observer_id);
        self.next_observer_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Returns `false` if the observer was not registered.
    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(registered, _)| *registered != id);
        self.observers.len() != before
    }

    /// Replace the account data and recompute derived state as of `now`.
    pub fn apply_update(&mut self, data: AccountData, now: DateTime<Utc>) -> UpdateReport {
        self.data = data;
        self.last_update = Some(now);

        let upcoming = unwrap_feed(keys::NEXT_ORDER, self.data.get(keys::NEXT_ORDER));
        let delivered = unwrap_feed(keys::DELIVERED_ORDERS, self.data.get(keys::DELIVERED_ORDERS));

        let calendar = self.calendar.reconcile(upcoming, delivered);
        let spend = self.spend.refresh_at(delivered, now);

        info!(
            "Account updated: {} events, spend {:.2} for {}",
            calendar.total, spend.total, spend.month_key
        );

        let observers_notified = self.notify();
        UpdateReport {
            calendar,
            spend,
            observers_notified,
        }
    }

    /// Re-run the spend refresh against the current data, e.g. on read
    /// after a month boundary.
    pub fn refresh_spend(&mut self, now: DateTime<Utc>) -> SpendRefresh {
        let delivered = self.data.orders(keys::DELIVERED_ORDERS);
        self.spend.refresh_at(delivered, now)
    }

    pub fn delivery_info(&self, now: DateTime<Utc>) -> Option<DeliveryInfo> {
        delivery_info(
            self.data.get(keys::DELIVERY_ANNOUNCEMENTS),
            &self.extractor,
            now,
        )
    }

    pub fn next_order(&self) -> Option<NextOrderWindow> {
        earliest_upcoming_order(self.data.orders(keys::NEXT_ORDER))
    }

    pub fn preselected_slots(&self) -> Vec<PreselectedSlot> {
        let payload = self.data.get(keys::NEXT_DELIVERY_SLOT);
        SlotKind::ALL
            .into_iter()
            .filter_map(|kind| preselected_slot(payload, kind))
            .collect()
    }

    pub fn last_order(&self) -> Option<LastOrder> {
        last_order(self.data.orders(keys::LAST_ORDER))
    }

    pub fn account(&self) -> AccountOverview {
        let login = self.data.get(keys::LOGIN);
        AccountOverview {
            profile: account_profile(login),
            premium: premium_info(login),
            bags: reusable_bags(self.data.get(keys::BAGS)),
            first_delivery: first_delivery(self.data.get(keys::DELIVERY)),
            cart: cart_info(self.data.get(keys::CART)),
        }
    }

    /// Snapshot as of `now`. Runs the spend refresh first so a month
    /// boundary crossed since the last update is reflected.
    pub fn summary(&mut self, now: DateTime<Utc>) -> AccountSummary {
        self.refresh_spend(now);
        AccountSummary {
            generated_at: now,
            last_update: self.last_update,
            delivery: self.delivery_info(now),
            next_order: self.next_order(),
            current_or_next_event: self.calendar.current_or_next_event(now).cloned(),
            preselected_slots: self.preselected_slots(),
            last_order: self.last_order(),
            account: self.account(),
            monthly_spend: self.spend.snapshot(),
        }
    }

    fn notify(&self) -> usize {
        for (id, observer) in &self.observers {
            debug!("Notifying observer {:?}", id);
            observer.on_update(self);
        }
        self.observers.len()
    }
}
