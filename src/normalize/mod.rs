//! Turning raw vendor payloads into typed values.
//!
//! Everything here is pure: functions take borrowed JSON and an explicit
//! reference time, and never fail. Malformed input yields `None` or is
//! skipped.

pub mod account;
pub mod datetime;
pub mod envelope;
pub mod eta;
pub mod orders;
pub mod text;

pub use account::{
    account_profile, cart_info, delivery_info, first_delivery, premium_info, preselected_slot,
    reusable_bags,
};
pub use datetime::{parse_iso_datetime, parse_vendor_datetime};
pub use envelope::{unwrap_feed, ResponseEnvelope, WRAPPER_KEYS};
pub use eta::{DeliveryEta, EtaExtractor, EtaSource};
pub use orders::{earliest_upcoming_order, last_order, normalize_orders, NormalizedOrders, SkipCounts};
pub use text::{strip_tags, unescape_unicode};
