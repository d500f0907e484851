//! Delivery announcements and preselected delivery slots.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// The first delivery announcement, cleaned up for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryInfo {
    /// Announcement text with markup removed
    pub content: String,

    /// Secondary text with markup removed
    pub additional_content: Option<String>,

    /// Order the announcement refers to
    pub order_id: Option<String>,

    pub updated_at: Option<DateTime<FixedOffset>>,

    pub title: Option<String>,

    /// Delivery time extracted from the announcement text
    pub eta: Option<DateTime<FixedOffset>>,
}

/// Kind of preselected slot offered by the vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Express,
    Standard,
    Eco,
}

impl SlotKind {
    pub const ALL: [SlotKind; 3] = [SlotKind::Express, SlotKind::Standard, SlotKind::Eco];

    /// Value of the `type` field used by the vendor API.
    pub fn vendor_type(&self) -> &'static str {
        match self {
            SlotKind::Express => "EXPRESS",
            SlotKind::Standard => "FIRST",
            SlotKind::Eco => "ECO",
        }
    }
}

/// First available slot of a given kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreselectedSlot {
    pub kind: SlotKind,
    pub since: DateTime<FixedOffset>,
    pub till: Option<DateTime<FixedOffset>>,
    pub free_capacity_percent: Option<i64>,
    pub capacity_message: Option<String>,
    pub price: Option<f64>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
}
