//! Account-level details: the user profile, premium membership, reusable
//! bags, first available delivery and the cart.

use serde::{Deserialize, Serialize};

/// Identity and credit balance of the logged-in user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub credits: Option<f64>,
}

/// Premium membership and its monthly perks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PremiumInfo {
    pub active: bool,
    pub remaining_days: Option<i64>,
    pub membership_type: Option<String>,
    pub recurrent_payment_date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,

    /// Orders left this period without the minimum order value
    pub no_limit_orders_remaining: i64,

    /// Express deliveries left this period at no charge
    pub free_express_remaining: i64,
}

/// Reusable bags held by the customer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReusableBags {
    pub current: i64,
    pub max: i64,
    pub deposit_amount: Option<f64>,
    pub deposit_currency: Option<String>,
}

/// Earliest delivery the vendor currently offers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstDelivery {
    pub text: String,
    pub location: Option<String>,
    pub delivery_type: Option<String>,
}

/// Current shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartInfo {
    pub total_price: f64,
    pub total_items: i64,
    pub can_make_order: bool,
}

/// Everything account-level, each part absent when its payload is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountOverview {
    pub profile: Option<AccountProfile>,
    pub premium: Option<PremiumInfo>,
    pub bags: Option<ReusableBags>,
    pub first_delivery: Option<FirstDelivery>,
    pub cart: Option<CartInfo>,
}
