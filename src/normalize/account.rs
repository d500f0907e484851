//! Account-level views: the current delivery announcement, the preselected
//! slots offered for the next order, and the profile, premium, bags,
//! first-delivery and cart payloads.

use chrono::{DateTime, FixedOffset, Utc};
use serde_json::Value;

use super::datetime::{parse_iso_datetime, parse_vendor_datetime};
use super::eta::EtaExtractor;
use super::text::{strip_tags, unescape_unicode};
use crate::models::{
    AccountProfile, CartInfo, DeliveryInfo, FirstDelivery, PremiumInfo, PreselectedSlot,
    ReusableBags, SlotKind,
};

/// First entry of `data.announcements`, cleaned for display.
///
/// The ETA is extracted relative to `now`.
pub fn delivery_info(
    announcements: Option<&Value>,
    extractor: &EtaExtractor,
    now: DateTime<Utc>,
) -> Option<DeliveryInfo> {
    let first = announcements?
        .pointer("/data/announcements")?
        .as_array()?
        .first()?;

    let content = first.get("content").and_then(Value::as_str).unwrap_or("");
    let eta = extractor
        .extract_at(content, now.with_timezone(&extractor.timezone()))
        .map(|eta| eta.at.fixed_offset());

    Some(DeliveryInfo {
        content: clean(content),
        additional_content: first
            .get("additionalContent")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(clean),
        order_id: id_string(first.get("id")),
        updated_at: parse_iso_datetime(first.get("updatedAt").and_then(Value::as_str)),
        title: first.get("title").and_then(Value::as_str).map(str::to_string),
        eta,
    })
}

/// First preselected slot of `kind` in the `next_delivery_slot` payload.
pub fn preselected_slot(next_delivery_slot: Option<&Value>, kind: SlotKind) -> Option<PreselectedSlot> {
    let slots = next_delivery_slot?
        .pointer("/data/preselectedSlots")?
        .as_array()?;
    let slot = slots
        .iter()
        .find(|s| s.get("type").and_then(Value::as_str) == Some(kind.vendor_type()))?;

    let since = parse_slot_bound(slot.pointer("/slot/interval/since"))?;
    let capacity = slot.pointer("/slot/timeSlotCapacityDTO");

    Some(PreselectedSlot {
        kind,
        since,
        till: parse_slot_bound(slot.pointer("/slot/interval/till")),
        free_capacity_percent: capacity
            .and_then(|c| c.get("totalFreeCapacityPercent"))
            .and_then(|p| p.as_i64().or_else(|| p.as_f64().map(|f| f as i64))),
        capacity_message: capacity
            .and_then(|c| c.get("capacityMessage"))
            .and_then(Value::as_str)
            .map(str::to_string),
        price: slot.get("price").and_then(Value::as_f64),
        title: slot.get("title").and_then(Value::as_str).map(str::to_string),
        subtitle: slot.get("subtitle").and_then(Value::as_str).map(str::to_string),
    })
}

/// Identity fields of `login.data.user`.
pub fn account_profile(login: Option<&Value>) -> Option<AccountProfile> {
    let user = login?.pointer("/data/user")?.as_object()?;
    Some(AccountProfile {
        id: id_string(user.get("id")),
        email: text(user.get("email")),
        phone: text(user.get("phone")),
        credits: number(user.get("credits")),
    })
}

/// `login.data.user.premium`, with the remaining perk counters.
pub fn premium_info(login: Option<&Value>) -> Option<PremiumInfo> {
    let premium = login?.pointer("/data/user/premium")?;
    premium.as_object()?;

    let remaining = |path: &str| {
        premium
            .pointer(path)
            .and_then(|v| integer(Some(v)))
            .unwrap_or(0)
    };

    Some(PremiumInfo {
        active: premium.get("active").and_then(Value::as_bool).unwrap_or(false),
        remaining_days: integer(premium.get("remainingDays")),
        membership_type: text(premium.get("premiumMembershipType")),
        recurrent_payment_date: text(premium.get("recurrentPaymentDate")),
        start_date: text(premium.get("startDate")),
        end_date: text(premium.get("endDate")),
        no_limit_orders_remaining: remaining("/premiumLimits/ordersWithoutPriceLimit/remaining"),
        free_express_remaining: remaining("/premiumLimits/freeExpressLimit/remaining"),
    })
}

/// The `bags` payload. Missing counters read as zero.
pub fn reusable_bags(bags: Option<&Value>) -> Option<ReusableBags> {
    let bags = bags?;
    bags.as_object()?;
    let deposit = bags.get("deposit").filter(|d| d.is_object());

    Some(ReusableBags {
        current: integer(bags.get("current")).unwrap_or(0),
        max: integer(bags.get("max")).unwrap_or(0),
        deposit_amount: deposit.and_then(|d| number(d.get("amount"))),
        deposit_currency: deposit.and_then(|d| text(d.get("currency"))),
    })
}

/// `delivery.data.firstDeliveryText.default` with location and type.
pub fn first_delivery(delivery: Option<&Value>) -> Option<FirstDelivery> {
    let data = delivery?.get("data")?;
    let text_value = data
        .pointer("/firstDeliveryText/default")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())?;

    Some(FirstDelivery {
        text: clean(text_value),
        location: text(data.get("deliveryLocationText")),
        delivery_type: text(data.get("deliveryType")),
    })
}

/// The `cart` payload. Missing fields read as an empty cart.
pub fn cart_info(cart: Option<&Value>) -> Option<CartInfo> {
    let cart = cart?;
    cart.as_object()?;

    Some(CartInfo {
        total_price: number(cart.get("total_price")).unwrap_or(0.0),
        total_items: integer(cart.get("total_items")).unwrap_or(0),
        can_make_order: cart
            .get("can_make_order")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

fn parse_slot_bound(value: Option<&Value>) -> Option<DateTime<FixedOffset>> {
    parse_vendor_datetime(value.and_then(Value::as_str))
}

fn clean(text: &str) -> String {
    strip_tags(&unescape_unicode(text)).trim().to_string()
}

fn id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// JSON number or numeric string.
fn number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

fn integer(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn announcements() -> Value {
        json!({
            "data": {
                "announcements": [{
                    "id": 1122334,
                    "title": "Objednávka je na cestě",
                    "content": "Doručíme za <span style=\"color:#e30613\">5</span> minut",
                    "additionalContent": "<b>Kurýr</b> Petr",
                    "updatedAt": "2025-06-01T11:58:00+02:00"
                }]
            }
        })
    }

    #[test]
    fn test_delivery_info() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        let value = announcements();
        let info = delivery_info(Some(&value), &EtaExtractor::default(), now).unwrap();

        assert_eq!(info.content, "Doručíme za 5 minut");
        assert_eq!(info.additional_content.as_deref(), Some("Kurýr Petr"));
        assert_eq!(info.order_id.as_deref(), Some("1122334"));
        assert_eq!(info.title.as_deref(), Some("Objednávka je na cestě"));
        assert!(info.updated_at.is_some());
        assert_eq!(
            info.eta.unwrap().to_rfc3339(),
            "2025-06-01T12:05:00+02:00"
        );
    }

    #[test]
    fn test_no_announcements() {
        let now = Utc::now();
        let empty = json!({"data": {"announcements": []}});
        let extractor = EtaExtractor::default();
        assert!(delivery_info(Some(&empty), &extractor, now).is_none());
        assert!(delivery_info(None, &extractor, now).is_none());
        assert!(delivery_info(Some(&json!({})), &extractor, now).is_none());
    }

    #[test]
    fn test_preselected_slot() {
        let payload = json!({
            "data": {
                "preselectedSlots": [
                    {
                        "type": "EXPRESS",
                        "slot": {
                            "interval": {"since": "2025-06-01T12:30:00+0200", "till": "2025-06-01T13:00:00+0200"},
                            "timeSlotCapacityDTO": {"totalFreeCapacityPercent": 40, "capacityMessage": "Dostupné"}
                        },
                        "price": 89,
                        "title": "Expres",
                        "subtitle": "do 90 minut"
                    },
                    {
                        "type": "ECO",
                        "slot": {"interval": {"since": "2025-06-02T08:00:00+0200", "till": "2025-06-02T09:00:00+0200"}}
                    }
                ]
            }
        });

        let express = preselected_slot(Some(&payload), SlotKind::Express).unwrap();
        assert_eq!(express.free_capacity_percent, Some(40));
        assert_eq!(express.capacity_message.as_deref(), Some("Dostupné"));
        assert_eq!(express.price, Some(89.0));
        assert_eq!(express.subtitle.as_deref(), Some("do 90 minut"));
        assert_eq!(express.since.to_rfc3339(), "2025-06-01T12:30:00+02:00");

        let eco = preselected_slot(Some(&payload), SlotKind::Eco).unwrap();
        assert_eq!(eco.free_capacity_percent, None);
        assert!(eco.till.is_some());

        assert!(preselected_slot(Some(&payload), SlotKind::Standard).is_none());
        assert!(preselected_slot(None, SlotKind::Standard).is_none());
    }

    fn login() -> Value {
        json!({
            "data": {
                "user": {
                    "id": 4455667,
                    "email": "jana@example.cz",
                    "phone": "+420777123456",
                    "credits": 150.5,
                    "premium": {
                        "active": true,
                        "remainingDays": 21,
                        "premiumMembershipType": "MONTHLY",
                        "recurrentPaymentDate": "2025-06-22",
                        "startDate": "2025-05-22",
                        "endDate": "2025-06-22",
                        "premiumLimits": {
                            "ordersWithoutPriceLimit": {"remaining": 3},
                            "freeExpressLimit": {"remaining": 1}
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn test_account_profile() {
        let value = login();
        let profile = account_profile(Some(&value)).unwrap();
        assert_eq!(profile.id.as_deref(), Some("4455667"));
        assert_eq!(profile.email.as_deref(), Some("jana@example.cz"));
        assert_eq!(profile.phone.as_deref(), Some("+420777123456"));
        assert_eq!(profile.credits, Some(150.5));

        assert!(account_profile(None).is_none());
        assert!(account_profile(Some(&json!({"data": {}}))).is_none());
    }

    #[test]
    fn test_premium_info() {
        let value = login();
        let premium = premium_info(Some(&value)).unwrap();
        assert!(premium.active);
        assert_eq!(premium.remaining_days, Some(21));
        assert_eq!(premium.membership_type.as_deref(), Some("MONTHLY"));
        assert_eq!(premium.end_date.as_deref(), Some("2025-06-22"));
        assert_eq!(premium.no_limit_orders_remaining, 3);
        assert_eq!(premium.free_express_remaining, 1);
    }

    #[test]
    fn test_premium_without_limits() {
        let value = json!({"data": {"user": {"premium": {"active": false}}}});
        let premium = premium_info(Some(&value)).unwrap();
        assert!(!premium.active);
        assert_eq!(premium.remaining_days, None);
        assert_eq!(premium.no_limit_orders_remaining, 0);
        assert_eq!(premium.free_express_remaining, 0);

        let no_premium = json!({"data": {"user": {"id": 1}}});
        assert!(premium_info(Some(&no_premium)).is_none());
    }

    #[test]
    fn test_reusable_bags() {
        let value = json!({"current": 6, "max": 10, "deposit": {"amount": 60, "currency": "CZK"}});
        let bags = reusable_bags(Some(&value)).unwrap();
        assert_eq!(bags.current, 6);
        assert_eq!(bags.max, 10);
        assert_eq!(bags.deposit_amount, Some(60.0));
        assert_eq!(bags.deposit_currency.as_deref(), Some("CZK"));

        let bare = reusable_bags(Some(&json!({}))).unwrap();
        assert_eq!(bare.current, 0);
        assert_eq!(bare.deposit_amount, None);
        assert!(reusable_bags(Some(&json!([]))).is_none());
    }

    #[test]
    fn test_first_delivery() {
        let value = json!({
            "data": {
                "firstDeliveryText": {"default": "Dnes <b>od 16:00</b>"},
                "deliveryLocationText": "Praha 7",
                "deliveryType": "HOME"
            }
        });
        let first = first_delivery(Some(&value)).unwrap();
        assert_eq!(first.text, "Dnes od 16:00");
        assert_eq!(first.location.as_deref(), Some("Praha 7"));
        assert_eq!(first.delivery_type.as_deref(), Some("HOME"));

        assert!(first_delivery(Some(&json!({"data": {}}))).is_none());
        assert!(first_delivery(None).is_none());
    }

    #[test]
    fn test_cart_info() {
        let value = json!({"total_price": "1249.90", "total_items": 17, "can_make_order": true});
        let cart = cart_info(Some(&value)).unwrap();
        assert_eq!(cart.total_price, 1249.9);
        assert_eq!(cart.total_items, 17);
        assert!(cart.can_make_order);

        let empty = cart_info(Some(&json!({}))).unwrap();
        assert_eq!(empty.total_price, 0.0);
        assert!(!empty.can_make_order);
        assert!(cart_info(None).is_none());
    }
}
