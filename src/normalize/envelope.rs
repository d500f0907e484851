//! Response envelope unwrapping.
//!
//! Order feeds normally arrive as a bare JSON list, but the vendor has been
//! seen wrapping them in an object under one of a few keys. The envelope is
//! resolved once, up front, so the normalizer only ever sees a slice.

use serde_json::Value;
use tracing::{debug, warn};

/// Keys checked, in order, when a feed arrives as an object.
pub const WRAPPER_KEYS: [&str; 4] = ["data", "orders", "items", "results"];

/// Shape of an order feed as received.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResponseEnvelope<'a> {
    /// A bare list
    Direct(&'a [Value]),

    /// An object carrying the list under `key`
    Wrapped { key: &'static str, items: &'a [Value] },

    /// Key absent or `null`
    Missing,

    /// Present but neither a list nor a known wrapper
    Unrecognized,
}

impl<'a> ResponseEnvelope<'a> {
    /// Classify a feed value.
    pub fn classify(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => ResponseEnvelope::Missing,
            Some(Value::Array(items)) => ResponseEnvelope::Direct(items.as_slice()),
            Some(Value::Object(map)) => WRAPPER_KEYS
                .into_iter()
                .find_map(|key| match map.get(key) {
                    Some(Value::Array(items)) => Some(ResponseEnvelope::Wrapped {
                        key,
                        items: items.as_slice(),
                    }),
                    _ => None,
                })
                .unwrap_or(ResponseEnvelope::Unrecognized),
            Some(_) => ResponseEnvelope::Unrecognized,
        }
    }

    /// The contained orders; empty unless the feed was a list or a known wrapper.
    pub fn items(&self) -> &'a [Value] {
        match *self {
            ResponseEnvelope::Direct(items) => items,
            ResponseEnvelope::Wrapped { items, .. } => items,
            ResponseEnvelope::Missing | ResponseEnvelope::Unrecognized => &[],
        }
    }
}

/// Resolve the order list stored under `feed` and log what was found.
pub fn unwrap_feed<'a>(feed: &str, value: Option<&'a Value>) -> &'a [Value] {
    let envelope = ResponseEnvelope::classify(value);
    match &envelope {
        ResponseEnvelope::Direct(items) => {
            debug!("Found {} orders in {}", items.len(), feed);
        }
        ResponseEnvelope::Wrapped { key, items } => {
            debug!("Extracted {} orders from {}.{}", items.len(), feed, key);
        }
        ResponseEnvelope::Missing => {
            debug!("No data found for key: {}", feed);
        }
        ResponseEnvelope::Unrecognized => match value {
            Some(Value::Object(map)) => {
                let keys: Vec<&String> = map.keys().collect();
                warn!(
                    "Expected list in {} but got object without list field: {:?}",
                    feed, keys
                );
            }
            other => {
                warn!("Unexpected data type for {}: {:?}", feed, other);
            }
        },
    }
    envelope.items()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_direct_list() {
        let value = json!([{"id": 1}, {"id": 2}]);
        let envelope = ResponseEnvelope::classify(Some(&value));
        assert!(matches!(envelope, ResponseEnvelope::Direct(_)));
        assert_eq!(envelope.items().len(), 2);
    }

    #[test]
    fn test_wrapped_in_known_keys() {
        for key in WRAPPER_KEYS {
            let mut map = serde_json::Map::new();
            map.insert(key.to_string(), json!([{"id": 1}]));
            let value = Value::Object(map);
            let envelope = ResponseEnvelope::classify(Some(&value));
            assert_eq!(
                envelope,
                ResponseEnvelope::Wrapped {
                    key,
                    items: envelope.items()
                }
            );
            assert_eq!(envelope.items().len(), 1);
        }
    }

    #[test]
    fn test_wrapper_key_precedence() {
        let value = json!({"results": [{"id": 1}], "data": [{"id": 2}, {"id": 3}]});
        match ResponseEnvelope::classify(Some(&value)) {
            ResponseEnvelope::Wrapped { key, items } => {
                assert_eq!(key, "data");
                assert_eq!(items.len(), 2);
            }
            other => panic!("unexpected envelope {:?}", other),
        }
    }

    #[test]
    fn test_wrapper_key_must_hold_list() {
        let value = json!({"data": {"orders": []}, "status": 200});
        let envelope = ResponseEnvelope::classify(Some(&value));
        assert_eq!(envelope, ResponseEnvelope::Unrecognized);
        assert!(envelope.items().is_empty());
    }

    #[test]
    fn test_missing_and_odd_types() {
        assert_eq!(ResponseEnvelope::classify(None), ResponseEnvelope::Missing);
        assert_eq!(
            ResponseEnvelope::classify(Some(&Value::Null)),
            ResponseEnvelope::Missing
        );
        assert_eq!(
            ResponseEnvelope::classify(Some(&json!("orders"))),
            ResponseEnvelope::Unrecognized
        );
    }

    #[test]
    fn test_unwrap_feed() {
        let value = json!({"orders": [{"id": 9}]});
        assert_eq!(unwrap_feed("next_order", Some(&value)).len(), 1);
        assert!(unwrap_feed("next_order", None).is_empty());
    }
}
