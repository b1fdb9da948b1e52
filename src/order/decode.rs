//! Document → Order decoding.
//!
//! Strict serde decoding is tried first. When it fails (a quantity typed as
//! `"2"`, a timestamp stored as a string, one broken item) a field-by-field
//! fallback recovers what it can, so a single sloppy field never hides an
//! otherwise printable order.

use serde_json::{Map, Value};
use tracing::warn;

use super::{Order, OrderItem, OrderStatus, TotalCost, number_to_string};
use crate::error::RaivoError;
use crate::store::Document;

impl Order {
    /// Decode a store document. The document key becomes the order id.
    ///
    /// Fails only when the body is not an object or carries a status that
    /// is not one of the five literals.
    pub fn from_document(doc: &Document) -> Result<Order, RaivoError> {
        let mut order = match serde_json::from_value::<Order>(doc.fields.clone()) {
            Ok(order) => order,
            Err(e) => {
                warn!(id = %doc.id, error = %e, "strict decode failed, using fallback");
                decode_fallback(&doc.fields)?
            }
        };
        order.id = doc.id.clone();
        Ok(order)
    }
}

fn decode_fallback(body: &Value) -> Result<Order, RaivoError> {
    let map = body
        .as_object()
        .ok_or_else(|| RaivoError::Decode("document body is not an object".into()))?;

    let status = match map.get("status") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.parse::<OrderStatus>()?),
        Some(other) => {
            return Err(RaivoError::Decode(format!("invalid status {}", other)));
        }
    };

    let items = match map.get("items") {
        Some(Value::Array(values)) => values.iter().filter_map(decode_item).collect(),
        _ => Vec::new(),
    };

    let total_cost = match map.get("totalCost") {
        Some(Value::Number(n)) => n.as_f64().map(TotalCost::Number),
        Some(Value::String(s)) => Some(TotalCost::Text(s.clone())),
        _ => None,
    };

    Ok(Order {
        id: String::new(),
        customer_name: text(map, "customerName"),
        items,
        status,
        timestamp: integer(map, "timestamp"),
        pickup_time: text(map, "pickupTime"),
        special_requests: text(map, "specialRequests"),
        total_cost,
        recording_url: text(map, "recordingUrl"),
        conversation_transcript: text(map, "conversationTranscript")
            .or_else(|| text(map, "conversationText")),
        caller_phone: text(map, "callerPhone"),
        customer_phone: text(map, "customerPhone"),
        delivery_address: text(map, "deliveryAddress"),
        order_type: text(map, "orderType"),
    })
}

fn decode_item(value: &Value) -> Option<OrderItem> {
    if let Ok(item) = serde_json::from_value::<OrderItem>(value.clone()) {
        return Some(item);
    }
    let Some(map) = value.as_object() else {
        warn!(item = %value, "dropping malformed order item");
        return None;
    };
    Some(OrderItem {
        name: text(map, "name"),
        quantity: integer(map, "quantity").and_then(|q| u32::try_from(q).ok()),
        details: text(map, "details"),
        spice_level: text(map, "spiceLevel"),
        price: float(map, "price"),
    })
}

/// Strings as-is, numbers and booleans rendered. Anything else is dropped.
fn text(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => n.as_f64().map(number_to_string),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn integer(map: &Map<String, Value>, key: &str) -> Option<i64> {
    match map.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

fn float(map: &Map<String, Value>, key: &str) -> Option<f64> {
    match map.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn doc(id: &str, fields: Value) -> Document {
        Document {
            id: id.into(),
            fields,
        }
    }

    #[test]
    fn test_strict_decode_uses_document_key() {
        let order = Order::from_document(&doc(
            "key-001",
            json!({ "id": "body-id", "customerName": "Ana", "status": "NEW" }),
        ))
        .unwrap();

        assert_eq!(order.id, "key-001");
        assert_eq!(order.status, Some(OrderStatus::New));
    }

    #[test]
    fn test_fallback_tolerates_string_numbers() {
        let order = Order::from_document(&doc(
            "abc",
            json!({
                "customerName": "Ben",
                "timestamp": "1718000000000",
                "items": [
                    { "name": "Roti", "quantity": "3", "price": "4.5" },
                    "not an item",
                    { "name": "Satay", "quantity": 2 }
                ]
            }),
        ))
        .unwrap();

        assert_eq!(order.id, "abc");
        assert_eq!(order.timestamp, Some(1_718_000_000_000));
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].quantity, Some(3));
        assert_eq!(order.items[0].price, Some(4.5));
        assert_eq!(order.items[1].name.as_deref(), Some("Satay"));
    }

    #[test]
    fn test_fallback_drops_bad_fields() {
        let order = Order::from_document(&doc(
            "x1",
            json!({
                "customerName": { "first": "Ana" },
                "pickupTime": "6:30 PM",
                "totalCost": [1, 2],
                "items": "oops"
            }),
        ))
        .unwrap();

        assert_eq!(order.customer_name, None);
        assert_eq!(order.pickup_time.as_deref(), Some("6:30 PM"));
        assert_eq!(order.total_cost, None);
        assert!(order.items.is_empty());
    }

    #[test]
    fn test_invalid_status_fails() {
        let result = Order::from_document(&doc("x", json!({ "status": "SHIPPED" })));
        assert!(matches!(result, Err(RaivoError::Decode(_))));

        let result = Order::from_document(&doc("x", json!({ "status": 3 })));
        assert!(result.is_err());
    }

    #[test]
    fn test_non_object_body_fails() {
        let result = Order::from_document(&doc("x", json!([1, 2, 3])));
        assert!(matches!(result, Err(RaivoError::Decode(_))));
    }

    #[test]
    fn test_null_status_is_absent() {
        let order = Order::from_document(&doc("x", json!({ "status": null }))).unwrap();
        assert_eq!(order.status, None);
    }
}
