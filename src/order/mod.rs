//! # Orders
//!
//! The order data model as it arrives from the document store.
//!
//! Every field except the id is optional: documents are written by an
//! external order-taking system and are not validated before they land in
//! the collection. The id is never read from the document body, it is the
//! document key (see [`Order::from_document`]).
//!
//! ## Wire Format
//!
//! ```json
//! {
//!   "customerName": "Ana",
//!   "status": "NEW",
//!   "timestamp": 1718000000000,
//!   "items": [{ "name": "Pad Thai", "quantity": 2, "spiceLevel": "Hot" }],
//!   "totalCost": "$24.50",
//!   "pickupTime": "6:30 PM"
//! }
//! ```

mod decode;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::RaivoError;

/// Lifecycle status of an order.
///
/// Stored as the literal upper-case name (`"NEW"`, `"PREPARING"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    New,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::New,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// The literal stored in the document.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = RaivoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| RaivoError::Decode(format!("unknown order status '{}'", s)))
    }
}

/// One line of an order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderItem {
    pub name: Option<String>,
    pub quantity: Option<u32>,
    pub details: Option<String>,
    pub spice_level: Option<String>,
    pub price: Option<f64>,
}

/// Total cost as found in the document: a number, or a string such as
/// `"$1,234.50"` typed in by whoever created the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TotalCost {
    Number(f64),
    Text(String),
}

impl TotalCost {
    /// Parse the amount, defaulting to zero.
    ///
    /// Strings keep only ASCII digits and `.` before parsing, so `"$1,234.50"`
    /// reads as `1234.5` and `"twelve"` as `0.0`.
    ///
    /// ```
    /// use raivo::order::TotalCost;
    ///
    /// assert_eq!(TotalCost::Text("$1,234.50".into()).amount(), 1234.5);
    /// assert_eq!(TotalCost::Text("TBD".into()).amount(), 0.0);
    /// assert_eq!(TotalCost::Number(9.5).amount(), 9.5);
    /// ```
    pub fn amount(&self) -> f64 {
        match self {
            TotalCost::Number(n) if n.is_finite() => *n,
            TotalCost::Number(_) => 0.0,
            TotalCost::Text(s) => {
                let cleaned: String = s
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == '.')
                    .collect();
                cleaned.parse().unwrap_or(0.0)
            }
        }
    }
}

/// A restaurant order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Order {
    /// Document key. Never read from the body.
    #[serde(skip_deserializing)]
    pub id: String,
    pub customer_name: Option<String>,
    pub items: Vec<OrderItem>,
    pub status: Option<OrderStatus>,
    /// Creation time, milliseconds since the Unix epoch.
    pub timestamp: Option<i64>,
    pub pickup_time: Option<String>,
    pub special_requests: Option<String>,
    pub total_cost: Option<TotalCost>,
    pub recording_url: Option<String>,
    #[serde(alias = "conversationText")]
    pub conversation_transcript: Option<String>,
    #[serde(deserialize_with = "deserialize_phone")]
    pub caller_phone: Option<String>,
    #[serde(deserialize_with = "deserialize_phone")]
    pub customer_phone: Option<String>,
    pub delivery_address: Option<String>,
    pub order_type: Option<String>,
}

impl Order {
    /// Short order number printed on tickets: the last three characters of
    /// the id, or the whole id when it is shorter.
    ///
    /// ```
    /// use raivo::order::Order;
    ///
    /// let order = Order { id: "aB9xQ042".into(), ..Default::default() };
    /// assert_eq!(order.order_number(), "042");
    ///
    /// let short = Order { id: "7".into(), ..Default::default() };
    /// assert_eq!(short.order_number(), "7");
    /// ```
    pub fn order_number(&self) -> &str {
        match self.id.char_indices().rev().nth(2) {
            Some((idx, _)) => &self.id[idx..],
            None => &self.id,
        }
    }

    /// Caller phone, falling back to the customer phone.
    pub fn phone(&self) -> Option<&str> {
        self.caller_phone
            .as_deref()
            .or(self.customer_phone.as_deref())
    }

    /// Parsed total, zero when absent or unparseable.
    pub fn total(&self) -> f64 {
        self.total_cost.as_ref().map_or(0.0, TotalCost::amount)
    }

    /// Timestamp used for ordering, missing as zero.
    pub fn sort_key(&self) -> i64 {
        self.timestamp.unwrap_or(0)
    }
}

/// Phones arrive as strings or as bare numbers.
fn deserialize_phone<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Phone {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(Option::<Phone>::deserialize(deserializer)?.map(|phone| match phone {
        Phone::Text(s) => s,
        Phone::Int(n) => n.to_string(),
        Phone::Float(f) => number_to_string(f),
    }))
}

/// Render a JSON number without a trailing `.0` for whole values.
pub(crate) fn number_to_string(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}
