//! Order cards: what staff see for one order.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use super::actions::{OrderAction, actions_for};
use crate::components::format_usd;
use crate::order::{Order, OrderItem, OrderStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderCard {
    pub id: String,
    /// Last three characters of the id
    pub number: String,
    /// Short time, e.g. `Mon, 18:13`; empty when the order has no timestamp
    pub time: String,
    pub customer: String,
    pub phone: Option<String>,
    pub status: String,
    pub items: Vec<String>,
    pub special_requests: Option<String>,
    pub pickup: Option<String>,
    /// Formatted total; hidden on cancelled orders
    pub total: Option<String>,
    pub has_transcript: bool,
    pub has_recording: bool,
    pub actions: Vec<OrderAction>,
}

impl OrderCard {
    pub fn new(order: &Order, offset: FixedOffset) -> Self {
        Self {
            id: order.id.clone(),
            number: order.order_number().to_string(),
            time: short_time(order.timestamp, offset),
            customer: order
                .customer_name
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            phone: order.phone().map(format_phone),
            status: order
                .status
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            items: order.items.iter().map(item_line).collect(),
            special_requests: not_blank(order.special_requests.as_deref()),
            pickup: not_blank(order.pickup_time.as_deref()).filter(|p| p != "N/A"),
            total: (order.status != Some(OrderStatus::Cancelled))
                .then(|| format_usd(order.total())),
            has_transcript: not_blank(order.conversation_transcript.as_deref()).is_some(),
            has_recording: not_blank(order.recording_url.as_deref()).is_some(),
            actions: actions_for(order.status).to_vec(),
        }
    }
}

fn not_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

fn short_time(timestamp: Option<i64>, offset: FixedOffset) -> String {
    timestamp
        .and_then(DateTime::from_timestamp_millis)
        .map(|t| t.with_timezone(&offset).format("%a, %H:%M").to_string())
        .unwrap_or_default()
}

/// Optional ` (spice)` and ` - details` suffix shared by cards and the
/// chef's list.
pub(crate) fn item_suffix(item: &OrderItem) -> String {
    let mut suffix = String::new();
    if let Some(spice) = item.spice_level.as_deref().filter(|s| !s.trim().is_empty()) {
        suffix.push_str(&format!(" ({})", spice));
    }
    if let Some(details) = item
        .details
        .as_deref()
        .filter(|d| !d.trim().is_empty() && *d != "None")
    {
        suffix.push_str(&format!(" - {}", details));
    }
    suffix
}

/// `2x Pad Thai (Hot) - no peanuts`
pub fn item_line(item: &OrderItem) -> String {
    format!(
        "{}x {}{}",
        item.quantity.unwrap_or(0),
        item.name.as_deref().unwrap_or("Item"),
        item_suffix(item)
    )
}

/// Format an Australian phone number for display.
///
/// A leading country code `61` becomes `0`, and ten-digit numbers are
/// grouped 4-3-3. Anything else is shown as given.
///
/// ```
/// use raivo::dashboard::format_phone;
///
/// assert_eq!(format_phone("61412345678"), "0412 345 678");
/// assert_eq!(format_phone("12345"), "12345");
/// ```
pub fn format_phone(phone: &str) -> String {
    let phone = phone.trim();
    let local = match phone.strip_prefix("61") {
        Some(rest) => format!("0{}", rest),
        None => phone.to_string(),
    };

    if local.len() == 10 && local.chars().all(|c| c.is_ascii_digit()) {
        format!("{} {} {}", &local[..4], &local[4..7], &local[7..])
    } else {
        local
    }
}
