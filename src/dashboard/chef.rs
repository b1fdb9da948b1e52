//! The chef's list: everything being prepared, added up.

use std::collections::HashMap;

use serde::Serialize;

use super::card::item_suffix;
use crate::order::{Order, OrderStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChefItem {
    pub label: String,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChefsList {
    /// Largest count first; equal counts keep first-seen order
    pub items: Vec<ChefItem>,
    pub special_requests: Vec<String>,
}

/// Consolidate the items of all PREPARING orders.
///
/// Items with the same name, spice level, and details are one line.
pub fn chefs_list(orders: &[Order]) -> ChefsList {
    let preparing: Vec<&Order> = orders
        .iter()
        .filter(|o| o.status == Some(OrderStatus::Preparing))
        .collect();

    let mut items: Vec<ChefItem> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for item in preparing.iter().flat_map(|o| &o.items) {
        let label = format!(
            "{}{}",
            item.name.as_deref().unwrap_or("Unknown Item"),
            item_suffix(item)
        );
        let quantity = item.quantity.unwrap_or(0);
        match index.get(&label) {
            Some(&i) => items[i].count += quantity,
            None => {
                index.insert(label.clone(), items.len());
                items.push(ChefItem {
                    label,
                    count: quantity,
                });
            }
        }
    }
    items.sort_by(|a, b| b.count.cmp(&a.count));

    let special_requests = preparing
        .iter()
        .filter_map(|o| o.special_requests.as_deref())
        .filter(|r| !r.trim().is_empty())
        .map(str::to_string)
        .collect();

    ChefsList {
        items,
        special_requests,
    }
}
