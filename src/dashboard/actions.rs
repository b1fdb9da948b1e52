//! Order card buttons and the status workflow behind them.

use serde::{Deserialize, Serialize};

use crate::order::OrderStatus;

/// A button on an order card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    Cancel,
    Accept,
    Ready,
    ToPrep,
    Complete,
    ToReady,
    Restore,
    Print,
}

impl OrderAction {
    pub fn label(&self) -> &'static str {
        match self {
            OrderAction::Cancel => "Cancel",
            OrderAction::Accept => "Accept",
            OrderAction::Ready => "Ready",
            OrderAction::ToPrep => "To Prep",
            OrderAction::Complete => "Complete",
            OrderAction::ToReady => "To Ready",
            OrderAction::Restore => "Restore",
            OrderAction::Print => "Print",
        }
    }

    /// The status this action moves an order to. `Print` changes nothing.
    pub fn target_status(&self) -> Option<OrderStatus> {
        match self {
            OrderAction::Cancel => Some(OrderStatus::Cancelled),
            OrderAction::Accept | OrderAction::ToPrep => Some(OrderStatus::Preparing),
            OrderAction::Ready | OrderAction::ToReady => Some(OrderStatus::Ready),
            OrderAction::Complete => Some(OrderStatus::Completed),
            OrderAction::Restore => Some(OrderStatus::New),
            OrderAction::Print => None,
        }
    }

    /// Accepting a new order sends it to the kitchen printer too.
    pub fn prints(&self) -> bool {
        matches!(self, OrderAction::Accept | OrderAction::Print)
    }
}

/// Buttons offered for an order, left to right.
///
/// Orders without a status get no buttons.
pub fn actions_for(status: Option<OrderStatus>) -> &'static [OrderAction] {
    use OrderAction::*;

    match status {
        Some(OrderStatus::New) => &[Cancel, Print, Accept],
        Some(OrderStatus::Preparing) => &[Print, Ready],
        Some(OrderStatus::Ready) => &[Print, ToPrep, Complete],
        Some(OrderStatus::Completed) => &[Print, ToReady],
        Some(OrderStatus::Cancelled) => &[Print, Restore],
        None => &[],
    }
}
