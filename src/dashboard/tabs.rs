//! Dashboard tabs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RaivoError;
use crate::order::{Order, OrderStatus};

/// The six dashboard tabs, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardTab {
    New,
    Preparing,
    /// Consolidated items of everything being prepared
    Chef,
    Ready,
    Completed,
    Cancelled,
}

impl DashboardTab {
    pub const ALL: [DashboardTab; 6] = [
        DashboardTab::New,
        DashboardTab::Preparing,
        DashboardTab::Chef,
        DashboardTab::Ready,
        DashboardTab::Completed,
        DashboardTab::Cancelled,
    ];

    /// Label on the tab strip.
    pub fn label(&self) -> &'static str {
        match self {
            DashboardTab::New => "NEW",
            DashboardTab::Preparing => "PREP",
            DashboardTab::Chef => "CHEF",
            DashboardTab::Ready => "READY",
            DashboardTab::Completed => "HISTORY",
            DashboardTab::Cancelled => "CXL",
        }
    }

    /// The status a list tab shows. The chef's tab has none.
    pub fn status(&self) -> Option<OrderStatus> {
        match self {
            DashboardTab::New => Some(OrderStatus::New),
            DashboardTab::Preparing => Some(OrderStatus::Preparing),
            DashboardTab::Chef => None,
            DashboardTab::Ready => Some(OrderStatus::Ready),
            DashboardTab::Completed => Some(OrderStatus::Completed),
            DashboardTab::Cancelled => Some(OrderStatus::Cancelled),
        }
    }

    /// Whether the tab label carries an order count.
    pub fn shows_count(&self) -> bool {
        matches!(
            self,
            DashboardTab::New | DashboardTab::Preparing | DashboardTab::Ready
        )
    }
}

impl fmt::Display for DashboardTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DashboardTab {
    type Err = RaivoError;

    /// Accepts the serde names and the tab labels, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "new" => Ok(DashboardTab::New),
            "preparing" | "prep" => Ok(DashboardTab::Preparing),
            "chef" => Ok(DashboardTab::Chef),
            "ready" => Ok(DashboardTab::Ready),
            "completed" | "history" => Ok(DashboardTab::Completed),
            "cancelled" | "cxl" => Ok(DashboardTab::Cancelled),
            other => Err(RaivoError::InvalidCommand(format!("unknown tab '{}'", other))),
        }
    }
}

/// One entry of the tab strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabSummary {
    pub tab: DashboardTab,
    pub label: &'static str,
    pub count: Option<usize>,
}

/// Tab strip for a snapshot.
pub fn summarize(orders: &[Order]) -> Vec<TabSummary> {
    DashboardTab::ALL
        .iter()
        .map(|&tab| TabSummary {
            tab,
            label: tab.label(),
            count: tab
                .shows_count()
                .then(|| filter(orders, tab).len()),
        })
        .collect()
}

/// Orders shown on a list tab, in snapshot order.
pub fn filter(orders: &[Order], tab: DashboardTab) -> Vec<&Order> {
    match tab.status() {
        Some(status) => orders
            .iter()
            .filter(|o| o.status == Some(status))
            .collect(),
        None => Vec::new(),
    }
}
