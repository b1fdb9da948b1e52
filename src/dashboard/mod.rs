//! # Dashboard View
//!
//! The staff-facing model of the order dashboard: tabs, order cards, the
//! buttons on each card, the chef's list, and conversation transcripts.
//!
//! [`Dashboard`] ties the live [`OrderFeed`] to the [`PrinterController`].
//! Everything it shows comes from the current snapshot; actions write the
//! new status to the store in the background and let the next snapshot
//! bring the change back.
//!
//! ## Example
//!
//! ```
//! use raivo::dashboard::{actions_for, OrderAction};
//! use raivo::order::OrderStatus;
//!
//! let buttons = actions_for(Some(OrderStatus::New));
//! assert_eq!(buttons, &[OrderAction::Cancel, OrderAction::Print, OrderAction::Accept]);
//! ```

mod actions;
mod card;
mod chef;
mod tabs;
mod transcript;

pub use actions::{OrderAction, actions_for};
pub use card::{OrderCard, format_phone, item_line};
pub use chef::{ChefItem, ChefsList, chefs_list};
pub use tabs::{DashboardTab, TabSummary, filter, summarize};
pub use transcript::{Speaker, TranscriptLine, parse_transcript};

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};

use crate::order::{Order, OrderStatus};
use crate::printer::{Dispatch, PrinterController};
use crate::receipt::ReceiptLayout;
use crate::store::OrderFeed;

/// Why an action was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("order {0} not found")]
    NotFound(String),

    #[error("{action:?} is not available for {status} orders")]
    NotAllowed {
        action: OrderAction,
        status: String,
    },
}

/// What an action did.
#[derive(Debug)]
pub struct ActionOutcome {
    pub order: Order,
    /// Status being written, if the action changes it
    pub status: Option<OrderStatus>,
    /// Print dispatch, if the action prints
    pub print: Option<Dispatch>,
}

/// The dashboard: live orders plus the printer.
#[derive(Clone)]
pub struct Dashboard {
    feed: OrderFeed,
    printer: PrinterController,
    layout: ReceiptLayout,
}

impl Dashboard {
    pub fn new(feed: OrderFeed, printer: PrinterController, layout: ReceiptLayout) -> Self {
        Self {
            feed,
            printer,
            layout,
        }
    }

    pub fn feed(&self) -> &OrderFeed {
        &self.feed
    }

    pub fn printer(&self) -> &PrinterController {
        &self.printer
    }

    pub fn layout(&self) -> &ReceiptLayout {
        &self.layout
    }

    pub fn orders(&self) -> Arc<Vec<Order>> {
        self.feed.orders()
    }

    pub fn order(&self, id: &str) -> Result<Order, ActionError> {
        self.feed
            .find(id)
            .ok_or_else(|| ActionError::NotFound(id.to_string()))
    }

    pub fn tabs(&self) -> Vec<TabSummary> {
        summarize(&self.orders())
    }

    /// Cards for a list tab. The chef's tab has no cards.
    pub fn cards(&self, tab: DashboardTab) -> Vec<OrderCard> {
        let orders = self.orders();
        filter(&orders, tab)
            .into_iter()
            .map(|o| OrderCard::new(o, self.layout.offset))
            .collect()
    }

    pub fn card(&self, id: &str) -> Result<OrderCard, ActionError> {
        Ok(OrderCard::new(&self.order(id)?, self.layout.offset))
    }

    pub fn chefs_list(&self) -> ChefsList {
        chefs_list(&self.orders())
    }

    /// Transcript lines; empty when the order has no transcript.
    pub fn transcript(&self, id: &str) -> Result<Vec<TranscriptLine>, ActionError> {
        let order = self.order(id)?;
        Ok(order
            .conversation_transcript
            .as_deref()
            .map(parse_transcript)
            .unwrap_or_default())
    }

    /// Send an order to the printer.
    pub async fn print(&self, id: &str) -> Result<Dispatch, ActionError> {
        let order = self.order(id)?;
        info!(order = %order.order_number(), "print requested");
        Ok(self.printer.print(order).await)
    }

    /// Press a button on an order card.
    ///
    /// The status write runs in the background; a failed write is logged and
    /// the card keeps showing whatever the store last reported.
    pub async fn apply_action(
        &self,
        id: &str,
        action: OrderAction,
    ) -> Result<ActionOutcome, ActionError> {
        let order = self.order(id)?;
        if !actions_for(order.status).contains(&action) {
            return Err(ActionError::NotAllowed {
                action,
                status: order
                    .status
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_else(|| "Unknown".to_string()),
            });
        }

        let status = action.target_status();
        if let Some(next) = status {
            info!(order = %order.order_number(), from = ?order.status, to = %next, "status change");
            let feed = self.feed.clone();
            let id = order.id.clone();
            tokio::spawn(async move {
                if let Err(e) = feed.update_status(&id, next).await {
                    error!(order = %id, status = %next, error = %e, "status update failed");
                }
            });
        }

        let print = if action.prints() {
            Some(self.printer.print(order.clone()).await)
        } else {
            None
        };

        Ok(ActionOutcome {
            order,
            status,
            print,
        })
    }
}
