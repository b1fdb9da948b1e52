//! Server state shared across handlers.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, warn};

use crate::dashboard::Dashboard;
use crate::printer::PrintEvent;

/// Print notices kept for `GET /api/notices`.
pub const NOTICE_CAPACITY: usize = 50;

/// A print event as shown to staff.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub at: DateTime<Utc>,
    pub message: String,
    #[serde(flatten)]
    pub event: PrintEvent,
}

/// Application state shared across handlers.
pub struct AppState {
    pub dashboard: Dashboard,
    /// Newest last
    pub notices: RwLock<VecDeque<Notice>>,
}

impl AppState {
    pub fn new(dashboard: Dashboard) -> Self {
        Self {
            dashboard,
            notices: RwLock::new(VecDeque::with_capacity(NOTICE_CAPACITY)),
        }
    }

    pub async fn push_notice(&self, event: PrintEvent) {
        let notice = Notice {
            at: Utc::now(),
            message: event.message(),
            event,
        };
        debug!(message = %notice.message, "notice");
        let mut notices = self.notices.write().await;
        if notices.len() == NOTICE_CAPACITY {
            notices.pop_front();
        }
        notices.push_back(notice);
    }
}

/// Copy printer events into the notice list until the printer goes away.
pub async fn collect_notices(
    state: std::sync::Arc<AppState>,
    mut events: broadcast::Receiver<PrintEvent>,
) {
    loop {
        match events.recv().await {
            Ok(event) => state.push_notice(event).await,
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!(missed, "dropped print notices");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
