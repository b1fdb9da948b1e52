//! Printer status and print notices.

use axum::{Json, extract::State};
use std::sync::Arc;

use crate::printer::PrinterStatusView;

use super::super::state::{AppState, Notice};

/// GET /api/printer - Session state, target, and pending order.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<PrinterStatusView> {
    Json(state.dashboard.printer().snapshot().await)
}

/// GET /api/notices - Recent print notices, newest first.
pub async fn notices(State(state): State<Arc<AppState>>) -> Json<Vec<Notice>> {
    let notices = state.notices.read().await;
    Json(notices.iter().rev().cloned().collect())
}
