//! Order handlers: tabs, cards, actions, printing.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

use crate::dashboard::{
    ActionError, ChefsList, DashboardTab, OrderAction, OrderCard, TabSummary, TranscriptLine,
};
use crate::error::RaivoError;
use crate::order::{Order, OrderStatus};
use crate::printer::Dispatch;
use crate::protocol::Dialect;
use crate::receipt::{receipt_bytes, receipt_preview};
use crate::store::Document;

use super::super::state::AppState;

type ApiError = (StatusCode, String);

fn action_error(e: ActionError) -> ApiError {
    let status = match e {
        ActionError::NotFound(_) => StatusCode::NOT_FOUND,
        ActionError::NotAllowed { .. } => StatusCode::CONFLICT,
    };
    (status, e.to_string())
}

fn bad_request(e: impl std::fmt::Display) -> ApiError {
    (StatusCode::BAD_REQUEST, e.to_string())
}

/// What happened to a print request.
#[derive(Debug, Serialize)]
pub struct PrintResponse {
    pub order: String,
    /// `started` or `deferred`
    pub dispatch: &'static str,
    /// A deferred order replaced the one already waiting
    pub replaced: bool,
}

impl PrintResponse {
    fn new(order: &str, dispatch: Dispatch) -> Self {
        let (dispatch, replaced) = match dispatch {
            // The job reports through print notices
            Dispatch::Started(_) => ("started", false),
            Dispatch::Deferred { replaced } => ("deferred", replaced),
        };
        Self {
            order: order.to_string(),
            dispatch,
            replaced,
        }
    }
}

/// GET /api/tabs - Tab strip with counts.
pub async fn tabs(State(state): State<Arc<AppState>>) -> Json<Vec<TabSummary>> {
    Json(state.dashboard.tabs())
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub tab: Option<String>,
}

/// GET /api/orders?tab=new - Cards on a list tab, newest first.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<OrderCard>>, ApiError> {
    let tab = match query.tab.as_deref() {
        Some(name) => name.parse::<DashboardTab>().map_err(bad_request)?,
        None => DashboardTab::New,
    };
    if tab == DashboardTab::Chef {
        return Err(bad_request("the chef's tab is served by /api/chef"));
    }
    Ok(Json(state.dashboard.cards(tab)))
}

/// GET /api/orders/:id - One order card.
pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderCard>, ApiError> {
    state.dashboard.card(&id).map(Json).map_err(action_error)
}

/// GET /api/chef - Consolidated items of everything being prepared.
pub async fn chef(State(state): State<Arc<AppState>>) -> Json<ChefsList> {
    Json(state.dashboard.chefs_list())
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub action: OrderAction,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub order: String,
    /// Status being written
    pub status: Option<OrderStatus>,
    pub print: Option<PrintResponse>,
}

/// POST /api/orders/:id/actions - Press a card button.
pub async fn apply_action(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<ActionRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, ApiError> {
    let Json(request) = body.map_err(|e| bad_request(e.body_text()))?;
    let outcome = state
        .dashboard
        .apply_action(&id, request.action)
        .await
        .map_err(action_error)?;
    let number = outcome.order.order_number();

    Ok(Json(ActionResponse {
        order: number.to_string(),
        status: outcome.status,
        print: outcome.print.map(|d| PrintResponse::new(number, d)),
    }))
}

/// POST /api/orders/:id/print - Print without changing the status.
pub async fn print(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<PrintResponse>), ApiError> {
    let order = state.dashboard.order(&id).map_err(action_error)?;
    let dispatch = state.dashboard.print(&id).await.map_err(action_error)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(PrintResponse::new(order.order_number(), dispatch)),
    ))
}

/// GET /api/orders/:id/transcript - Conversation lines.
pub async fn transcript(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TranscriptLine>>, ApiError> {
    state.dashboard.transcript(&id).map(Json).map_err(action_error)
}

/// GET /api/orders/:id/recording - Redirect to the call recording.
pub async fn recording(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Redirect, ApiError> {
    let order = state.dashboard.order(&id).map_err(action_error)?;
    match order.recording_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => Ok(Redirect::temporary(url)),
        _ => Err((StatusCode::NOT_FOUND, "order has no recording".to_string())),
    }
}

#[derive(Debug, Deserialize)]
pub struct ReceiptQuery {
    /// Return printer bytes in this dialect instead of a text preview
    pub dialect: Option<String>,
}

/// GET /api/orders/:id/receipt - Text preview (or raw bytes) of the receipt.
pub async fn receipt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ReceiptQuery>,
) -> Result<Response, ApiError> {
    let order = state.dashboard.order(&id).map_err(action_error)?;
    let layout = state.dashboard.layout();

    match query.dialect.as_deref() {
        Some(name) => {
            let dialect = name.parse::<Dialect>().map_err(bad_request)?;
            let bytes = receipt_bytes(&order, layout, dialect);
            Ok(([(header::CONTENT_TYPE, "application/octet-stream")], bytes).into_response())
        }
        None => Ok((
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            receipt_preview(&order, layout),
        )
            .into_response()),
    }
}

/// POST /api/orders - Add an order document, as an order-taking system would.
///
/// The body is the document; an `id` field, if present, becomes its key.
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(value) = body.map_err(|e| bad_request(e.body_text()))?;
    let Value::Object(mut fields) = value else {
        return Err(bad_request("order must be a JSON object"));
    };

    let id = match fields.remove("id") {
        None | Some(Value::Null) => None,
        Some(Value::String(id)) if !id.trim().is_empty() => Some(id),
        Some(_) => return Err(bad_request("id must be a non-empty string")),
    };
    let fields = Value::Object(fields);

    let probe = Document {
        id: id.clone().unwrap_or_default(),
        fields: fields.clone(),
    };
    Order::from_document(&probe).map_err(bad_request)?;

    let feed = state.dashboard.feed();
    match feed.store().insert(feed.collection(), id, fields).await {
        Ok(id) => {
            info!(order = %id, "order ingested");
            Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
        }
        Err(RaivoError::Store(message)) => {
            warn!(error = %message, "order ingest rejected");
            Err((StatusCode::CONFLICT, message))
        }
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}
