//! # HTTP Server for the Order Dashboard
//!
//! JSON API over the [`Dashboard`]: tabs, order cards, card actions,
//! printing, and print notices.
//!
//! ## Usage
//!
//! ```bash
//! raivo serve --listen 0.0.0.0:8080 --seed orders.json
//! ```
//!
//! ## Routes
//!
//! | Method | Path | |
//! |--------|------|-|
//! | GET | `/api/tabs` | Tab strip with counts |
//! | GET | `/api/orders?tab=new` | Cards on a tab |
//! | POST | `/api/orders` | Add an order document |
//! | GET | `/api/orders/:id` | One card |
//! | POST | `/api/orders/:id/actions` | `{ "action": "accept" }` |
//! | POST | `/api/orders/:id/print` | Print the receipt |
//! | GET | `/api/orders/:id/receipt` | Receipt preview (`?dialect=` for bytes) |
//! | GET | `/api/orders/:id/transcript` | Conversation lines |
//! | GET | `/api/orders/:id/recording` | Redirect to the recording |
//! | GET | `/api/chef` | Chef's list |
//! | GET | `/api/printer` | Printer session status |
//! | GET | `/api/notices` | Recent print notices |
//!
//! Unknown orders are 404, actions the order's status doesn't offer are 409,
//! and malformed input is 400.

mod handlers;
mod state;

pub use state::{AppState, NOTICE_CAPACITY, Notice};

use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::dashboard::Dashboard;
use crate::error::RaivoError;

/// Build the API router. Must be called within a tokio runtime; it spawns
/// the task that collects print notices.
pub fn router(dashboard: Dashboard) -> Router {
    let events = dashboard.printer().subscribe();
    let app_state = Arc::new(AppState::new(dashboard));
    tokio::spawn(state::collect_notices(app_state.clone(), events));

    Router::new()
        .route("/api/tabs", get(handlers::orders::tabs))
        .route(
            "/api/orders",
            get(handlers::orders::list).post(handlers::orders::ingest),
        )
        .route("/api/orders/:id", get(handlers::orders::show))
        .route(
            "/api/orders/:id/actions",
            post(handlers::orders::apply_action),
        )
        .route("/api/orders/:id/print", post(handlers::orders::print))
        .route("/api/orders/:id/receipt", get(handlers::orders::receipt))
        .route(
            "/api/orders/:id/transcript",
            get(handlers::orders::transcript),
        )
        .route(
            "/api/orders/:id/recording",
            get(handlers::orders::recording),
        )
        .route("/api/chef", get(handlers::orders::chef))
        .route("/api/printer", get(handlers::printer::status))
        .route("/api/notices", get(handlers::printer::notices))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Serve the dashboard API until Ctrl-C, then close the printer link.
pub async fn serve(listen_addr: SocketAddr, dashboard: Dashboard) -> Result<(), RaivoError> {
    let printer = dashboard.printer().clone();
    let app = router(dashboard);

    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .map_err(|e| RaivoError::Transport(format!("Failed to bind to {}: {}", listen_addr, e)))?;
    info!(%listen_addr, "dashboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| RaivoError::Transport(format!("Server error: {}", e)))?;

    info!("shutting down");
    printer.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::{ControllerConfig, PrinterController, Target, TargetAddress};
    use crate::protocol::Dialect;
    use crate::receipt::ReceiptLayout;
    use crate::store::{Document, MemoryStore, ORDERS_COLLECTION, OrderFeed};
    use crate::transport::{RecordingConnector, StaticDiscovery};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use std::time::Duration;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        feed: OrderFeed,
        connector: RecordingConnector,
    }

    async fn app(config: ControllerConfig) -> TestApp {
        let store = Arc::new(MemoryStore::with_documents(
            ORDERS_COLLECTION,
            vec![
                Document {
                    id: "order-001".into(),
                    fields: json!({
                        "customerName": "Ana",
                        "status": "NEW",
                        "timestamp": 2000,
                        "totalCost": "$12.00",
                        "recordingUrl": "https://recordings.example/001.mp3",
                        "conversationTranscript": "agent: Hi user: Laksa",
                    }),
                },
                Document {
                    id: "order-002".into(),
                    fields: json!({ "customerName": "Ben", "status": "COMPLETED", "timestamp": 1000 }),
                },
            ],
        ));
        let mut feed = OrderFeed::subscribe(store, ORDERS_COLLECTION)
            .await
            .unwrap();
        feed.changed().await.unwrap();

        let connector = RecordingConnector::new();
        let printer = PrinterController::new(
            config,
            Arc::new(connector.clone()),
            Arc::new(StaticDiscovery::new(vec![]).hold_open()),
        );
        let dashboard = Dashboard::new(feed.clone(), printer, ReceiptLayout::default());
        TestApp {
            router: router(dashboard),
            feed,
            connector,
        }
    }

    async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    fn json_of(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn test_tabs_and_cards() {
        let app = app(ControllerConfig::default()).await;

        let (status, body) = send(&app.router, "GET", "/api/tabs", None).await;
        assert_eq!(status, StatusCode::OK);
        let tabs = json_of(&body);
        assert_eq!(tabs[0], json!({ "tab": "new", "label": "NEW", "count": 1 }));
        assert_eq!(tabs[4]["count"], Value::Null);

        let (status, body) = send(&app.router, "GET", "/api/orders?tab=history", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_of(&body)[0]["customer"], "Ben");

        let (status, _) = send(&app.router, "GET", "/api/orders?tab=kitchen", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_order_is_404() {
        let app = app(ControllerConfig::default()).await;
        for (method, uri) in [
            ("GET", "/api/orders/missing"),
            ("POST", "/api/orders/missing/print"),
            ("GET", "/api/orders/missing/transcript"),
        ] {
            let (status, _) = send(&app.router, method, uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, uri);
        }
    }

    #[tokio::test]
    async fn test_action_flow() {
        let mut app = app(ControllerConfig::default()).await;

        let (status, body) = send(
            &app.router,
            "POST",
            "/api/orders/order-001/actions",
            Some(json!({ "action": "accept" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body = json_of(&body);
        assert_eq!(body["status"], "PREPARING");
        assert_eq!(body["print"]["dispatch"], "deferred");

        app.feed.changed().await.unwrap();
        let (_, body) = send(&app.router, "GET", "/api/orders/order-001", None).await;
        assert_eq!(json_of(&body)["status"], "PREPARING");

        // Not offered for PREPARING
        let (status, _) = send(
            &app.router,
            "POST",
            "/api/orders/order-001/actions",
            Some(json!({ "action": "restore" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &app.router,
            "POST",
            "/api/orders/order-001/actions",
            Some(json!({ "action": "explode" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_print_with_known_printer_records_notices() {
        let config = ControllerConfig {
            target: Some(Target {
                name: "TM-T88VI".into(),
                address: TargetAddress::Bluetooth("00:01:90:AA:BB:CC".into()),
                dialect: Dialect::EscPos,
            }),
            ..Default::default()
        };
        let app = app(config).await;

        let (status, body) = send(&app.router, "POST", "/api/orders/order-001/print", None).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(json_of(&body)["dispatch"], "started");

        let printed = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let (_, body) = send(&app.router, "GET", "/api/notices", None).await;
                let notices = json_of(&body);
                if notices[0]["event"] == "printed" {
                    return notices;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(printed[0]["message"], "Order #001 printed");
        assert_eq!(app.connector.sent().await.len(), 1);

        let (_, body) = send(&app.router, "GET", "/api/printer", None).await;
        assert_eq!(json_of(&body)["jobs_completed"], 1);
    }

    #[tokio::test]
    async fn test_recording_redirect() {
        let app = app(ControllerConfig::default()).await;
        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/orders/order-001/recording")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://recordings.example/001.mp3"
        );

        let (status, _) = send(&app.router, "GET", "/api/orders/order-002/recording", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_receipt_preview_and_transcript() {
        let app = app(ControllerConfig::default()).await;

        let (status, body) = send(&app.router, "GET", "/api/orders/order-001/receipt", None).await;
        assert_eq!(status, StatusCode::OK);
        let preview = String::from_utf8(body).unwrap();
        assert!(preview.contains("Order #001"));
        assert!(preview.contains("TOTAL: $12.00"));

        let (status, body) = send(
            &app.router,
            "GET",
            "/api/orders/order-001/receipt?dialect=escpos",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..2], &[0x1Bu8, 0x40]);

        let (_, body) = send(&app.router, "GET", "/api/orders/order-001/transcript", None).await;
        assert_eq!(
            json_of(&body),
            json!([
                { "speaker": "agent", "text": "Hi" },
                { "speaker": "user", "text": "Laksa" },
            ])
        );
    }

    #[tokio::test]
    async fn test_ingest() {
        let mut app = app(ControllerConfig::default()).await;

        let (status, body) = send(
            &app.router,
            "POST",
            "/api/orders",
            Some(json!({ "id": "order-003", "customerName": "Cy", "status": "NEW", "timestamp": 3000 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json_of(&body)["id"], "order-003");

        app.feed.changed().await.unwrap();
        assert_eq!(app.feed.orders()[0].id, "order-003");

        let (status, _) = send(
            &app.router,
            "POST",
            "/api/orders",
            Some(json!({ "id": "order-003", "status": "NEW" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(&app.router, "POST", "/api/orders", Some(json!({ "status": "LOST" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app.router, "POST", "/api/orders", Some(json!([1, 2]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
