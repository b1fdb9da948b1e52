//! # Printing Flow Tests
//!
//! Drive the whole path from the orders collection to the printer, with a
//! recording connector standing in for real hardware.

use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use raivo::OrderStatus;
use raivo::dashboard::{Dashboard, OrderAction};
use raivo::order::Order;
use raivo::printer::{
    ControllerConfig, DeviceInfo, Discovered, Dispatch, JobOutcome, PrintEvent,
    PrinterController, Target, TargetAddress,
};
use raivo::protocol::Dialect;
use raivo::receipt::{ReceiptLayout, receipt_bytes};
use raivo::store::{Document, MemoryStore, ORDERS_COLLECTION, OrderFeed};
use raivo::transport::{Recorded, RecordingConnector, StaticDiscovery};

// ============================================================================
// HELPERS
// ============================================================================

fn known_target() -> Target {
    Target {
        name: "TM-T88VI".into(),
        address: TargetAddress::Bluetooth("00:01:90:AA:BB:CC".into()),
        dialect: Dialect::EscPos,
    }
}

fn device(name: &str, mac: &str) -> DeviceInfo {
    DeviceInfo {
        name: name.into(),
        address: TargetAddress::Bluetooth(mac.into()),
    }
}

fn order(id: &str, customer: &str) -> Order {
    Order {
        id: id.into(),
        customer_name: Some(customer.into()),
        ..Default::default()
    }
}

async fn wait_for(events: &mut tokio::sync::broadcast::Receiver<PrintEvent>, wanted: &PrintEvent) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if &events.recv().await.unwrap() == wanted {
                return;
            }
        }
    })
    .await
    .expect("print event never arrived");
}

// ============================================================================
// SESSION
// ============================================================================

#[tokio::test]
async fn test_concurrent_prints_never_interleave() {
    let connector = RecordingConnector::new();
    connector.set_send_delay(Duration::from_millis(20)).await;
    let controller = PrinterController::new(
        ControllerConfig {
            target: Some(known_target()),
            ..Default::default()
        },
        Arc::new(connector.clone()),
        Arc::new(StaticDiscovery::new(vec![])),
    );

    let mut jobs = Vec::new();
    for (id, customer) in [("order-101", "Ana"), ("order-102", "Ben"), ("order-103", "Cy")] {
        match controller.print(order(id, customer)).await {
            Dispatch::Started(job) => jobs.push(job),
            other => panic!("expected a started job, got {:?}", other),
        }
    }
    for job in jobs {
        assert_eq!(job.await.unwrap(), JobOutcome::Printed);
    }

    // Transient mode: every job is a full connect/send/complete/disconnect run
    let log = connector.log().await;
    assert_eq!(log.len(), 12);
    for run in log.chunks(4) {
        assert_eq!(run[0], Recorded::Connect(known_target()));
        assert!(matches!(run[1], Recorded::Send(_)));
        assert_eq!(run[2], Recorded::Complete);
        assert_eq!(run[3], Recorded::Disconnect);
    }

    assert_eq!(controller.snapshot().await.jobs_completed, 3);
}

#[tokio::test]
async fn test_sent_bytes_match_receipt() {
    let connector = RecordingConnector::new();
    let layout = ReceiptLayout::default();
    let controller = PrinterController::new(
        ControllerConfig {
            target: Some(known_target()),
            layout,
            ..Default::default()
        },
        Arc::new(connector.clone()),
        Arc::new(StaticDiscovery::new(vec![])),
    );
    let ticket = order("order-777", "Dana");

    let Dispatch::Started(job) = controller.print(ticket.clone()).await else {
        panic!("expected a started job");
    };
    assert_eq!(job.await.unwrap(), JobOutcome::Printed);

    assert_eq!(
        connector.sent().await,
        vec![receipt_bytes(&ticket, &layout, Dialect::EscPos)]
    );
}

// ============================================================================
// DISCOVERY
// ============================================================================

#[tokio::test]
async fn test_discovery_skips_other_devices_then_prints() {
    let connector = RecordingConnector::new();
    let discovery = StaticDiscovery::new(vec![
        device("TM-m30II", "00:01:90:11:22:33"),
        device("Kitchen Speaker", "11:22:33:44:55:66"),
        device("TM-T88VI", "00:01:90:AA:BB:CC"),
    ]);
    let controller = PrinterController::new(
        ControllerConfig::default(),
        Arc::new(connector.clone()),
        Arc::new(discovery.clone()),
    );
    let mut events = controller.subscribe();

    assert!(matches!(
        controller.print(order("order-201", "Eve")).await,
        Dispatch::Deferred { replaced: false }
    ));
    wait_for(
        &mut events,
        &PrintEvent::Printed {
            order: "201".into(),
        },
    )
    .await;

    let view = controller.snapshot().await;
    assert_eq!(view.target, Some(known_target()));
    assert!(!view.searching);
    assert!(view.pending.is_none());
    assert_eq!(discovery.start_count(), 1);
    assert_eq!(discovery.stop_count(), 1);
    assert_eq!(connector.connect_count().await, 1);

    // The printer is known now; the next job starts straight away
    let Dispatch::Started(job) = controller.print(order("order-202", "Eve")).await else {
        panic!("expected a started job");
    };
    assert_eq!(job.await.unwrap(), JobOutcome::Printed);
    assert_eq!(discovery.start_count(), 1);
}

#[tokio::test]
async fn test_latest_deferred_order_is_the_one_printed() {
    let connector = RecordingConnector::new();
    let discovery = StaticDiscovery::new(vec![]).hold_open();
    let controller = PrinterController::new(
        ControllerConfig::default(),
        Arc::new(connector.clone()),
        Arc::new(discovery),
    );
    let first = order("order-301", "Fay");
    let second = order("order-302", "Gus");

    controller.print(first).await;
    assert!(matches!(
        controller.print(second.clone()).await,
        Dispatch::Deferred { replaced: true }
    ));

    let Discovered::Selected(Some(job)) = controller
        .handle_discovered(device("TM-T88V", "00:01:90:AA:BB:CC"))
        .await
    else {
        panic!("expected the pending job to start");
    };
    assert_eq!(job.await.unwrap(), JobOutcome::Printed);

    let layout = ReceiptLayout::default();
    assert_eq!(
        connector.sent().await,
        vec![receipt_bytes(&second, &layout, Dialect::EscPos)]
    );
}

// ============================================================================
// DASHBOARD
// ============================================================================

#[tokio::test]
async fn test_accept_moves_order_and_prints() {
    let store = Arc::new(MemoryStore::with_documents(
        ORDERS_COLLECTION,
        vec![Document {
            id: "order-401".into(),
            fields: json!({
                "customerName": "Hal",
                "status": "NEW",
                "timestamp": 1_718_043_200_000i64,
                "items": [{ "name": "Green Curry", "quantity": 1 }],
                "totalCost": 18.0
            }),
        }],
    ));
    let mut feed = OrderFeed::subscribe(store.clone(), ORDERS_COLLECTION)
        .await
        .unwrap();
    while feed.orders().is_empty() {
        feed.changed().await.unwrap();
    }

    let connector = RecordingConnector::new();
    let controller = PrinterController::new(
        ControllerConfig {
            target: Some(known_target()),
            ..Default::default()
        },
        Arc::new(connector.clone()),
        Arc::new(StaticDiscovery::new(vec![])),
    );
    let dashboard = Dashboard::new(feed.clone(), controller, ReceiptLayout::default());

    let outcome = dashboard
        .apply_action("order-401", OrderAction::Accept)
        .await
        .unwrap();
    assert_eq!(outcome.status, Some(OrderStatus::Preparing));
    let Some(Dispatch::Started(job)) = outcome.print else {
        panic!("accepting should print");
    };
    assert_eq!(job.await.unwrap(), JobOutcome::Printed);

    tokio::time::timeout(Duration::from_secs(5), async {
        while feed.find("order-401").and_then(|o| o.status) != Some(OrderStatus::Preparing) {
            feed.changed().await.unwrap();
        }
    })
    .await
    .expect("status never reached the store");

    let stored = store.get(ORDERS_COLLECTION, "order-401").await.unwrap();
    assert_eq!(stored["status"], "PREPARING");
    assert_eq!(stored["customerName"], "Hal");
    assert_eq!(connector.sent().await.len(), 1);
}
