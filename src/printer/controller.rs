//! # Printer Session Controller
//!
//! Front door for printing. [`PrinterController::print`] returns at once:
//! the job either starts on the runtime or waits in the pending slot until
//! discovery finds a printer.
//!
//! ## Pending Slot
//!
//! One order at most waits for discovery. Printing another order before a
//! printer answers replaces the waiting one (latest wins); the replacement is
//! logged and reported as [`Dispatch::Deferred`] with `replaced: true`.
//!
//! ## Discovery
//!
//! Only one search runs at a time. The first device whose name starts with
//! the configured prefix ends the search and becomes the target. Devices
//! that don't match change nothing. If the search cannot start, the next
//! `print` tries again.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::device::{ConnectionMode, Connector, DeviceInfo, Discovery, DiscoveryFilter, Target};
use super::event::PrintEvent;
use super::session::{JobContext, JobOutcome, JobState, PrinterSession, SessionInfo};
use crate::error::RaivoError;
use crate::order::Order;
use crate::receipt::ReceiptLayout;

/// Device name prefix accepted by default.
pub const DEFAULT_DEVICE_PREFIX: &str = "TM-T88";

/// Notices kept by the broadcast channel for slow subscribers.
const EVENT_BUFFER: usize = 64;

/// Controller settings.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub mode: ConnectionMode,
    pub layout: ReceiptLayout,
    pub filter: DiscoveryFilter,
    /// Known printer; skips discovery entirely
    pub target: Option<Target>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            mode: ConnectionMode::Transient,
            layout: ReceiptLayout::default(),
            filter: DiscoveryFilter::bluetooth(DEFAULT_DEVICE_PREFIX),
            target: None,
        }
    }
}

/// What `print` did with the order.
#[derive(Debug)]
pub enum Dispatch {
    /// The job is running; await the handle for its outcome
    Started(JoinHandle<JobOutcome>),
    /// No printer yet; the order waits for discovery
    Deferred { replaced: bool },
}

/// What `handle_discovered` did with a device.
#[derive(Debug)]
pub enum Discovered {
    /// Not a match, or no search in progress
    Ignored,
    /// Became the target; carries the pending job if one was launched
    Selected(Option<JoinHandle<JobOutcome>>),
}

/// Printer status for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct PrinterStatusView {
    pub state: JobState,
    pub connected: bool,
    pub jobs_completed: u64,
    pub target: Option<Target>,
    pub searching: bool,
    /// Order number waiting for discovery
    pub pending: Option<String>,
    pub mode: ConnectionMode,
}

#[derive(Default)]
struct DiscoveryState {
    target: Option<Target>,
    pending: Option<Order>,
    searching: bool,
}

struct Inner {
    session: Mutex<PrinterSession>,
    session_info: watch::Receiver<SessionInfo>,
    discovery_state: Mutex<DiscoveryState>,
    connector: Arc<dyn Connector>,
    discovery: Arc<dyn Discovery>,
    events: broadcast::Sender<PrintEvent>,
    config: ControllerConfig,
}

impl Inner {
    fn emit(&self, event: PrintEvent) {
        let _ = self.events.send(event);
    }
}

/// Cloneable handle to the printer session.
#[derive(Clone)]
pub struct PrinterController {
    inner: Arc<Inner>,
}

impl PrinterController {
    pub fn new(
        config: ControllerConfig,
        connector: Arc<dyn Connector>,
        discovery: Arc<dyn Discovery>,
    ) -> Self {
        let session = PrinterSession::new();
        let session_info = session.watch();
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let discovery_state = DiscoveryState {
            target: config.target.clone(),
            ..Default::default()
        };

        Self {
            inner: Arc::new(Inner {
                session: Mutex::new(session),
                session_info,
                discovery_state: Mutex::new(discovery_state),
                connector,
                discovery,
                events,
                config,
            }),
        }
    }

    /// Print an order without waiting for the printer.
    pub async fn print(&self, order: Order) -> Dispatch {
        let mut state = self.inner.discovery_state.lock().await;

        if let Some(target) = state.target.clone() {
            drop(state);
            debug!(order = %order.order_number(), "printer known, starting job");
            return Dispatch::Started(self.spawn_job(target, order));
        }

        let number = order.order_number().to_string();
        let replaced = match state.pending.replace(order) {
            Some(previous) => {
                warn!(
                    order = %number,
                    replaced = %previous.order_number(),
                    "order replaces the one waiting for discovery"
                );
                true
            }
            None => false,
        };
        info!(order = %number, "printer not found yet, order deferred");
        self.inner.emit(PrintEvent::Deferred {
            order: number,
            replaced,
        });

        if !state.searching {
            state.searching = true;
            drop(state);
            self.start_discovery();
        }

        Dispatch::Deferred { replaced }
    }

    fn spawn_job(&self, target: Target, order: Order) -> JoinHandle<JobOutcome> {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let mut session = inner.session.lock().await;
            let ctx = JobContext {
                connector: inner.connector.as_ref(),
                mode: inner.config.mode,
                layout: &inner.config.layout,
                events: &inner.events,
            };
            session.run(&ctx, &target, &order).await
        })
    }

    fn start_discovery(&self) {
        let this = self.clone();
        tokio::spawn(async move {
            let (tx, mut rx) = mpsc::channel(16);
            let filter = this.inner.config.filter.clone();

            info!(prefix = %filter.name_prefix, "starting printer discovery");
            this.inner.emit(PrintEvent::Searching);

            // Devices may arrive before `start` returns, so drain while it runs
            let mut start = this.inner.discovery.start(filter, tx);
            let mut started = false;
            loop {
                tokio::select! {
                    result = &mut start, if !started => {
                        if let Err(e) = result {
                            this.discovery_failed(e).await;
                            return;
                        }
                        started = true;
                    }
                    device = rx.recv() => match device {
                        Some(device) => {
                            if let Discovered::Selected(_) = this.handle_discovered(device).await {
                                return;
                            }
                        }
                        None => {
                            if !started {
                                if let Err(e) = (&mut start).await {
                                    this.discovery_failed(e).await;
                                    return;
                                }
                            }
                            break;
                        }
                    },
                }
            }

            // Search ended on its own without a match
            let mut state = this.inner.discovery_state.lock().await;
            if state.searching {
                info!("discovery ended without a matching printer");
                state.searching = false;
            }
        });
    }

    async fn discovery_failed(&self, e: RaivoError) {
        error!(error = %e, "error starting discovery");
        self.inner.discovery_state.lock().await.searching = false;
        self.inner.emit(PrintEvent::DiscoveryFailed);
    }

    /// Consider one discovery result.
    ///
    /// The first match while searching stops the search, becomes the target,
    /// and launches the pending job.
    pub async fn handle_discovered(&self, device: DeviceInfo) -> Discovered {
        if !self.inner.config.filter.matches(&device) {
            debug!(name = %device.name, "ignoring device");
            return Discovered::Ignored;
        }

        let mut state = self.inner.discovery_state.lock().await;
        if !state.searching {
            return Discovered::Ignored;
        }

        if let Err(e) = self.inner.discovery.stop().await {
            warn!(error = %e, "error stopping discovery");
        }

        let target = Target::from_device(device);
        info!(
            printer = %target.name,
            address = %target.address,
            dialect = %target.dialect,
            "found printer"
        );
        state.target = Some(target.clone());
        state.searching = false;
        let pending = state.pending.take();
        drop(state);

        self.inner.emit(PrintEvent::PrinterFound {
            name: target.name.clone(),
            address: target.address.to_string(),
        });

        Discovered::Selected(pending.map(|order| self.spawn_job(target, order)))
    }

    /// Point the controller at a known printer.
    pub async fn set_target(&self, target: Target) {
        self.inner.discovery_state.lock().await.target = Some(target);
    }

    /// Forget the printer so the next print searches again.
    pub async fn forget_target(&self) {
        self.inner.discovery_state.lock().await.target = None;
        self.inner.session.lock().await.disconnect().await;
    }

    /// Close a persistent connection, waiting for any running job first.
    pub async fn shutdown(&self) {
        self.inner.session.lock().await.disconnect().await;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PrintEvent> {
        self.inner.events.subscribe()
    }

    pub async fn snapshot(&self) -> PrinterStatusView {
        let info = *self.inner.session_info.borrow();
        let state = self.inner.discovery_state.lock().await;
        PrinterStatusView {
            state: info.state,
            connected: info.connected,
            jobs_completed: info.jobs_completed,
            target: state.target.clone(),
            searching: state.searching,
            pending: state.pending.as_ref().map(|o| o.order_number().to_string()),
            mode: self.inner.config.mode,
        }
    }
}
