//! In-memory printer and discovery doubles.
//!
//! [`RecordingConnector`] keeps a log of everything the session does to the
//! "printer", so jobs can be checked byte for byte without hardware. The
//! `--dry-run` flag of `print` and `serve` prints through it too.
//!
//! [`StaticDiscovery`] reports a fixed list of devices.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

use crate::error::RaivoError;
use crate::printer::{
    Completion, Connection, Connector, DeviceInfo, Discovery, DiscoveryFilter, PrinterStatus,
    Target,
};

/// One thing done to a recorded printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Connect(Target),
    Send(Vec<u8>),
    Complete,
    Disconnect,
}

struct Shared {
    log: Mutex<Vec<Recorded>>,
    status: Mutex<PrinterStatus>,
    fail_connect: AtomicBool,
    fail_send: AtomicBool,
    completion_code: AtomicI32,
    send_delay: Mutex<Duration>,
}

/// Connector whose printers only record what they are told.
#[derive(Clone)]
pub struct RecordingConnector {
    shared: Arc<Shared>,
}

impl Default for RecordingConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingConnector {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                log: Mutex::new(Vec::new()),
                status: Mutex::new(PrinterStatus::Online),
                fail_connect: AtomicBool::new(false),
                fail_send: AtomicBool::new(false),
                completion_code: AtomicI32::new(0),
                send_delay: Mutex::new(Duration::ZERO),
            }),
        }
    }

    pub fn fail_connect(&self, fail: bool) {
        self.shared.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub fn fail_send(&self, fail: bool) {
        self.shared.fail_send.store(fail, Ordering::SeqCst);
    }

    /// Device code reported when a job completes.
    pub fn set_completion_code(&self, code: i32) {
        self.shared.completion_code.store(code, Ordering::SeqCst);
    }

    pub async fn set_status(&self, status: PrinterStatus) {
        *self.shared.status.lock().await = status;
    }

    /// Make every send take this long, to widen race windows.
    pub async fn set_send_delay(&self, delay: Duration) {
        *self.shared.send_delay.lock().await = delay;
    }

    pub async fn log(&self) -> Vec<Recorded> {
        self.shared.log.lock().await.clone()
    }

    pub async fn connect_count(&self) -> usize {
        self.shared
            .log
            .lock()
            .await
            .iter()
            .filter(|r| matches!(r, Recorded::Connect(_)))
            .count()
    }

    /// Every job payload, in order.
    pub async fn sent(&self) -> Vec<Vec<u8>> {
        self.shared
            .log
            .lock()
            .await
            .iter()
            .filter_map(|r| match r {
                Recorded::Send(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Connector for RecordingConnector {
    async fn connect(&self, target: &Target) -> Result<Box<dyn Connection>, RaivoError> {
        if self.shared.fail_connect.load(Ordering::SeqCst) {
            return Err(RaivoError::Transport(format!(
                "{} did not answer",
                target.address
            )));
        }
        self.shared
            .log
            .lock()
            .await
            .push(Recorded::Connect(target.clone()));
        Ok(Box::new(RecordingConnection {
            shared: self.shared.clone(),
            open: true,
        }))
    }
}

struct RecordingConnection {
    shared: Arc<Shared>,
    open: bool,
}

impl RecordingConnection {
    fn check_open(&self) -> Result<(), RaivoError> {
        if self.open {
            Ok(())
        } else {
            Err(RaivoError::Transport("connection closed".into()))
        }
    }
}

#[async_trait]
impl Connection for RecordingConnection {
    async fn send(&mut self, data: &[u8]) -> Result<(), RaivoError> {
        self.check_open()?;
        if self.shared.fail_send.load(Ordering::SeqCst) {
            return Err(RaivoError::Transport("write failed: broken pipe".into()));
        }
        let delay = *self.shared.send_delay.lock().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        debug!(bytes = data.len(), "recorded job");
        self.shared
            .log
            .lock()
            .await
            .push(Recorded::Send(data.to_vec()));
        Ok(())
    }

    async fn wait_complete(&mut self) -> Result<Completion, RaivoError> {
        self.check_open()?;
        self.shared.log.lock().await.push(Recorded::Complete);
        Ok(Completion {
            code: self.shared.completion_code.load(Ordering::SeqCst),
        })
    }

    async fn status(&mut self) -> Result<PrinterStatus, RaivoError> {
        self.check_open()?;
        Ok(*self.shared.status.lock().await)
    }

    async fn disconnect(&mut self) -> Result<(), RaivoError> {
        if self.open {
            self.open = false;
            self.shared.log.lock().await.push(Recorded::Disconnect);
        }
        Ok(())
    }
}

// ============================================================================
// DISCOVERY
// ============================================================================

#[derive(Default)]
struct DiscoveryShared {
    held: std::sync::Mutex<Option<mpsc::Sender<DeviceInfo>>>,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

/// Discovery that reports a fixed device list.
///
/// By default the search ends once the list is sent. With
/// [`StaticDiscovery::hold_open`] it stays open until stopped, like a real
/// scan that has not found anything yet.
#[derive(Clone)]
pub struct StaticDiscovery {
    devices: Vec<DeviceInfo>,
    hold_open: bool,
    fail_start: bool,
    report_before_return: bool,
    shared: Arc<DiscoveryShared>,
}

impl StaticDiscovery {
    pub fn new(devices: Vec<DeviceInfo>) -> Self {
        Self {
            devices,
            hold_open: false,
            fail_start: false,
            report_before_return: false,
            shared: Arc::default(),
        }
    }

    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    pub fn fail_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Send every device from inside `start`, waiting on the receiver, the
    /// way a backend listing already-paired devices might.
    pub fn report_before_return(mut self) -> Self {
        self.report_before_return = true;
        self
    }

    pub fn start_count(&self) -> usize {
        self.shared.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.shared.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Discovery for StaticDiscovery {
    async fn start(
        &self,
        _filter: DiscoveryFilter,
        found: mpsc::Sender<DeviceInfo>,
    ) -> Result<(), RaivoError> {
        self.shared.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            return Err(RaivoError::Discovery("adapter unavailable".into()));
        }

        let devices = self.devices.clone();
        if self.report_before_return {
            for device in devices {
                if found.send(device).await.is_err() {
                    break;
                }
            }
        } else {
            let sender = found.clone();
            tokio::spawn(async move {
                for device in devices {
                    if sender.send(device).await.is_err() {
                        break;
                    }
                }
            });
        }

        if self.hold_open {
            if let Ok(mut held) = self.shared.held.lock() {
                *held = Some(found);
            }
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), RaivoError> {
        self.shared.stops.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut held) = self.shared.held.lock() {
            held.take();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::{TargetAddress, TransportKind};
    use crate::protocol::Dialect;

    fn target() -> Target {
        Target {
            name: "TM-T88VI".into(),
            address: TargetAddress::Bluetooth("00:01:90:AA:BB:CC".into()),
            dialect: Dialect::EscPos,
        }
    }

    #[tokio::test]
    async fn test_records_job() {
        let connector = RecordingConnector::new();
        let mut conn = connector.connect(&target()).await.unwrap();
        conn.send(&[1, 2, 3]).await.unwrap();
        conn.wait_complete().await.unwrap();
        conn.disconnect().await.unwrap();
        conn.disconnect().await.unwrap();

        assert_eq!(
            connector.log().await,
            vec![
                Recorded::Connect(target()),
                Recorded::Send(vec![1, 2, 3]),
                Recorded::Complete,
                Recorded::Disconnect,
            ]
        );
    }

    #[tokio::test]
    async fn test_closed_connection_rejects_send() {
        let connector = RecordingConnector::new();
        let mut conn = connector.connect(&target()).await.unwrap();
        conn.disconnect().await.unwrap();
        assert!(conn.send(&[1]).await.is_err());
    }

    #[tokio::test]
    async fn test_static_discovery_reports_devices() {
        let device = DeviceInfo {
            name: "TM-T88VI".into(),
            address: TargetAddress::Bluetooth("00:01:90:AA:BB:CC".into()),
        };
        let discovery = StaticDiscovery::new(vec![device.clone()]);
        let (tx, mut rx) = mpsc::channel(4);
        let filter = DiscoveryFilter {
            name_prefix: "TM".into(),
            transport: TransportKind::Bluetooth,
        };
        discovery.start(filter, tx).await.unwrap();

        assert_eq!(rx.recv().await, Some(device));
        assert_eq!(rx.recv().await, None);
        assert_eq!(discovery.start_count(), 1);
    }
}
