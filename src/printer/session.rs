//! # Printer Session
//!
//! The owned state of one printer link and the job state machine that runs
//! on it.
//!
//! ```text
//!          ┌──────────── connect/format/send error ────────────┐
//!          ▼                                                   │
//!        Idle ──► Connecting ──► Sending ──► Done              │
//!                     │             │   └──► Failed (device)   │
//!                     └─────────────┴──────────────────────────┘
//! ```
//!
//! The controller keeps the session behind one async mutex and holds the
//! lock for a whole job, so two jobs never interleave bytes on one link.

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::{error, info, warn};

use super::device::{ConnectionMode, Connector, PrinterStatus, Target};
use super::event::PrintEvent;
use crate::error::RaivoError;
use crate::order::Order;
use crate::protocol::Dialect;
use crate::receipt::{ReceiptLayout, receipt_bytes};

/// Largest job accepted, in bytes. Receipt printers buffer little and a job
/// this size means something upstream went wrong.
pub const MAX_JOB_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    #[default]
    Idle,
    Connecting,
    Sending,
    Done,
    Failed,
}

/// How a job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Printed,
    /// The printer is reachable but cannot print right now
    SoftFailure(PrinterStatus),
    /// Generic message suitable for staff
    Failed(String),
}

/// Session facts published for status views while a job holds the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SessionInfo {
    pub state: JobState,
    pub connected: bool,
    pub jobs_completed: u64,
}

/// Everything a job needs besides the session itself.
pub struct JobContext<'a> {
    pub connector: &'a dyn Connector,
    pub mode: ConnectionMode,
    pub layout: &'a ReceiptLayout,
    pub events: &'a broadcast::Sender<PrintEvent>,
}

impl JobContext<'_> {
    fn emit(&self, event: PrintEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

struct JobError {
    message: &'static str,
    source: RaivoError,
}

impl JobError {
    fn new(message: &'static str) -> impl FnOnce(RaivoError) -> JobError {
        move |source| JobError { message, source }
    }
}

/// Compile an order into job bytes for a dialect.
pub fn build_job(
    order: &Order,
    layout: &ReceiptLayout,
    dialect: Dialect,
) -> Result<Vec<u8>, RaivoError> {
    let data = receipt_bytes(order, layout, dialect);
    if data.len() > MAX_JOB_BYTES {
        return Err(RaivoError::InvalidCommand(format!(
            "receipt is {} bytes, limit is {}",
            data.len(),
            MAX_JOB_BYTES
        )));
    }
    Ok(data)
}

/// One printer link: target, live connection, and job state.
pub struct PrinterSession {
    target: Option<Target>,
    connection: Option<Box<dyn super::Connection>>,
    info: SessionInfo,
    info_tx: watch::Sender<SessionInfo>,
}

impl Default for PrinterSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PrinterSession {
    pub fn new() -> Self {
        let (info_tx, _) = watch::channel(SessionInfo::default());
        Self {
            target: None,
            connection: None,
            info: SessionInfo::default(),
            info_tx,
        }
    }

    pub fn state(&self) -> JobState {
        self.info.state
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn jobs_completed(&self) -> u64 {
        self.info.jobs_completed
    }

    /// Follow session facts without taking the session lock.
    pub fn watch(&self) -> watch::Receiver<SessionInfo> {
        self.info_tx.subscribe()
    }

    fn publish(&mut self) {
        self.info.connected = self.connection.is_some();
        self.info_tx.send_replace(self.info);
    }

    fn set_state(&mut self, state: JobState) {
        self.info.state = state;
        self.publish();
    }

    /// Close and forget the connection, if any.
    pub async fn disconnect(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            if let Err(e) = connection.disconnect().await {
                warn!(error = %e, "error disconnecting printer");
            }
        }
        self.publish();
    }

    /// Run one print job to the end.
    pub async fn run(&mut self, ctx: &JobContext<'_>, target: &Target, order: &Order) -> JobOutcome {
        let number = order.order_number().to_string();

        match self.execute(ctx, target, order, &number).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(order = %number, error = %err.source, "{}", err.message);
                self.disconnect().await;
                self.set_state(JobState::Idle);
                ctx.emit(PrintEvent::Failed {
                    order: number,
                    message: err.message.to_string(),
                });
                JobOutcome::Failed(err.message.to_string())
            }
        }
    }

    async fn execute(
        &mut self,
        ctx: &JobContext<'_>,
        target: &Target,
        order: &Order,
        number: &str,
    ) -> Result<JobOutcome, JobError> {
        if self.target.as_ref() != Some(target) {
            if self.connection.is_some() {
                info!(printer = %target.name, "printer changed, dropping old connection");
                self.disconnect().await;
            }
            self.target = Some(target.clone());
        }

        self.set_state(JobState::Connecting);
        ctx.emit(PrintEvent::Connecting {
            order: number.to_string(),
        });

        let data = build_job(order, ctx.layout, target.dialect)
            .map_err(JobError::new("Could not prepare the receipt"))?;

        if self.connection.is_none() {
            info!(printer = %target.name, address = %target.address, "connecting");
            let connection = ctx
                .connector
                .connect(target)
                .await
                .map_err(JobError::new("Could not connect to the printer"))?;
            self.connection = Some(connection);
            self.publish();
        }

        if ctx.mode == ConnectionMode::Persistent {
            let status = self
                .connection_mut()?
                .status()
                .await
                .map_err(JobError::new("Could not reach the printer"))?;
            match status {
                PrinterStatus::Online => {}
                PrinterStatus::Offline => {
                    warn!(order = %number, "printer offline, reconnecting next job");
                    self.disconnect().await;
                    return Ok(self.soft_failure(ctx, number, status, "Printer is offline"));
                }
                PrinterStatus::PaperEnd => {
                    warn!(order = %number, "printer out of paper");
                    return Ok(self.soft_failure(ctx, number, status, "Printer is out of paper"));
                }
            }
        }

        self.set_state(JobState::Sending);
        ctx.emit(PrintEvent::Sending {
            order: number.to_string(),
        });

        let connection = self.connection_mut()?;
        connection
            .send(&data)
            .await
            .map_err(JobError::new("Could not send the receipt"))?;
        info!(order = %number, bytes = data.len(), "receipt sent, waiting for printer");

        let completion = connection
            .wait_complete()
            .await
            .map_err(JobError::new("Lost the printer while printing"))?;

        if ctx.mode == ConnectionMode::Transient {
            self.disconnect().await;
        }

        if completion.is_success() {
            self.info.jobs_completed += 1;
            self.set_state(JobState::Done);
            info!(order = %number, "print job finished");
            ctx.emit(PrintEvent::Printed {
                order: number.to_string(),
            });
            Ok(JobOutcome::Printed)
        } else {
            warn!(order = %number, code = completion.code, "printer reported job error");
            self.set_state(JobState::Failed);
            let message = "Printer reported an error";
            ctx.emit(PrintEvent::Failed {
                order: number.to_string(),
                message: message.to_string(),
            });
            Ok(JobOutcome::Failed(message.to_string()))
        }
    }

    fn connection_mut(&mut self) -> Result<&mut Box<dyn super::Connection>, JobError> {
        self.connection.as_mut().ok_or_else(|| JobError {
            message: "Could not connect to the printer",
            source: RaivoError::Printer("no open connection".into()),
        })
    }

    fn soft_failure(
        &mut self,
        ctx: &JobContext<'_>,
        number: &str,
        status: PrinterStatus,
        message: &str,
    ) -> JobOutcome {
        self.set_state(JobState::Idle);
        ctx.emit(PrintEvent::Warning {
            order: number.to_string(),
            message: message.to_string(),
        });
        JobOutcome::SoftFailure(status)
    }
}
