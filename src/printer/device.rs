//! # Devices and Connections
//!
//! What a printer is (a [`Target`]), how to reach it ([`Connector`] and
//! [`Connection`]), and how to find one ([`Discovery`]).
//!
//! The traits are the seam between the session controller and the transport
//! backends in [`crate::transport`].

use std::fmt;
use std::net::SocketAddr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::PrinterModel;
use crate::error::RaivoError;
use crate::protocol::Dialect;

/// Where a printer lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "address", rename_all = "lowercase")]
pub enum TargetAddress {
    /// Bluetooth MAC address, e.g. `00:01:90:AA:BB:CC`
    Bluetooth(String),
    /// TCP endpoint, usually port 9100
    Network(SocketAddr),
}

impl TargetAddress {
    pub fn kind(&self) -> TransportKind {
        match self {
            TargetAddress::Bluetooth(_) => TransportKind::Bluetooth,
            TargetAddress::Network(_) => TransportKind::Network,
        }
    }
}

impl fmt::Display for TargetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetAddress::Bluetooth(mac) => write!(f, "BT:{}", mac),
            TargetAddress::Network(addr) => write!(f, "TCP:{}", addr),
        }
    }
}

/// Transport family, used to scope discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Bluetooth,
    Network,
}

/// A device reported by discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub address: TargetAddress,
}

/// A printer the session can connect to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    pub address: TargetAddress,
    pub dialect: Dialect,
}

impl Target {
    /// Target for a discovered device, dialect guessed from its name.
    pub fn from_device(device: DeviceInfo) -> Self {
        let dialect = PrinterModel::from_device_name(&device.name).dialect;
        Self {
            name: device.name,
            address: device.address,
            dialect,
        }
    }
}

/// What discovery looks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryFilter {
    /// Accept only devices whose name starts with this
    pub name_prefix: String,
    pub transport: TransportKind,
}

impl DiscoveryFilter {
    pub fn bluetooth(name_prefix: impl Into<String>) -> Self {
        Self {
            name_prefix: name_prefix.into(),
            transport: TransportKind::Bluetooth,
        }
    }

    pub fn matches(&self, device: &DeviceInfo) -> bool {
        device.name.starts_with(&self.name_prefix) && device.address.kind() == self.transport
    }
}

/// Whether a connection outlives a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    /// Connect, print, disconnect for every job
    #[default]
    Transient,
    /// Connect once and keep the link open across jobs
    Persistent,
}

impl std::str::FromStr for ConnectionMode {
    type Err = RaivoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "transient" => Ok(ConnectionMode::Transient),
            "persistent" => Ok(ConnectionMode::Persistent),
            other => Err(RaivoError::Config(format!(
                "unknown connection mode '{}' (expected transient or persistent)",
                other
            ))),
        }
    }
}

/// Printer condition as reported before a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrinterStatus {
    Online,
    Offline,
    PaperEnd,
}

/// End-of-job report from the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Device result code, 0 on success. Logged, never shown to staff.
    pub code: i32,
}

impl Completion {
    pub const SUCCESS: Completion = Completion { code: 0 };

    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// An open link to a printer.
#[async_trait]
pub trait Connection: Send {
    /// Hand job bytes to the printer.
    async fn send(&mut self, data: &[u8]) -> Result<(), RaivoError>;

    /// Wait until the printer has finished the job that was sent.
    async fn wait_complete(&mut self) -> Result<Completion, RaivoError>;

    /// Ask the printer whether it can take a job.
    async fn status(&mut self) -> Result<PrinterStatus, RaivoError>;

    /// Close the link. Errors are reported but the connection is gone either way.
    async fn disconnect(&mut self) -> Result<(), RaivoError>;
}

/// Opens connections to targets.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, target: &Target) -> Result<Box<dyn Connection>, RaivoError>;
}

/// A device search.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// Start searching. Each device found is sent on `found` until
    /// [`Discovery::stop`] is called or the receiver goes away.
    ///
    /// Devices may be sent before `start` returns; the caller drains `found`
    /// while awaiting it. `stop` can be called while `start` is still running.
    async fn start(
        &self,
        filter: DiscoveryFilter,
        found: mpsc::Sender<DeviceInfo>,
    ) -> Result<(), RaivoError>;

    async fn stop(&self) -> Result<(), RaivoError>;
}
