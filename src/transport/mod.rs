//! # Printer Transport Layer
//!
//! Backends behind the [`Connector`](crate::printer::Connector) and
//! [`Discovery`](crate::printer::Discovery) traits.
//!
//! ## Available Transports
//!
//! - [`bluetooth`]: Bluetooth RFCOMM (Linux)
//! - [`network`]: Raw TCP on port 9100
//! - [`discovery`]: Bluetooth discovery through `bluetoothctl`
//! - [`recording`]: In-memory printer for tests and dry runs

pub mod bluetooth;
pub mod discovery;
pub mod network;
pub mod recording;

use async_trait::async_trait;

use crate::error::RaivoError;
use crate::printer::{Connection, Connector, Target, TargetAddress};

pub use bluetooth::{BluetoothConnector, BluetoothTransport};
pub use discovery::BluetoothctlDiscovery;
pub use network::NetworkConnector;
pub use recording::{Recorded, RecordingConnector, StaticDiscovery};

/// Picks the backend from the target's address.
#[derive(Debug, Clone, Default)]
pub struct AutoConnector {
    pub bluetooth: BluetoothConnector,
    pub network: NetworkConnector,
}

#[async_trait]
impl Connector for AutoConnector {
    async fn connect(&self, target: &Target) -> Result<Box<dyn Connection>, RaivoError> {
        match target.address {
            TargetAddress::Bluetooth(_) => self.bluetooth.connect(target).await,
            TargetAddress::Network(_) => self.network.connect(target).await,
        }
    }
}
