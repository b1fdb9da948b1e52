//! # Printer Module
//!
//! Printer models, device traits, and the session controller that owns the
//! printer link.
//!
//! ## Modules
//!
//! - [`model`]: Printer hardware specifications and dialect detection
//! - [`device`]: Targets, connections, and discovery traits
//! - [`session`]: The job state machine on one printer link
//! - [`controller`]: `print(order)`, the pending slot, and discovery
//! - [`event`]: Notices published to the dashboard

pub mod controller;
pub mod device;
pub mod event;
pub mod model;
pub mod session;

pub use controller::{
    ControllerConfig, DEFAULT_DEVICE_PREFIX, Discovered, Dispatch, PrinterController,
    PrinterStatusView,
};
pub use device::{
    Completion, Connection, ConnectionMode, Connector, DeviceInfo, Discovery, DiscoveryFilter,
    PrinterStatus, Target, TargetAddress, TransportKind,
};
pub use event::PrintEvent;
pub use model::PrinterModel;
pub use session::{JobOutcome, JobState, PrinterSession};
