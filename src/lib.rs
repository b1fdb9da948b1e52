//! # Raivo - Restaurant Order Dashboard
//!
//! Raivo shows incoming takeaway orders from a live document collection,
//! moves them through the kitchen workflow, and prints receipts on
//! Bluetooth or network thermal printers. It provides:
//!
//! - **Order feed**: a sorted, always-consistent snapshot of the orders collection
//! - **Receipt formatting**: orders become an inspectable print program
//! - **Protocols**: StarPRNT and ESC/POS command builders
//! - **Printer sessions**: discovery, one job at a time, transient or persistent links
//! - **Dashboard**: tabs, order cards, the chef's list, and an HTTP API
//!
//! ## Quick Start
//!
//! ```
//! use raivo::protocol::Dialect;
//! use raivo::receipt::{receipt_bytes, receipt_preview, sample_order, ReceiptLayout};
//!
//! let order = sample_order();
//! let layout = ReceiptLayout::default();
//!
//! // What staff would see on paper
//! let preview = receipt_preview(&order, &layout);
//! assert!(preview.contains("TAKEAWAY"));
//!
//! // Bytes for an Epson printer
//! let bytes = receipt_bytes(&order, &layout, Dialect::EscPos);
//! assert_eq!(&bytes[..2], &[0x1Bu8, 0x40]);
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`order`] | Order model and document decoding |
//! | [`store`] | Document store trait, in-memory store, order feed |
//! | [`receipt`] | Order to print program |
//! | [`components`] | Receipt building blocks |
//! | [`ir`] | Print program, optimizer, codegen, text preview |
//! | [`protocol`] | StarPRNT and ESC/POS command builders |
//! | [`printer`] | Printer models, session controller, discovery |
//! | [`transport`] | Bluetooth, network, and recording backends |
//! | [`dashboard`] | Dashboard view model |
//! | [`server`] | HTTP API |
//! | [`config`] | Command-line and environment configuration |
//! | [`error`] | Error types |
//!
//! ## Supported Printers
//!
//! - Epson TM-T88 series (ESC/POS, Bluetooth or TCP port 9100)
//! - Star TSP650II (StarPRNT, Bluetooth)

pub mod components;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod ir;
pub mod order;
pub mod printer;
pub mod protocol;
pub mod receipt;
pub mod server;
pub mod store;
pub mod transport;

// Re-exports for convenience
pub use error::RaivoError;
pub use order::{Order, OrderStatus};
pub use printer::PrinterController;
