//! # Configuration
//!
//! Command-line options with environment fallbacks (`RAIVO_*`). A `.env`
//! file in the working directory is loaded first, so any option can live
//! there instead.
//!
//! | Option | Environment | Default |
//! |--------|-------------|---------|
//! | `--listen` | `RAIVO_LISTEN` | `0.0.0.0:8080` |
//! | `--seed` | `RAIVO_SEED` | none |
//! | `--collection` | `RAIVO_COLLECTION` | `orders` |
//! | `--printer-addr` | `RAIVO_PRINTER_ADDR` | none (discover) |
//! | `--printer` | `RAIVO_PRINTER` | `TM-T88` |
//! | `--dialect` | `RAIVO_DIALECT` | from the printer name |
//! | `--device-prefix` | `RAIVO_DEVICE_PREFIX` | `TM-T88` |
//! | `--connection` | `RAIVO_CONNECTION` | transient, persistent for network |
//! | `--line-width` | `RAIVO_LINE_WIDTH` | `42` |
//! | `--utc-offset` | `RAIVO_UTC_OFFSET` | local time |
//! | `--scan-timeout` | `RAIVO_SCAN_TIMEOUT` | `30` seconds |
//! | `--dry-run` | `RAIVO_DRY_RUN` | off |
//!
//! A fixed printer address skips discovery. Addresses look like
//! `BT:00:01:90:AA:BB:CC`, `TCP:192.168.1.50:9100`, a bare MAC, or a bare
//! IP (port 9100 is assumed).

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use chrono::FixedOffset;
use clap::Args;

use crate::error::RaivoError;
use crate::printer::{
    ConnectionMode, ControllerConfig, DEFAULT_DEVICE_PREFIX, DiscoveryFilter, PrinterModel,
    Target, TargetAddress,
};
use crate::protocol::Dialect;
use crate::receipt::ReceiptLayout;
use crate::transport::bluetooth::is_valid_mac;
use crate::transport::network::DEFAULT_PORT;

/// Printer options shared by every command that prints.
#[derive(Args, Debug, Clone)]
pub struct PrinterArgs {
    /// Fixed printer address; skips discovery
    #[arg(long, env = "RAIVO_PRINTER_ADDR")]
    pub printer_addr: Option<String>,

    /// Name of the fixed printer (picks the dialect when --dialect is unset)
    #[arg(long = "printer", env = "RAIVO_PRINTER", default_value = DEFAULT_DEVICE_PREFIX)]
    pub printer_name: String,

    /// Printer command language: escpos or starprnt
    #[arg(long, env = "RAIVO_DIALECT")]
    pub dialect: Option<Dialect>,

    /// Accept discovered printers whose name starts with this
    #[arg(long, env = "RAIVO_DEVICE_PREFIX", default_value = DEFAULT_DEVICE_PREFIX)]
    pub device_prefix: String,

    /// transient (connect per job) or persistent (keep the link open)
    #[arg(long, env = "RAIVO_CONNECTION")]
    pub connection: Option<ConnectionMode>,

    /// Characters per receipt line
    #[arg(long, env = "RAIVO_LINE_WIDTH", default_value_t = 42)]
    pub line_width: usize,

    /// Timezone for printed times, e.g. +10:00 (defaults to local time)
    #[arg(long, env = "RAIVO_UTC_OFFSET", allow_hyphen_values = true)]
    pub utc_offset: Option<FixedOffset>,

    /// Seconds a Bluetooth scan runs before giving up
    #[arg(long, env = "RAIVO_SCAN_TIMEOUT", default_value_t = 30)]
    pub scan_timeout: u64,

    /// Record jobs in memory instead of printing
    #[arg(long, env = "RAIVO_DRY_RUN")]
    pub dry_run: bool,
}

/// Validated printer settings.
#[derive(Debug, Clone)]
pub struct PrinterSettings {
    pub target: Option<Target>,
    pub filter: DiscoveryFilter,
    pub mode: ConnectionMode,
    pub layout: ReceiptLayout,
    pub scan_timeout: Duration,
    pub dry_run: bool,
}

impl PrinterSettings {
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            mode: self.mode,
            layout: self.layout,
            filter: self.filter.clone(),
            target: self.target.clone(),
        }
    }

    /// Dialect used when no printer has been found yet.
    pub fn dialect(&self) -> Dialect {
        self.target
            .as_ref()
            .map(|t| t.dialect)
            .unwrap_or_else(|| PrinterModel::from_device_name(&self.filter.name_prefix).dialect)
    }
}

impl PrinterArgs {
    pub fn settings(&self) -> Result<PrinterSettings, RaivoError> {
        if self.line_width == 0 {
            return Err(RaivoError::Config("line width must be at least 1".into()));
        }
        if self.device_prefix.trim().is_empty() {
            return Err(RaivoError::Config("device prefix cannot be empty".into()));
        }

        let target = match self.printer_addr.as_deref() {
            Some(addr) => {
                let address = parse_address(addr)?;
                let dialect = self
                    .dialect
                    .unwrap_or_else(|| PrinterModel::from_device_name(&self.printer_name).dialect);
                Some(Target {
                    name: self.printer_name.clone(),
                    address,
                    dialect,
                })
            }
            None => None,
        };

        // Fixed network printers keep their link open by default
        let mode = self.connection.unwrap_or(match &target {
            Some(Target {
                address: TargetAddress::Network(_),
                ..
            }) => ConnectionMode::Persistent,
            _ => ConnectionMode::Transient,
        });

        let mut layout = match self.utc_offset {
            Some(offset) => ReceiptLayout {
                offset,
                ..ReceiptLayout::default()
            },
            None => ReceiptLayout::local(),
        };
        layout.line_width = self.line_width;

        Ok(PrinterSettings {
            target,
            filter: DiscoveryFilter::bluetooth(self.device_prefix.trim()),
            mode,
            layout,
            scan_timeout: Duration::from_secs(self.scan_timeout),
            dry_run: self.dry_run,
        })
    }
}

/// Parse a printer address.
pub fn parse_address(s: &str) -> Result<TargetAddress, RaivoError> {
    let s = s.trim();
    let upper = s.to_ascii_uppercase();

    if upper.starts_with("BT:") {
        let mac = &s[3..];
        if !is_valid_mac(mac) {
            return Err(RaivoError::Config(format!("invalid Bluetooth address '{}'", mac)));
        }
        return Ok(TargetAddress::Bluetooth(mac.to_ascii_uppercase()));
    }
    if upper.starts_with("TCP:") {
        return parse_socket(&s[4..]);
    }
    if is_valid_mac(s) {
        return Ok(TargetAddress::Bluetooth(upper));
    }
    parse_socket(s)
}

fn parse_socket(s: &str) -> Result<TargetAddress, RaivoError> {
    if let Ok(addr) = s.parse::<SocketAddr>() {
        return Ok(TargetAddress::Network(addr));
    }
    s.parse::<IpAddr>()
        .map(|ip| TargetAddress::Network(SocketAddr::new(ip, DEFAULT_PORT)))
        .map_err(|_| RaivoError::Config(format!("invalid printer address '{}'", s)))
}

/// Options for `raivo serve`.
#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(long, env = "RAIVO_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// JSON file of orders to start with
    #[arg(long, env = "RAIVO_SEED")]
    pub seed: Option<PathBuf>,

    /// Collection holding the orders
    #[arg(long, env = "RAIVO_COLLECTION", default_value = crate::store::ORDERS_COLLECTION)]
    pub collection: String,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: SocketAddr,
    pub seed: Option<PathBuf>,
    pub collection: String,
    pub printer: PrinterSettings,
}

impl ServerConfig {
    pub fn from_args(server: &ServerArgs, printer: &PrinterArgs) -> Result<Self, RaivoError> {
        if server.collection.trim().is_empty() {
            return Err(RaivoError::Config("collection name cannot be empty".into()));
        }
        if let Some(seed) = &server.seed {
            if !seed.is_file() {
                return Err(RaivoError::Config(format!(
                    "seed file {} does not exist",
                    seed.display()
                )));
            }
        }
        Ok(Self {
            listen_addr: server.listen,
            seed: server.seed.clone(),
            collection: server.collection.clone(),
            printer: printer.settings()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        printer: PrinterArgs,
    }

    fn settings(args: &[&str]) -> Result<PrinterSettings, RaivoError> {
        let mut argv = vec!["raivo"];
        argv.extend_from_slice(args);
        TestCli::parse_from(argv).printer.settings()
    }

    #[test]
    fn test_parse_address_forms() {
        assert_eq!(
            parse_address("BT:00:01:90:aa:bb:cc").unwrap(),
            TargetAddress::Bluetooth("00:01:90:AA:BB:CC".into())
        );
        assert_eq!(
            parse_address("00:01:90:aa:bb:cc").unwrap(),
            TargetAddress::Bluetooth("00:01:90:AA:BB:CC".into())
        );
        assert_eq!(
            parse_address("TCP:192.168.1.50:9101").unwrap(),
            TargetAddress::Network("192.168.1.50:9101".parse().unwrap())
        );
        assert_eq!(
            parse_address("192.168.1.50").unwrap(),
            TargetAddress::Network("192.168.1.50:9100".parse().unwrap())
        );
        assert!(parse_address("BT:nope").is_err());
        assert!(parse_address("printer.local").is_err());
    }

    #[test]
    fn test_default_is_bluetooth_discovery() {
        let settings = settings(&["--utc-offset", "+00:00"]).unwrap();
        assert!(settings.target.is_none());
        assert_eq!(settings.mode, ConnectionMode::Transient);
        assert_eq!(settings.filter, DiscoveryFilter::bluetooth("TM-T88"));
        assert_eq!(settings.layout, ReceiptLayout::default());
    }

    #[test]
    fn test_fixed_network_printer_is_persistent() {
        let settings = settings(&[
            "--printer-addr",
            "10.0.0.5",
            "--printer",
            "TSP650II",
            "--utc-offset",
            "+00:00",
        ])
        .unwrap();
        let target = settings.target.unwrap();
        assert_eq!(target.dialect, Dialect::StarPrnt);
        assert_eq!(settings.mode, ConnectionMode::Persistent);
    }

    #[test]
    fn test_explicit_options_win() {
        let settings = settings(&[
            "--printer-addr",
            "10.0.0.5",
            "--connection",
            "transient",
            "--dialect",
            "escpos",
            "--printer",
            "TSP650II",
            "--line-width",
            "48",
            "--utc-offset",
            "+10:00",
        ])
        .unwrap();
        assert_eq!(settings.mode, ConnectionMode::Transient);
        assert_eq!(settings.target.unwrap().dialect, Dialect::EscPos);
        assert_eq!(settings.layout.line_width, 48);
        assert_eq!(settings.layout.offset, FixedOffset::east_opt(10 * 3600).unwrap());
    }

    #[test]
    fn test_zero_line_width_rejected() {
        assert!(matches!(
            settings(&["--line-width", "0"]),
            Err(RaivoError::Config(_))
        ));
    }
}
