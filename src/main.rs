//! # Raivo CLI
//!
//! Command-line interface for the order dashboard.
//!
//! ## Usage
//!
//! ```bash
//! # Run the dashboard API, discovering a TM-T88 over Bluetooth
//! raivo serve --seed orders.json
//!
//! # Use a fixed network printer with a persistent connection
//! raivo serve --printer-addr 192.168.1.50
//!
//! # Print the sample order (or an order document from a file)
//! raivo print
//! raivo print --order order.json
//!
//! # Show a receipt without printing
//! raivo preview
//! raivo preview --dialect starprnt --hex
//!
//! # List nearby Bluetooth printers
//! raivo discover
//! ```
//!
//! Every option can also be set through a `RAIVO_*` environment variable or
//! a `.env` file. Set `RUST_LOG=debug` for detailed logs.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use raivo::{
    RaivoError,
    config::{PrinterArgs, PrinterSettings, ServerArgs, ServerConfig},
    dashboard::Dashboard,
    order::Order,
    printer::{
        Connector, DeviceInfo, Discovery, Dispatch, JobOutcome, PrintEvent, PrinterController,
        PrinterModel,
    },
    receipt::{receipt_bytes, receipt_preview, sample_order},
    server,
    store::{Document, MemoryStore, OrderFeed},
    transport::{AutoConnector, BluetoothctlDiscovery, RecordingConnector},
};

/// Raivo - Restaurant order dashboard with receipt printing
#[derive(Parser, Debug)]
#[command(name = "raivo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the dashboard HTTP API
    Serve {
        #[command(flatten)]
        server: ServerArgs,

        #[command(flatten)]
        printer: PrinterArgs,
    },

    /// Print one order's receipt
    Print {
        /// Order document (JSON); prints the sample order when omitted
        #[arg(long, value_name = "FILE")]
        order: Option<PathBuf>,

        #[command(flatten)]
        printer: PrinterArgs,
    },

    /// Show a receipt without printing
    Preview {
        /// Order document (JSON); previews the sample order when omitted
        #[arg(long, value_name = "FILE")]
        order: Option<PathBuf>,

        /// Dump printer bytes instead of the text preview
        #[arg(long)]
        hex: bool,

        #[command(flatten)]
        printer: PrinterArgs,
    },

    /// List nearby Bluetooth printers
    Discover {
        /// Seconds to scan
        #[arg(long, default_value_t = 10)]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    setup_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .init();
}

async fn run() -> Result<(), RaivoError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { server, printer } => {
            let config = ServerConfig::from_args(&server, &printer)?;
            serve(config).await
        }
        Commands::Print { order, printer } => {
            let settings = printer.settings()?;
            let order = load_order(order.as_deref())?;
            print_once(&settings, order).await
        }
        Commands::Preview {
            order,
            hex,
            printer,
        } => {
            let settings = printer.settings()?;
            let order = load_order(order.as_deref())?;
            if hex {
                let bytes = receipt_bytes(&order, &settings.layout, settings.dialect());
                println!("{}", hex_dump(&bytes));
            } else {
                println!("{}", receipt_preview(&order, &settings.layout));
            }
            Ok(())
        }
        Commands::Discover { timeout } => discover(Duration::from_secs(timeout)).await,
    }
}

fn connector(settings: &PrinterSettings) -> Arc<dyn Connector> {
    if settings.dry_run {
        info!("dry run: jobs are recorded, not printed");
        Arc::new(RecordingConnector::new())
    } else {
        Arc::new(AutoConnector::default())
    }
}

fn controller(settings: &PrinterSettings) -> PrinterController {
    PrinterController::new(
        settings.controller_config(),
        connector(settings),
        Arc::new(BluetoothctlDiscovery::new(settings.scan_timeout)),
    )
}

async fn serve(config: ServerConfig) -> Result<(), RaivoError> {
    let store = match &config.seed {
        Some(path) => {
            info!(seed = %path.display(), "loading seed orders");
            MemoryStore::from_seed_file(&config.collection, path)?
        }
        None => MemoryStore::new(),
    };
    let feed = OrderFeed::subscribe(Arc::new(store), &config.collection).await?;

    match &config.printer.target {
        Some(target) => info!(
            printer = %target.name,
            address = %target.address,
            dialect = %target.dialect,
            mode = ?config.printer.mode,
            "using fixed printer"
        ),
        None => info!(
            prefix = %config.printer.filter.name_prefix,
            "printer will be discovered on first print"
        ),
    }

    let printer = controller(&config.printer);
    let dashboard = Dashboard::new(feed, printer, config.printer.layout);

    println!("Raivo dashboard starting...");
    println!("Listening on: http://{}/api/tabs", config.listen_addr);
    println!();

    server::serve(config.listen_addr, dashboard).await
}

/// Print one order and wait for the result.
async fn print_once(settings: &PrinterSettings, order: Order) -> Result<(), RaivoError> {
    let controller = controller(settings);
    let mut events = controller.subscribe();
    let number = order.order_number().to_string();

    println!("Printing order #{}...", number);
    let outcome = match controller.print(order).await {
        Dispatch::Started(job) => job
            .await
            .map_err(|e| RaivoError::Printer(format!("print task failed: {}", e)))?,
        Dispatch::Deferred { .. } => {
            let wait = settings.scan_timeout + Duration::from_secs(30);
            tokio::time::timeout(wait, wait_for_job(&mut events))
                .await
                .map_err(|_| RaivoError::Discovery("no printer found".into()))??
        }
    };
    controller.shutdown().await;

    match outcome {
        JobOutcome::Printed => {
            println!("Printed successfully!");
            Ok(())
        }
        JobOutcome::SoftFailure(status) => Err(RaivoError::Printer(format!(
            "printer is not ready ({:?})",
            status
        ))),
        JobOutcome::Failed(message) => Err(RaivoError::Printer(message)),
    }
}

/// Follow notices until a deferred job finishes.
async fn wait_for_job(
    events: &mut tokio::sync::broadcast::Receiver<PrintEvent>,
) -> Result<JobOutcome, RaivoError> {
    loop {
        let event = events
            .recv()
            .await
            .map_err(|e| RaivoError::Printer(format!("lost print notices: {}", e)))?;
        println!("{}", event.message());
        match event {
            PrintEvent::Printed { .. } => return Ok(JobOutcome::Printed),
            PrintEvent::Failed { message, .. } | PrintEvent::Warning { message, .. } => {
                return Ok(JobOutcome::Failed(message));
            }
            PrintEvent::DiscoveryFailed => {
                return Err(RaivoError::Discovery("could not search for printers".into()));
            }
            _ => {}
        }
    }
}

async fn discover(timeout: Duration) -> Result<(), RaivoError> {
    let discovery = BluetoothctlDiscovery::new(timeout);
    let (tx, mut rx) = mpsc::channel::<DeviceInfo>(16);
    let filter = raivo::printer::DiscoveryFilter::bluetooth("");
    discovery.start(filter, tx).await?;

    println!("Scanning for {} seconds...", timeout.as_secs());
    let mut seen = Vec::new();
    let scan = async {
        while let Some(device) = rx.recv().await {
            if seen.contains(&device) {
                continue;
            }
            let model = PrinterModel::from_device_name(&device.name);
            println!(
                "  {:<24} {:<24} {}",
                device.name,
                device.address.to_string(),
                model.dialect
            );
            seen.push(device);
        }
    };
    let _ = tokio::time::timeout(timeout, scan).await;
    discovery.stop().await?;

    if seen.is_empty() {
        println!("No devices found.");
    }
    Ok(())
}

/// Load an order document from a JSON file, or the sample order.
fn load_order(path: Option<&Path>) -> Result<Order, RaivoError> {
    let Some(path) = path else {
        return Ok(sample_order());
    };
    let raw = std::fs::read_to_string(path)?;
    let fields: serde_json::Value = serde_json::from_str(&raw)?;
    let id = fields
        .get("id")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "order".to_string());
    Order::from_document(&Document { id, fields })
}

fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .chunks(16)
        .enumerate()
        .map(|(row, chunk)| {
            let hex: Vec<String> = chunk.iter().map(|b| format!("{:02X}", b)).collect();
            let ascii: String = chunk
                .iter()
                .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
                .collect();
            format!("{:06X}  {:<47}  {}", row * 16, hex.join(" "), ascii)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
