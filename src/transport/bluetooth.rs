//! # Bluetooth RFCOMM Transport
//!
//! Talks to receipt printers over the Bluetooth Serial Port Profile (SPP)
//! via RFCOMM TTY devices.
//!
//! ## Bluetooth Setup (Linux)
//!
//! The printer must be paired. [`BluetoothConnector`] binds the RFCOMM
//! device itself when none exists yet, which needs root (or CAP_NET_ADMIN):
//!
//! ```bash
//! $ bluetoothctl
//! [bluetooth]# scan on
//! # Look for "TM-T88VI"; note the address, e.g. 00:01:90:XX:XX:XX
//! [bluetooth]# pair 00:01:90:XX:XX:XX
//!
//! # Optional: bind by hand
//! $ sudo rfcomm bind 0 00:01:90:XX:XX:XX
//! ```
//!
//! ## TTY Configuration
//!
//! The RFCOMM device is opened in raw mode so binary data is transmitted
//! without modification:
//!
//! - **No input processing**: Disable IGNBRK, BRKINT, PARMRK, ISTRIP, etc.
//! - **No output processing**: Disable OPOST (no CR/LF translation)
//! - **8-bit characters**: CS8 (8 data bits, no parity)
//! - **No echo**: Disable ECHO, ECHONL
//! - **Non-canonical mode**: Disable ICANON (no line buffering)
//!
//! ## Completion
//!
//! Once a job is written, `tcdrain` blocks until the TTY has pushed every
//! byte to the printer. That is as close to "job finished" as SPP gets.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::process::Command;
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::RaivoError;
use crate::printer::{Completion, Connection, Connector, PrinterStatus, Target, TargetAddress};

/// Default chunk size for writes (bytes)
const CHUNK_SIZE: usize = 4096;

/// Delay between chunks (milliseconds)
const CHUNK_DELAY_MS: u64 = 2;

/// # Bluetooth Printer Transport
///
/// Blocking writer for an RFCOMM TTY.
///
/// ## Example
///
/// ```no_run
/// use raivo::transport::bluetooth::BluetoothTransport;
///
/// let mut transport = BluetoothTransport::open("/dev/rfcomm0")?;
/// transport.write_all(&raivo::protocol::init())?;
/// transport.drain()?;
///
/// # Ok::<(), raivo::error::RaivoError>(())
/// ```
pub struct BluetoothTransport {
    file: File,
    chunk_size: usize,
    chunk_delay: Duration,
}

impl BluetoothTransport {
    /// Open a Bluetooth connection to the printer.
    ///
    /// ## Errors
    ///
    /// Returns an error if:
    /// - The device doesn't exist
    /// - Permission denied (may need root or dialout group)
    /// - TTY configuration fails
    pub fn open<P: AsRef<Path>>(device: P) -> Result<Self, RaivoError> {
        let path = device.as_ref();

        let file = OpenOptions::new().write(true).open(path).map_err(|e| {
            RaivoError::Transport(format!("Failed to open {}: {}", path.display(), e))
        })?;

        configure_tty_raw(file.as_raw_fd())?;

        Ok(Self {
            file,
            chunk_size: CHUNK_SIZE,
            chunk_delay: Duration::from_millis(CHUNK_DELAY_MS),
        })
    }

    /// Set the chunk size for large writes. Default is 4096 bytes.
    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size = size.max(1);
    }

    /// Write data to the printer, chunked so the Bluetooth buffer keeps up.
    pub fn write_all(&mut self, data: &[u8]) -> Result<(), RaivoError> {
        for chunk in data.chunks(self.chunk_size) {
            self.file
                .write_all(chunk)
                .map_err(|e| RaivoError::Transport(format!("Write failed: {}", e)))?;

            if data.len() > self.chunk_size && !self.chunk_delay.is_zero() {
                thread::sleep(self.chunk_delay);
            }
        }

        self.file
            .flush()
            .map_err(|e| RaivoError::Transport(format!("Flush failed: {}", e)))
    }

    /// Block until every written byte has left the TTY.
    pub fn drain(&mut self) -> Result<(), RaivoError> {
        let result = unsafe { libc::tcdrain(self.file.as_raw_fd()) };
        if result != 0 {
            return Err(RaivoError::Transport(format!(
                "tcdrain failed: {}",
                io::Error::last_os_error()
            )));
        }
        Ok(())
    }
}

/// Configure a file descriptor for raw TTY mode.
///
/// IXON/IXOFF/IXANY are cleared too: 0x11 and 0x13 are ordinary bytes in
/// printer commands, not flow control.
fn configure_tty_raw(fd: i32) -> Result<(), RaivoError> {
    use std::mem::MaybeUninit;

    let mut termios = MaybeUninit::uninit();
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        return Err(RaivoError::Transport(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);
    termios.c_oflag &= !libc::OPOST;
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8;

    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(RaivoError::Transport(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

// ============================================================================
// RFCOMM SETUP HELPERS
// ============================================================================

/// Validate a Bluetooth MAC address format (XX:XX:XX:XX:XX:XX).
pub fn is_valid_mac(mac: &str) -> bool {
    let parts: Vec<&str> = mac.split(':').collect();
    if parts.len() != 6 {
        return false;
    }
    parts
        .iter()
        .all(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Pull the device path for `mac` out of an rfcomm listing.
///
/// Lines look like `rfcomm0: 00:01:90:AA:BB:CC channel 1 clean`.
fn rfcomm_device_in(listing: &str, mac: &str) -> Option<String> {
    let mac_upper = mac.to_uppercase();
    listing
        .lines()
        .filter(|line| line.to_uppercase().contains(&mac_upper))
        .filter_map(|line| line.split(':').next())
        .map(|dev| format!("/dev/{}", dev.trim()))
        .next()
}

/// Find an existing RFCOMM device bound to the given MAC address.
///
/// Checks `/proc/net/rfcomm` and falls back to `rfcomm -a`.
pub fn find_rfcomm_for_mac(mac: &str) -> Result<Option<String>, RaivoError> {
    if let Ok(contents) = fs::read_to_string("/proc/net/rfcomm") {
        if let Some(path) = rfcomm_device_in(&contents, mac) {
            if Path::new(&path).exists() {
                return Ok(Some(path));
            }
        }
    }

    let output = Command::new("rfcomm")
        .arg("-a")
        .output()
        .map_err(|e| RaivoError::Transport(format!("Failed to run 'rfcomm -a': {}", e)))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(rfcomm_device_in(&stdout, mac).filter(|path| Path::new(path).exists()))
}

/// Set up an RFCOMM device for a Bluetooth MAC address.
///
/// Runs:
/// 1. `bluetoothctl connect <MAC>`
/// 2. `l2ping -c 1 <MAC>` to verify the printer answers
/// 3. `rfcomm bind <channel> <MAC> 1`
///
/// Returns the device path on success (e.g., "/dev/rfcomm0").
pub fn setup_rfcomm(mac: &str, channel: u8) -> Result<String, RaivoError> {
    let mac_upper = mac.to_uppercase();
    let device_path = format!("/dev/rfcomm{}", channel);

    // May fail if already connected; l2ping decides
    info!(mac = %mac_upper, "connecting with bluetoothctl");
    let output = Command::new("bluetoothctl")
        .arg("connect")
        .arg(&mac_upper)
        .output()
        .map_err(|e| RaivoError::Transport(format!("Failed to run bluetoothctl: {}", e)))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !(stdout.contains("Connection successful") || stdout.contains("already connected")) {
        debug!(output = %stdout.trim(), "bluetoothctl connect");
    }

    thread::sleep(Duration::from_millis(500));

    let output = Command::new("l2ping")
        .arg("-c")
        .arg("1")
        .arg(&mac_upper)
        .output()
        .map_err(|e| RaivoError::Transport(format!("Failed to run l2ping: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RaivoError::Transport(format!(
            "Device {} not reachable: {}",
            mac_upper,
            stderr.trim()
        )));
    }

    info!(channel, "binding rfcomm device");
    let output = Command::new("rfcomm")
        .arg("bind")
        .arg(channel.to_string())
        .arg(&mac_upper)
        .arg("1") // SPP channel
        .output()
        .map_err(|e| RaivoError::Transport(format!("Failed to run rfcomm bind: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RaivoError::Transport(format!(
            "rfcomm bind failed: {}",
            stderr.trim()
        )));
    }

    thread::sleep(Duration::from_millis(500));

    if !Path::new(&device_path).exists() {
        return Err(RaivoError::Transport(format!(
            "Device {} was not created",
            device_path
        )));
    }

    Ok(device_path)
}

// ============================================================================
// CONNECTOR
// ============================================================================

/// Opens RFCOMM connections to Bluetooth targets.
#[derive(Debug, Clone)]
pub struct BluetoothConnector {
    /// rfcomm channel used when no binding exists yet
    pub bind_channel: u8,
}

impl Default for BluetoothConnector {
    fn default() -> Self {
        Self { bind_channel: 0 }
    }
}

impl BluetoothConnector {
    fn open_blocking(mac: &str, channel: u8) -> Result<BluetoothTransport, RaivoError> {
        if !is_valid_mac(mac) {
            return Err(RaivoError::Transport(format!("invalid MAC address '{}'", mac)));
        }
        let device = match find_rfcomm_for_mac(mac)? {
            Some(device) => device,
            None => setup_rfcomm(mac, channel)?,
        };
        info!(mac, device = %device, "opening rfcomm device");
        BluetoothTransport::open(device)
    }
}

#[async_trait]
impl Connector for BluetoothConnector {
    async fn connect(&self, target: &Target) -> Result<Box<dyn Connection>, RaivoError> {
        let TargetAddress::Bluetooth(mac) = &target.address else {
            return Err(RaivoError::Transport(format!(
                "{} is not a Bluetooth address",
                target.address
            )));
        };
        let mac = mac.clone();
        let channel = self.bind_channel;
        let transport = tokio::task::spawn_blocking(move || Self::open_blocking(&mac, channel))
            .await
            .map_err(|e| RaivoError::Transport(format!("connect task failed: {}", e)))??;

        Ok(Box::new(BluetoothConnection {
            transport: Some(transport),
        }))
    }
}

/// A live RFCOMM link. The transport moves onto a blocking thread for each
/// write and comes back afterwards.
pub struct BluetoothConnection {
    transport: Option<BluetoothTransport>,
}

impl BluetoothConnection {
    async fn with_transport<F>(&mut self, f: F) -> Result<(), RaivoError>
    where
        F: FnOnce(&mut BluetoothTransport) -> Result<(), RaivoError> + Send + 'static,
    {
        let mut transport = self
            .transport
            .take()
            .ok_or_else(|| RaivoError::Transport("connection closed".into()))?;
        let (transport, result) = tokio::task::spawn_blocking(move || {
            let result = f(&mut transport);
            (transport, result)
        })
        .await
        .map_err(|e| RaivoError::Transport(format!("write task failed: {}", e)))?;
        self.transport = Some(transport);
        result
    }
}

#[async_trait]
impl Connection for BluetoothConnection {
    async fn send(&mut self, data: &[u8]) -> Result<(), RaivoError> {
        let data = data.to_vec();
        self.with_transport(move |t| t.write_all(&data)).await
    }

    async fn wait_complete(&mut self) -> Result<Completion, RaivoError> {
        self.with_transport(|t| t.drain()).await?;
        Ok(Completion::SUCCESS)
    }

    async fn status(&mut self) -> Result<PrinterStatus, RaivoError> {
        // The TTY is write-only; an open link is all we can vouch for
        if self.transport.is_some() {
            Ok(PrinterStatus::Online)
        } else {
            Ok(PrinterStatus::Offline)
        }
    }

    async fn disconnect(&mut self) -> Result<(), RaivoError> {
        if self.transport.take().is_none() {
            warn!("disconnect on a closed rfcomm link");
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
