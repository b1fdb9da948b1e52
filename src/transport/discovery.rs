//! Bluetooth printer discovery through `bluetoothctl`.
//!
//! Known devices are reported first (`bluetoothctl devices`), then a scan
//! runs and every newly seen device is reported as it appears. The scan
//! process is killed on [`Discovery::stop`] or after the scan timeout.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

use super::bluetooth::is_valid_mac;
use crate::error::RaivoError;
use crate::printer::{DeviceInfo, Discovery, DiscoveryFilter, TargetAddress, TransportKind};

/// Discovery backed by the BlueZ command line client.
pub struct BluetoothctlDiscovery {
    scan_timeout: Duration,
    scan: Mutex<Option<Child>>,
}

impl Default for BluetoothctlDiscovery {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl BluetoothctlDiscovery {
    pub fn new(scan_timeout: Duration) -> Self {
        Self {
            scan_timeout,
            scan: Mutex::new(None),
        }
    }

    async fn known_devices() -> Result<Vec<DeviceInfo>, RaivoError> {
        let output = Command::new("bluetoothctl")
            .arg("devices")
            .output()
            .await
            .map_err(|e| RaivoError::Discovery(format!("failed to run bluetoothctl: {}", e)))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().filter_map(parse_device_line).collect())
    }
}

#[async_trait]
impl Discovery for BluetoothctlDiscovery {
    async fn start(
        &self,
        filter: DiscoveryFilter,
        found: mpsc::Sender<DeviceInfo>,
    ) -> Result<(), RaivoError> {
        if filter.transport != TransportKind::Bluetooth {
            return Err(RaivoError::Discovery(
                "bluetoothctl only finds Bluetooth devices".into(),
            ));
        }

        let mut scan = self.scan.lock().await;
        if let Some(mut previous) = scan.take() {
            let _ = previous.kill().await;
        }

        let known = Self::known_devices().await?;
        debug!(count = known.len(), "known bluetooth devices");

        let mut child = Command::new("bluetoothctl")
            .arg("--timeout")
            .arg(self.scan_timeout.as_secs().to_string())
            .arg("scan")
            .arg("on")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RaivoError::Discovery(format!("failed to start scan: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RaivoError::Discovery("scan has no output".into()))?;
        *scan = Some(child);
        info!(timeout = ?self.scan_timeout, "bluetooth scan started");

        // Reported from the task: `start` returns before the receiver drains
        tokio::spawn(async move {
            for device in known {
                if found.send(device).await.is_err() {
                    return;
                }
            }

            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if let Some(device) = parse_device_line(&line) {
                            if found.send(device).await.is_err() {
                                break;
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "error reading scan output");
                        break;
                    }
                }
            }
            debug!("bluetooth scan output closed");
        });

        Ok(())
    }

    async fn stop(&self) -> Result<(), RaivoError> {
        if let Some(mut child) = self.scan.lock().await.take() {
            child
                .kill()
                .await
                .map_err(|e| RaivoError::Discovery(format!("failed to stop scan: {}", e)))?;
            info!("bluetooth scan stopped");
        }
        Ok(())
    }
}

/// Remove ANSI color sequences (`ESC [ ... m`) that bluetoothctl adds.
fn strip_ansi(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Parse `Device <MAC> <name>` out of a bluetoothctl line.
///
/// Handles both `devices` output and scan events such as
/// `[NEW] Device 00:01:90:AA:BB:CC TM-T88VI`. Property changes
/// (`[CHG] Device ... RSSI: -60`) and devices without a name are skipped.
fn parse_device_line(line: &str) -> Option<DeviceInfo> {
    let line = strip_ansi(line);
    if line.contains("[CHG]") || line.contains("[DEL]") {
        return None;
    }
    let rest = &line[line.find("Device ")? + "Device ".len()..];
    let (mac, name) = rest.trim().split_once(' ')?;
    let name = name.trim();
    if !is_valid_mac(mac) || name.is_empty() {
        return None;
    }
    // Unnamed devices echo their address with dashes
    if name.replace('-', ":").eq_ignore_ascii_case(mac) {
        return None;
    }
    Some(DeviceInfo {
        name: name.to_string(),
        address: TargetAddress::Bluetooth(mac.to_uppercase()),
    })
}
