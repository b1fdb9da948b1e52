//! # Network Transport
//!
//! Raw TCP printing ("port 9100", also called JetDirect or AppSocket).
//! Bytes written to the socket go straight to the print engine.
//!
//! ESC/POS printers answer `DLE EOT n` on the same socket, so the link can
//! report offline and paper-end. A job ends with `GS r 1`, which the printer
//! answers only once the ticket ahead of it is processed. StarPRNT's status
//! protocol (ASB) is not spoken here; those printers always report online and
//! complete as soon as the bytes are written.
//!
//! A status reply that misses its timeout closes the connection, so a late
//! byte can never be read as the answer to a later request.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::error::RaivoError;
use crate::printer::{Completion, Connection, Connector, PrinterStatus, Target, TargetAddress};
use crate::protocol::Dialect;
use crate::protocol::escpos::{self, StatusKind};

/// Standard raw printing port.
pub const DEFAULT_PORT: u16 = 9100;

/// Opens TCP connections to network printers.
#[derive(Debug, Clone)]
pub struct NetworkConnector {
    pub connect_timeout: Duration,
    /// How long to wait for a status byte
    pub status_timeout: Duration,
    /// How long a sent job may take to finish printing
    pub completion_timeout: Duration,
}

impl Default for NetworkConnector {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            status_timeout: Duration::from_secs(2),
            completion_timeout: Duration::from_secs(30),
        }
    }
}

#[async_trait]
impl Connector for NetworkConnector {
    async fn connect(&self, target: &Target) -> Result<Box<dyn Connection>, RaivoError> {
        let TargetAddress::Network(addr) = &target.address else {
            return Err(RaivoError::Transport(format!(
                "{} is not a network address",
                target.address
            )));
        };

        let stream = timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| RaivoError::Transport(format!("connection to {} timed out", addr)))?
            .map_err(|e| RaivoError::Transport(format!("connect to {} failed: {}", addr, e)))?;
        stream.set_nodelay(true)?;
        info!(%addr, "connected to network printer");

        Ok(Box::new(NetworkConnection {
            stream: Some(stream),
            addr: *addr,
            dialect: target.dialect,
            status_timeout: self.status_timeout,
            completion_timeout: self.completion_timeout,
        }))
    }
}

/// An open TCP link to a printer.
pub struct NetworkConnection {
    stream: Option<TcpStream>,
    addr: SocketAddr,
    dialect: Dialect,
    status_timeout: Duration,
    completion_timeout: Duration,
}

/// Throw away bytes already waiting on the socket.
fn discard_pending(stream: &TcpStream) {
    let mut buf = [0u8; 64];
    while let Ok(n) = stream.try_read(&mut buf) {
        if n == 0 {
            break;
        }
        debug!(bytes = n, "discarding unexpected printer bytes");
    }
}

impl NetworkConnection {
    fn stream(&mut self) -> Result<&mut TcpStream, RaivoError> {
        self.stream
            .as_mut()
            .ok_or_else(|| RaivoError::Transport("connection closed".into()))
    }

    /// Send `request` and read the one-byte reply.
    async fn request(&mut self, request: &[u8], wait: Duration) -> Result<u8, RaivoError> {
        let stream = self.stream()?;
        discard_pending(stream);
        stream.write_all(request).await?;

        let mut byte = [0u8; 1];
        match timeout(wait, stream.read_exact(&mut byte)).await {
            Ok(read) => {
                read?;
                Ok(byte[0])
            }
            Err(_) => {
                debug!(addr = %self.addr, "no reply in time, closing connection");
                self.stream = None;
                Err(RaivoError::Printer("no status response".into()))
            }
        }
    }

    async fn query(&mut self, kind: StatusKind) -> Result<u8, RaivoError> {
        let status = self
            .request(&escpos::status_request(kind), self.status_timeout)
            .await?;
        debug!(?kind, status, "status byte");
        Ok(status)
    }
}

#[async_trait]
impl Connection for NetworkConnection {
    async fn send(&mut self, data: &[u8]) -> Result<(), RaivoError> {
        let stream = self.stream()?;
        stream
            .write_all(data)
            .await
            .map_err(|e| RaivoError::Transport(format!("write failed: {}", e)))?;
        stream.flush().await?;
        Ok(())
    }

    async fn wait_complete(&mut self) -> Result<Completion, RaivoError> {
        if self.dialect != Dialect::EscPos {
            return Ok(Completion::SUCCESS);
        }
        let paper = self
            .request(&escpos::paper_sensor_request(), self.completion_timeout)
            .await?;
        debug!(addr = %self.addr, status = paper, "job processed");
        if escpos::is_paper_sensor_end(paper) {
            return Ok(Completion {
                code: i32::from(paper),
            });
        }
        Ok(Completion::SUCCESS)
    }

    async fn status(&mut self) -> Result<PrinterStatus, RaivoError> {
        if self.stream.is_none() {
            return Ok(PrinterStatus::Offline);
        }
        if self.dialect != Dialect::EscPos {
            return Ok(PrinterStatus::Online);
        }

        let printer = match self.query(StatusKind::Printer).await {
            Ok(byte) => byte,
            Err(e) => {
                debug!(addr = %self.addr, error = %e, "status query failed");
                return Ok(PrinterStatus::Offline);
            }
        };
        if escpos::is_offline(printer) {
            let paper = self.query(StatusKind::Paper).await?;
            if escpos::is_paper_end(paper) {
                return Ok(PrinterStatus::PaperEnd);
            }
            return Ok(PrinterStatus::Offline);
        }
        Ok(PrinterStatus::Online)
    }

    async fn disconnect(&mut self) -> Result<(), RaivoError> {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await?;
            debug!(addr = %self.addr, "network printer disconnected");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn target(addr: SocketAddr, dialect: Dialect) -> Target {
        Target {
            name: "TM-T88VI".into(),
            address: TargetAddress::Network(addr),
            dialect,
        }
    }

    #[tokio::test]
    async fn test_send_reaches_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        });

        let mut conn = NetworkConnector::default()
            .connect(&target(addr, Dialect::StarPrnt))
            .await
            .unwrap();
        conn.send(b"hello\n").await.unwrap();
        assert_eq!(conn.wait_complete().await.unwrap(), Completion::SUCCESS);
        conn.disconnect().await.unwrap();

        assert_eq!(server.await.unwrap(), b"hello\n");
    }

    #[tokio::test]
    async fn test_completion_is_asked_after_the_job() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = [0u8; 9];
            socket.read_exact(&mut received).await.unwrap();
            socket.write_all(&[0x00]).await.unwrap();
            received
        });

        let mut conn = NetworkConnector::default()
            .connect(&target(addr, Dialect::EscPos))
            .await
            .unwrap();
        conn.send(b"ticket").await.unwrap();
        assert_eq!(conn.wait_complete().await.unwrap(), Completion::SUCCESS);

        let received = server.await.unwrap();
        assert_eq!(&received[..6], b"ticket");
        assert_eq!(&received[6..], &[0x1D, 0x72, 0x01]);
    }

    #[tokio::test]
    async fn test_completion_reports_paper_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = [0u8; 4];
            socket.read_exact(&mut received).await.unwrap();
            socket.write_all(&[0x0C]).await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        });

        let mut conn = NetworkConnector::default()
            .connect(&target(addr, Dialect::EscPos))
            .await
            .unwrap();
        conn.send(b"x").await.unwrap();
        let completion = conn.wait_complete().await.unwrap();
        assert_eq!(completion.code, 0x0C);
        assert!(!completion.is_success());
    }

    #[tokio::test]
    async fn test_late_status_reply_is_never_reused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut requests = 0;
            let mut request = [0u8; 3];
            while socket.read_exact(&mut request).await.is_ok() {
                requests += 1;
                // Reply after the client has given up
                tokio::time::sleep(Duration::from_millis(150)).await;
                let _ = socket.write_all(&[0x16 | 0x08]).await;
            }
            requests
        });

        let connector = NetworkConnector {
            status_timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let mut conn = connector
            .connect(&target(addr, Dialect::EscPos))
            .await
            .unwrap();
        assert_eq!(conn.status().await.unwrap(), PrinterStatus::Offline);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(conn.status().await.unwrap(), PrinterStatus::Offline);
        assert!(conn.send(b"x").await.is_err());
        drop(conn);

        assert_eq!(server.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_escpos_status_paper_end() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 3];
            // DLE EOT 1: offline
            socket.read_exact(&mut request).await.unwrap();
            socket.write_all(&[0x16 | 0x08]).await.unwrap();
            // DLE EOT 4: paper end
            socket.read_exact(&mut request).await.unwrap();
            assert_eq!(request, [0x10, 0x04, 0x04]);
            socket.write_all(&[0x12 | 0x60]).await.unwrap();
        });

        let mut conn = NetworkConnector::default()
            .connect(&target(addr, Dialect::EscPos))
            .await
            .unwrap();
        assert_eq!(conn.status().await.unwrap(), PrinterStatus::PaperEnd);
    }

    #[tokio::test]
    async fn test_silent_printer_reports_offline() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let connector = NetworkConnector {
            status_timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let mut conn = connector
            .connect(&target(addr, Dialect::EscPos))
            .await
            .unwrap();
        assert_eq!(conn.status().await.unwrap(), PrinterStatus::Offline);
    }

    #[tokio::test]
    async fn test_rejects_bluetooth_target() {
        let target = Target {
            name: "TM-T88VI".into(),
            address: TargetAddress::Bluetooth("00:01:90:AA:BB:CC".into()),
            dialect: Dialect::EscPos,
        };
        assert!(NetworkConnector::default().connect(&target).await.is_err());
    }
}
