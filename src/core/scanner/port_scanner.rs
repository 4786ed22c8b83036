// src/core/scanner/port_scanner.rs

use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Default connect deadline for reachability probes.
pub const PORT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Tests whether a TCP port accepts connections within `deadline`.
/// Any connect error or timeout counts as closed; the socket is dropped
/// (and therefore closed) on every path.
pub async fn probe_port(host: &str, port: u16, deadline: Duration) -> bool {
    debug!(host, port, "Probing TCP port.");
    match timeout(deadline, TcpStream::connect((host, port))).await {
        Ok(Ok(_stream)) => {
            debug!(host, port, "Port is open.");
            true
        }
        Ok(Err(e)) => {
            debug!(host, port, error = %e, "Port is closed.");
            false
        }
        Err(_) => {
            debug!(host, port, "Port probe timed out.");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn open_port_is_reported_open() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        assert!(probe_port("127.0.0.1", port, Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn closed_port_is_reported_closed() {
        // Bind then drop so the port is known-free.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        assert!(!probe_port("127.0.0.1", port, Duration::from_secs(1)).await);
    }
}
