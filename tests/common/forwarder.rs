//! Local TCP forwarder in front of the shared container.
//!
//! Lets a test make the server reachable late, or cut it off under a connected client.

use tokio::io::copy_bidirectional;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinHandle, JoinSet};

pub struct LocalForwarder {
    pub port: u16,
    handle: JoinHandle<()>,
}

impl LocalForwarder {
    /// Listen on `port` (0 picks a free one) and forward every connection to `target`.
    pub async fn start(port: u16, target: String) -> Self {
        let listener =
            TcpListener::bind(("127.0.0.1", port)).await.expect("failed to bind forwarder");
        let port = listener.local_addr().expect("failed to read forwarder address").port();

        let handle = tokio::spawn(async move {
            // Dropping the set when this task is aborted closes every forwarded connection.
            let mut connections = JoinSet::new();
            loop {
                let Ok((mut inbound, _peer_addr)) = listener.accept().await else {
                    break;
                };
                let target = target.clone();
                connections.spawn(async move {
                    if let Ok(mut outbound) = TcpStream::connect(target.as_str()).await {
                        let _ = copy_bidirectional(&mut inbound, &mut outbound).await;
                    }
                });
            }
        });

        Self { port, handle }
    }

    pub fn uri(&self) -> String {
        format!("mongodb://127.0.0.1:{}/?directConnection=true", self.port)
    }

    /// Stop listening and close forwarded connections; the port refuses connections after.
    pub async fn stop(mut self) {
        self.handle.abort();
        let _ = (&mut self.handle).await;
    }
}

impl Drop for LocalForwarder {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A port nothing listens on right now.
pub async fn free_port() -> u16 {
    let listener = TcpListener::bind(("127.0.0.1", 0)).await.expect("failed to bind");
    listener.local_addr().expect("failed to read address").port()
}
