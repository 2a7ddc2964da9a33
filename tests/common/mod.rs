//! Shared utilities for integration testing.

use std::net::SocketAddr;

use strata::{PipelineError, Server, Shutdown};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A server running on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Shutdown,
    handle: JoinHandle<Result<(), PipelineError>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the serve loop to return.
    pub async fn stop(self) -> Result<(), PipelineError> {
        self.shutdown.trigger();
        self.handle.await.expect("serve task panicked")
    }
}

/// Start `server` on 127.0.0.1 with an ephemeral port.
pub async fn spawn(mut server: Server) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let signal = shutdown.wait();

    let handle = tokio::spawn(async move { server.serve(listener, signal).await });

    TestServer {
        addr,
        shutdown,
        handle,
    }
}

/// HTTP client that ignores proxy settings from the environment.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
