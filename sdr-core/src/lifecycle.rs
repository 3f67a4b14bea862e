//! Startup readiness probing and top-level process wiring (spec §4.7),
//! ported from the original implementation's `common.wait_for_uri`.

use crate::asr::AsrWorker;
use crate::errors::LifecycleError;
use crate::graph::GraphExecutor;
use std::net::{TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};

const MAX_SINGLE_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// TCP-connect readiness probe: polls `uri` ("host:port") every
/// `poll_interval` until a connection succeeds or `timeout` elapses.
pub fn wait_for_uri(uri: &str, timeout: Duration, poll_interval: Duration) -> Result<(), LifecycleError> {
    let addr = uri
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| LifecycleError::InvalidUri { uri: uri.to_string() })?;

    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            log::error!("lifecycle: timed out after {}s waiting for {uri}", timeout.as_secs());
            return Err(LifecycleError::ReadinessTimeout {
                uri: uri.to_string(),
                timeout_secs: timeout.as_secs(),
            });
        }

        let connect_timeout = remaining.min(MAX_SINGLE_CONNECT_TIMEOUT);
        match TcpStream::connect_timeout(&addr, connect_timeout) {
            Ok(_) => {
                log::info!("lifecycle: {uri} is now open");
                return Ok(());
            }
            Err(_) => {
                log::warn!("lifecycle: waiting {poll_interval:?} for {uri}");
                thread::sleep(poll_interval.min(remaining));
            }
        }
    }
}

/// Owns the pipeline's running workers so shutdown order (graph first,
/// then ASR workers) is centralized in one place.
pub struct Pipeline {
    graph: Option<GraphExecutor>,
    asr_workers: Vec<AsrWorker>,
}

impl Pipeline {
    pub fn new(graph: GraphExecutor, asr_workers: Vec<AsrWorker>) -> Self {
        Self {
            graph: Some(graph),
            asr_workers,
        }
    }

    /// Cooperative shutdown: the graph's fan-out threads stop first so no
    /// further PCM is produced, then each ASR worker drains and closes its
    /// session.
    pub fn shutdown(mut self) {
        if let Some(graph) = self.graph.take() {
            graph.shutdown();
        }
        for worker in self.asr_workers.drain(..) {
            worker.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn succeeds_immediately_against_an_open_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let uri = format!("127.0.0.1:{}", listener.local_addr().unwrap().port());
        wait_for_uri(&uri, Duration::from_secs(2), Duration::from_millis(10)).unwrap();
    }

    #[test]
    fn times_out_against_a_closed_port() {
        // Bind then drop to get a port very likely to refuse connections.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let uri = format!("127.0.0.1:{}", listener.local_addr().unwrap().port());
        drop(listener);

        let result = wait_for_uri(&uri, Duration::from_millis(50), Duration::from_millis(10));
        assert!(matches!(result, Err(LifecycleError::ReadinessTimeout { .. })));
    }

    #[test]
    fn rejects_malformed_uri() {
        let result = wait_for_uri("not-a-uri", Duration::from_millis(50), Duration::from_millis(10));
        assert!(matches!(result, Err(LifecycleError::InvalidUri { .. })));
    }
}
