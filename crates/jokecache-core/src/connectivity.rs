//! Network reachability monitoring.
//!
//! `ConnectivityMonitor::spawn` runs a `Probe` on an interval and reports
//! transitions as `ConnectivityEvent`s. The returned `ConnectivitySubscription`
//! owns the background task; dropping it stops monitoring.

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Buffer size for the connectivity event channel.
/// Events are only sent on transitions, so a handful is plenty.
const EVENT_BUFFER_SIZE: usize = 8;

/// Default time allowed for a TCP probe to connect.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityEvent {
    pub is_connected: bool,
}

/// A reachability check.
#[async_trait]
pub trait Probe: Send + Sync + 'static {
    async fn is_reachable(&self) -> bool;
}

/// Considers the network up when a TCP connection to `host:port` opens in time.
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn is_reachable(&self) -> bool {
        let connect = TcpStream::connect((self.host.as_str(), self.port));
        matches!(tokio::time::timeout(self.timeout, connect).await, Ok(Ok(_)))
    }
}

pub struct ConnectivityMonitor;

impl ConnectivityMonitor {
    /// Start probing every `interval`. The first result is always reported,
    /// after that only changes are.
    pub fn spawn<P: Probe>(probe: P, interval: Duration) -> ConnectivitySubscription {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER_SIZE);

        let handle = tokio::spawn(async move {
            let mut last: Option<bool> = None;
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let connected = probe.is_reachable().await;
                if last == Some(connected) {
                    continue;
                }

                info!(connected, "Connectivity changed");
                last = Some(connected);
                let event = ConnectivityEvent {
                    is_connected: connected,
                };
                if tx.send(event).await.is_err() {
                    debug!("Connectivity receiver dropped, stopping monitor");
                    break;
                }
            }
        });

        ConnectivitySubscription { rx, handle }
    }
}

/// Live subscription to connectivity events. Monitoring stops when dropped.
pub struct ConnectivitySubscription {
    rx: mpsc::Receiver<ConnectivityEvent>,
    handle: JoinHandle<()>,
}

impl ConnectivitySubscription {
    /// Take a pending event without waiting.
    pub fn try_recv(&mut self) -> Option<ConnectivityEvent> {
        self.rx.try_recv().ok()
    }

    /// Stop monitoring.
    pub fn unsubscribe(self) {}
}

impl Drop for ConnectivitySubscription {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("Connectivity subscription released");
    }
}
