use std::sync::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectivitySignal {
    Online,
    Offline,
}

/// The host's view of network reachability.
pub trait ConnectivityPlatform: Send + Sync + 'static {
    /// Current state, or `None` if the host cannot tell.
    fn reported_online(&self) -> Option<bool>;

    /// Stream of online/offline signals, or `None` if the host emits none.
    fn subscribe(&self) -> Option<mpsc::UnboundedReceiver<ConnectivitySignal>>;
}

/// In-process platform: signals are pushed in with [`SignalBus::emit`].
/// The stream can be taken by one subscriber only.
pub struct SignalBus {
    initial: Option<bool>,
    tx: mpsc::UnboundedSender<ConnectivitySignal>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<ConnectivitySignal>>>,
}

impl SignalBus {
    pub fn new(initial: Option<bool>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            initial,
            tx,
            rx: Mutex::new(Some(rx)),
        }
    }

    pub fn emit(&self, signal: ConnectivitySignal) {
        if self.tx.send(signal).is_err() {
            debug!(?signal, "No connectivity subscriber, signal dropped");
        }
    }
}

impl ConnectivityPlatform for SignalBus {
    fn reported_online(&self) -> Option<bool> {
        self.initial
    }

    fn subscribe(&self) -> Option<mpsc::UnboundedReceiver<ConnectivitySignal>> {
        match self.rx.lock() {
            Ok(mut rx) => rx.take(),
            Err(_) => None,
        }
    }
}

/// Mirrors platform online/offline signals into a watchable flag.
pub struct ConnectivityMonitor {
    online: watch::Receiver<bool>,
    task: Option<JoinHandle<()>>,
}

impl ConnectivityMonitor {
    pub fn start<P: ConnectivityPlatform + ?Sized>(platform: &P) -> Self {
        let initial = platform.reported_online().unwrap_or(true);
        let (tx, rx) = watch::channel(initial);

        let task = match platform.subscribe() {
            Some(mut signals) => Some(tokio::spawn(async move {
                while let Some(signal) = signals.recv().await {
                    let online = signal == ConnectivitySignal::Online;
                    let changed = tx.send_if_modified(|current| {
                        if *current == online {
                            return false;
                        }
                        *current = online;
                        true
                    });
                    if changed {
                        info!(online, "Connectivity changed");
                    }
                }
                debug!("Connectivity signal stream closed");
            })),
            None => {
                warn!("Platform emits no connectivity signals, assuming online");
                None
            }
        };

        Self { online: rx, task }
    }

    pub fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.online.clone()
    }

    /// Unsubscribes from the platform. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ConnectivityMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
