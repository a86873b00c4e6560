//! Graceful shutdown plumbing.
//!
//! A single watch channel carries the stop flag. [`SignalHandler`] raises it
//! on SIGINT/SIGTERM; a [`ShutdownHandle`] lets the `shutdown` request raise
//! it from inside a connection.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

/// Owns the stop flag and, once spawned, the OS signal listener.
pub struct SignalHandler {
    handle: ShutdownHandle,
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalHandler {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            handle: ShutdownHandle {
                tx: Arc::new(tx),
                rx,
            },
        }
    }

    /// Spawns a task that raises the flag on the first termination signal.
    pub fn spawn_listener(&self) {
        let handle = self.handle.clone();
        tokio::spawn(async move {
            if let Some(signal) = wait_for_signal().await {
                info!(signal, "Initiating shutdown");
                handle.trigger();
            }
        });
    }

    /// Future-like signal that resolves once the flag is raised.
    pub fn shutdown(&self) -> ShutdownSignal {
        self.handle.wait()
    }

    pub fn is_shutdown(&self) -> bool {
        self.handle.is_shutdown()
    }

    pub fn trigger_shutdown(&self) {
        self.handle.trigger();
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.handle.clone()
    }
}

/// Returns the name of the signal received, or `None` if listening failed.
#[cfg(unix)]
async fn wait_for_signal() -> Option<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let streams = signal(SignalKind::terminate())
        .and_then(|term| Ok((term, signal(SignalKind::interrupt())?)));
    match streams {
        Ok((mut term, mut int)) => Some(tokio::select! {
            _ = term.recv() => "SIGTERM",
            _ = int.recv() => "SIGINT",
        }),
        Err(e) => {
            warn!(error = %e, "Cannot install SIGTERM/SIGINT handlers, using Ctrl+C only");
            tokio::signal::ctrl_c().await.ok().map(|()| "ctrl-c")
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> Option<&'static str> {
    tokio::signal::ctrl_c().await.ok().map(|()| "ctrl-c")
}

/// Resolves when shutdown has been requested.
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub async fn wait(mut self) {
        // An error means every sender is gone, which is as final as a stop.
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

/// Cloneable access to the stop flag.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    pub fn wait(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.rx.clone(),
        }
    }
}
