//! # shutdown
//!
//! Cooperative cancellation for the trading loop.
//!
//! A [`ShutdownSignal`] owns the sending half of a `watch` channel; every
//! wait in the engine holds a cheap [`Shutdown`] clone and races its sleep
//! against [`Shutdown::cancelled`].  Nothing is interrupted mid-computation,
//! only between polls.

use std::sync::Arc;

use tokio::sync::watch;

/// Trigger side, held by `main` (Ctrl-C handler) or a test.
#[derive(Debug)]
pub struct ShutdownSignal {
    tx: watch::Sender<bool>,
}

/// Listener side, cloned into every component that waits.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
    /// Keeps the channel open for listeners built by [`Shutdown::never`].
    _anchor: Option<Arc<watch::Sender<bool>>>,
}

impl ShutdownSignal {
    pub fn new() -> (Self, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, Shutdown { rx, _anchor: None })
    }

    /// Ask every listener to stop at its next wait.
    pub fn trigger(&self) {
        // send_replace never fails, even with no listeners left
        self.tx.send_replace(true);
    }
}

impl Shutdown {
    /// A listener that never fires. Used by tests and one-shot tools.
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { rx, _anchor: Some(Arc::new(tx)) }
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown has been requested.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // sender dropped without triggering: nobody can stop us anymore
                std::future::pending::<()>().await;
            }
        }
    }
}
