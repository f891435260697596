//! Cooperative shutdown signal.

use tokio::sync::watch;

/// Sender half; trips the signal once.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

/// Receiver half, polled by the controller at each suspension point.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn channel() -> (ShutdownHandle, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (ShutdownHandle { tx }, Shutdown { rx })
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the signal trips. Never resolves if the handle was
    /// dropped without triggering.
    pub async fn triggered(&self) {
        let mut rx = self.rx.clone();
        let fired = rx.wait_for(|stop| *stop).await.is_ok();
        if !fired {
            std::future::pending::<()>().await;
        }
    }
}
