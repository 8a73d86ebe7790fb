use super::report::EXIT_INTERRUPTED;
use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Cooperative stop signal, polled by the harvest loop once per page
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Raise the flag on the first CTRL+C; exit the process on the second
    pub fn listen_for_ctrl_c(&self) -> JoinHandle<()> {
        let flag = self.clone();
        tokio::spawn(async move {
            flag.watch_signals(tokio::signal::ctrl_c, || {
                std::process::exit(i32::from(EXIT_INTERRUPTED));
            })
            .await;
        })
    }

    async fn watch_signals<S, F, X>(&self, mut next_signal: S, force_exit: X)
    where
        S: FnMut() -> F,
        F: Future<Output = io::Result<()>>,
        X: FnOnce(),
    {
        if let Err(err) = next_signal().await {
            log::error!("❌ Failed to listen for CTRL+C: {}", err);
            return;
        }
        log::warn!("⚠️  Received CTRL+C, dropping the in-flight page and stopping (press again to exit now)");
        self.cancel();

        match next_signal().await {
            Ok(()) => {
                log::error!("❌ Second CTRL+C, exiting without waiting for the current request");
                force_exit();
            }
            Err(err) => log::error!("❌ Failed to listen for CTRL+C: {}", err),
        }
    }
}
