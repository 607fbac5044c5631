//! Process-wide cancellation.
//!
//! A [`Shutdown`] is handed to every stage that talks to a remote service. When
//! the watch channel flips to `true`, the in-flight request is dropped and the
//! stage fails with [`RankError::Cancelled`], so that no partial command list
//! is ever emitted.

use std::future::Future;

use log::warn;
use snafu::prelude::*;
use tokio::sync::watch;

use crate::rank::{CancelledSnafu, RankResult};

#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Creates a shutdown handle and the sender that triggers it.
    pub fn channel() -> (watch::Sender<bool>, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (tx, Shutdown { rx })
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    pub fn check(&self) -> RankResult<()> {
        ensure!(!self.is_triggered(), CancelledSnafu {});
        Ok(())
    }

    /// Runs `fut` unless the shutdown is triggered first.
    pub async fn guard<T, F>(&self, fut: F) -> RankResult<T>
    where
        F: Future<Output = RankResult<T>>,
    {
        self.check()?;
        let mut rx = self.rx.clone();
        tokio::select! {
            biased;
            _ = triggered(&mut rx) => CancelledSnafu {}.fail(),
            res = fut => res,
        }
    }
}

async fn triggered(rx: &mut watch::Receiver<bool>) {
    let stopped = rx.wait_for(|stop| *stop).await.is_ok();
    if !stopped {
        // The sender is gone, no shutdown can be requested any more.
        std::future::pending::<()>().await;
    }
}

/// Resolves on Ctrl-C, or on SIGTERM and SIGQUIT on unix systems.
pub async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::quit()),
        ) {
            (Ok(mut term), Ok(mut quit)) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                    _ = quit.recv() => {},
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!("wait_for_signal: cannot listen to unix signals: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::RankError;
    use std::time::Duration;

    #[tokio::test]
    async fn passes_results_through() {
        let (_tx, shutdown) = Shutdown::channel();
        let res = shutdown.guard(async { Ok(3) }).await;
        assert_eq!(res.unwrap(), 3);
    }

    #[tokio::test]
    async fn does_not_start_once_triggered() {
        let (tx, shutdown) = Shutdown::channel();
        tx.send(true).unwrap();
        let res: RankResult<()> = shutdown
            .guard(async {
                if true {
                    panic!("must not be polled");
                }
                Ok(())
            })
            .await;
        assert!(matches!(res, Err(RankError::Cancelled {})));
    }

    #[tokio::test]
    async fn aborts_in_flight_work() {
        let (tx, shutdown) = Shutdown::channel();
        let res: RankResult<()> = shutdown
            .guard(async move {
                tx.send(true).unwrap();
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            })
            .await;
        assert!(matches!(res, Err(RankError::Cancelled {})));
    }

    #[tokio::test]
    async fn dropped_sender_never_cancels() {
        let (tx, shutdown) = Shutdown::channel();
        drop(tx);
        let res = shutdown.guard(async { Ok("done") }).await;
        assert_eq!(res.unwrap(), "done");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn sigquit_requests_a_shutdown() {
        use tokio::signal::unix::{signal, SignalKind};
        // Keeps the default SIGQUIT action (core dump) away from the test process.
        let _own = signal(SignalKind::quit()).unwrap();
        let waiter = tokio::spawn(wait_for_signal());
        tokio::time::sleep(Duration::from_millis(200)).await;

        let status = std::process::Command::new("kill")
            .args(["-QUIT", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());
        let res = tokio::time::timeout(Duration::from_secs(10), waiter).await;
        assert!(matches!(res, Ok(Ok(()))));
    }
}
