//! Quiet-period debouncing of raw filesystem notifications
//!
//! Every notification resets the quiet-period timer. Only when a full quiet
//! period passes without any further notification does the burst "settle",
//! which requests one recomputation. Under an event storm this bounds the
//! work to roughly one computation per burst rather than one per file.

use crate::monitor::RawNotification;
use crate::monitor::session::SessionShared;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Run the debounce loop until the channel closes or the session is disposed
pub(crate) async fn run(
    mut events: mpsc::UnboundedReceiver<RawNotification>,
    quiet_period: Duration,
    shared: Arc<SessionShared>,
) {
    while events.recv().await.is_some() {
        let mut burst = 1usize;
        loop {
            match timeout(quiet_period, events.recv()).await {
                Ok(Some(_)) => burst += 1,
                Ok(None) => return,
                Err(_) => break,
            }
        }

        if !shared.settle(burst) {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tokio::time::sleep;

    use crate::monitor::SessionId;

    fn spawn_debouncer(
        quiet_period_ms: u64,
    ) -> (mpsc::UnboundedSender<RawNotification>, Arc<SessionShared>) {
        let shared = Arc::new(SessionShared::new(SessionId::next(), PathBuf::from("/repo")));
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(rx, Duration::from_millis(quiet_period_ms), shared.clone()));
        (tx, shared)
    }

    #[tokio::test]
    async fn test_debouncer_coalesces_rapid_notifications() {
        let (tx, shared) = spawn_debouncer(100);

        // Send multiple rapid notifications
        for _ in 0..10 {
            tx.send(RawNotification).unwrap();
            sleep(Duration::from_millis(10)).await;
        }

        // Nothing settles while the burst is still going
        assert_eq!(shared.settle_count(), 0);

        sleep(Duration::from_millis(250)).await;
        assert_eq!(shared.settle_count(), 1);
    }

    #[tokio::test]
    async fn test_debouncer_separate_bursts() {
        let (tx, shared) = spawn_debouncer(50);

        tx.send(RawNotification).unwrap();
        sleep(Duration::from_millis(200)).await;
        tx.send(RawNotification).unwrap();
        tx.send(RawNotification).unwrap();
        sleep(Duration::from_millis(200)).await;

        assert_eq!(shared.settle_count(), 2);
    }

    #[tokio::test]
    async fn test_debouncer_stops_after_dispose() {
        let (tx, shared) = spawn_debouncer(50);

        tx.send(RawNotification).unwrap();
        shared.dispose();
        sleep(Duration::from_millis(200)).await;

        assert_eq!(shared.settle_count(), 0);
        // The loop has exited and dropped its receiver
        assert!(tx.send(RawNotification).is_err());
    }
}
