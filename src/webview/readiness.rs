//! Readiness detector (spec §4.4): tracks the four idle signals for a tab
//! and resolves `wait_for_idle` waiters once all four are true.

use tokio::sync::{oneshot, Mutex};

use crate::error::BrowserError;

#[derive(Debug, Clone, Copy)]
struct Signals {
    did_finish_navigation: bool,
    dom_stable: bool,
    network_idle: bool,
    ready_state_complete: bool,
}

impl Signals {
    fn start() -> Self {
        Self {
            did_finish_navigation: false,
            dom_stable: false,
            network_idle: true,
            ready_state_complete: false,
        }
    }

    fn is_idle(&self) -> bool {
        self.did_finish_navigation && self.dom_stable && self.network_idle && self.ready_state_complete
    }
}

struct Inner {
    signals: Signals,
    waiters: Vec<oneshot::Sender<()>>,
}

/// One per tab. `navigate` resets signals via [`ReadinessDetector::reset`];
/// the bridge's posted events call the `on_*` setters; `wait_for_idle`
/// suspends the caller until idle or a timeout fires.
pub struct ReadinessDetector {
    inner: Mutex<Inner>,
}

impl ReadinessDetector {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner { signals: Signals::start(), waiters: Vec::new() }),
        }
    }

    /// Reset for a new navigation. Still-pending waiters remain pending
    /// (spec §4.4: "they are waiting for the next idle").
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.signals = Signals::start();
    }

    pub async fn on_did_finish_navigation(&self) {
        self.set(|s| {
            s.did_finish_navigation = true;
            s.ready_state_complete = true;
        })
        .await;
    }

    pub async fn on_dom_stable(&self) {
        self.set(|s| s.dom_stable = true).await;
    }

    pub async fn on_network_busy(&self) {
        self.set(|s| s.network_idle = false).await;
    }

    pub async fn on_network_idle(&self) {
        self.set(|s| s.network_idle = true).await;
    }

    pub async fn on_ready_state_complete(&self) {
        self.set(|s| s.ready_state_complete = true).await;
    }

    async fn set(&self, f: impl FnOnce(&mut Signals)) {
        let mut inner = self.inner.lock().await;
        f(&mut inner.signals);
        if inner.signals.is_idle() {
            for waiter in inner.waiters.drain(..) {
                let _ = waiter.send(());
            }
        }
    }

    /// Suspend until idle or `timeout` elapses, whichever first.
    pub async fn wait_for_idle(&self, timeout: std::time::Duration) -> Result<(), BrowserError> {
        let rx = {
            let mut inner = self.inner.lock().await;
            if inner.signals.is_idle() {
                return Ok(());
            }
            let (tx, rx) = oneshot::channel();
            inner.waiters.push(tx);
            rx
        };

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(BrowserError::Internal("readiness waiter dropped".into())),
            Err(_) => Err(BrowserError::Timeout("timed out waiting for idle".into())),
        }
    }

    /// Resolve every pending waiter with a cancellation-shaped wake so tab
    /// teardown doesn't leave tasks suspended forever (spec §4.3 teardown).
    pub async fn cancel_all(&self) {
        let mut inner = self.inner.lock().await;
        for waiter in inner.waiters.drain(..) {
            let _ = waiter.send(());
        }
    }
}

impl Default for ReadinessDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn idle_starts_with_network_idle_true_only() {
        let detector = ReadinessDetector::new();
        // did_finish_navigation and ready_state_complete are false at start,
        // so wait_for_idle must time out quickly rather than resolve.
        let result = detector.wait_for_idle(Duration::from_millis(20)).await;
        assert!(matches!(result, Err(BrowserError::Timeout(_))));
    }

    #[tokio::test]
    async fn all_four_signals_resolve_waiter() {
        let detector = ReadinessDetector::new();
        detector.on_did_finish_navigation().await;
        detector.on_dom_stable().await;
        // network_idle already true by default.
        let result = detector.wait_for_idle(Duration::from_millis(200)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn network_busy_blocks_idle_until_idle_again() {
        let detector = ReadinessDetector::new();
        detector.on_did_finish_navigation().await;
        detector.on_dom_stable().await;
        detector.on_network_busy().await;

        let result = detector.wait_for_idle(Duration::from_millis(20)).await;
        assert!(matches!(result, Err(BrowserError::Timeout(_))));

        detector.on_network_idle().await;
        let result = detector.wait_for_idle(Duration::from_millis(200)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn reset_returns_to_pending() {
        let detector = ReadinessDetector::new();
        detector.on_did_finish_navigation().await;
        detector.on_dom_stable().await;
        detector.reset().await;
        let result = detector.wait_for_idle(Duration::from_millis(20)).await;
        assert!(matches!(result, Err(BrowserError::Timeout(_))));
    }
}
