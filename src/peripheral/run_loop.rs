use std::sync::Arc;
use tokio::sync::watch;

/// Handle on the run loop, cloned into everything that may end it. Stopping
/// is immediate and does not unwind registrations by itself.
#[derive(Debug, Clone)]
pub struct RunContext {
    stop: Arc<watch::Sender<bool>>,
}

impl Default for RunContext {
    fn default() -> Self {
        RunContext::new()
    }
}

impl RunContext {
    pub fn new() -> Self {
        let (stop, _) = watch::channel(false);
        RunContext {
            stop: Arc::new(stop),
        }
    }

    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }

    /// Resolves once [`RunContext::stop`] has been called on any clone.
    pub async fn stopped(&self) {
        let mut rx = self.stop.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn stop_wakes_every_waiter() {
        let context = RunContext::new();
        let waiter = context.clone();
        let task = tokio::spawn(async move { waiter.stopped().await });

        assert!(!context.is_stopped());
        context.stop();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
        assert!(context.is_stopped());
    }

    #[tokio::test]
    async fn stopped_returns_immediately_after_stop() {
        let context = RunContext::new();
        context.stop();
        context.stopped().await;
    }
}
