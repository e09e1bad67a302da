use std::time::Duration;

use tokio::task::JoinHandle;

/// Single-slot delayed action. Arming replaces whatever was pending.
#[derive(Debug, Default)]
pub struct DebounceTimer {
    slot: Option<JoinHandle<()>>,
}

impl DebounceTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm<F>(&mut self, delay: Duration, on_elapsed: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        self.slot = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_elapsed();
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(pending) = self.slot.take() {
            pending.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.slot
            .as_ref()
            .is_some_and(|pending| !pending.is_finished())
    }
}

impl Drop for DebounceTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
