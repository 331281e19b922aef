use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use domain::relay::{RelayPort, RelayState};
use domain::RelayError;
use tokio::sync::Mutex;

/// In-memory relay recording every successful write
#[derive(Clone, Default)]
pub struct MockRelay {
    active: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    pub writes: Arc<Mutex<Vec<RelayState>>>,
}

impl MockRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relay that is already closed, as after a previous power-on
    pub fn already_active() -> Self {
        let relay = Self::default();
        relay.active.store(true, Ordering::SeqCst);
        relay
    }

    /// Make subsequent writes fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Change the tracked state without recording a write, like a manual toggle
    pub fn force_state(&self, state: RelayState) {
        self.active.store(state.is_active(), Ordering::SeqCst);
    }

    pub async fn write_count(&self, state: RelayState) -> usize {
        self.writes.lock().await.iter().filter(|s| **s == state).count()
    }

    async fn write(&self, state: RelayState) -> Result<(), RelayError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RelayError::WriteFailed {
                pin: 0,
                reason: "simulated write failure".to_string(),
            });
        }
        self.writes.lock().await.push(state);
        self.active.store(state.is_active(), Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl RelayPort for MockRelay {
    async fn activate(&self) -> Result<(), RelayError> {
        self.write(RelayState::Active).await
    }

    async fn deactivate(&self) -> Result<(), RelayError> {
        self.write(RelayState::Inactive).await
    }

    fn current_state(&self) -> RelayState {
        if self.active.load(Ordering::SeqCst) {
            RelayState::Active
        } else {
            RelayState::Inactive
        }
    }
}
