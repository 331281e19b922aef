use std::sync::{Arc, Weak};
use std::time::Duration;

use domain::{LabelRenderer, PowerState, PrinterError, RelayPort, RetryPolicy};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::builder::LabelArgs;
use super::shutdown_timer::ShutdownTimer;

/// Decides when the printer is powered and keeps it powered only while used
///
/// Without a relay the printer is assumed to be always on: power-on succeeds
/// immediately and no shutdown timer runs.
///
/// Locking: one mutex guards the shutdown timer and is held across relay
/// writes, never across the liveness probe or a print job. Two callers that
/// both find the relay open will both activate it and both probe; relay writes
/// are idempotent so the state converges.
pub struct PowerManager {
    relay: Option<Arc<dyn RelayPort>>,
    renderer: Arc<dyn LabelRenderer>,
    retry: RetryPolicy,
    timer: Mutex<ShutdownTimer>,
    cancel_token: CancellationToken,
    auto_shutdown: Mutex<Option<JoinHandle<()>>>,
}

impl PowerManager {
    /// Create the manager and, when a relay is present, spawn its auto-shutdown task.
    /// Must be called from within a Tokio runtime.
    pub fn new(
        relay: Option<Arc<dyn RelayPort>>,
        renderer: Arc<dyn LabelRenderer>,
        retry: RetryPolicy,
        shutdown_delay: Duration,
    ) -> Arc<Self> {
        let (timer, deadlines) = ShutdownTimer::new(shutdown_delay);
        let cancel_token = CancellationToken::new();

        Arc::new_cyclic(|weak: &Weak<Self>| {
            let auto_shutdown = relay.as_ref().map(|_| {
                tokio::spawn(auto_shutdown_loop(
                    weak.clone(),
                    deadlines,
                    cancel_token.clone(),
                ))
            });

            Self {
                relay,
                renderer,
                retry,
                timer: Mutex::new(timer),
                cancel_token,
                auto_shutdown: Mutex::new(auto_shutdown),
            }
        })
    }

    pub fn has_relay(&self) -> bool {
        self.relay.is_some()
    }

    /// Tracked power state, `None` when running without a relay
    pub fn power_state(&self) -> Option<PowerState> {
        self.relay.as_deref().map(|relay| PowerState::observe(relay))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// When the shutdown timer will fire, if armed
    pub async fn shutdown_deadline(&self) -> Option<Instant> {
        self.timer.lock().await.deadline()
    }

    /// Whether the auto-shutdown task is still alive
    pub async fn is_auto_shutdown_running(&self) -> bool {
        self.auto_shutdown
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Make sure the printer is powered and responsive
    ///
    /// If the relay is already on only the shutdown timer is reset. Otherwise
    /// the relay is activated (a failed write is not retried) and the printer
    /// probed until it answers. When it never answers the relay is left on so
    /// someone can look at the device.
    pub async fn ensure_power_on(&self) -> Result<(), PrinterError> {
        let Some(relay) = &self.relay else {
            return Ok(());
        };

        {
            let timer = self.timer.lock().await;
            if PowerState::observe(relay.as_ref()).is_on() {
                timer.arm();
                debug!("Printer already powered, auto-shutdown timer reset");
                return Ok(());
            }
        }

        {
            let _timer = self.timer.lock().await;
            info!("Powering on printer");
            relay.activate().await?;
        }

        self.wait_until_responsive().await?;

        let timer = self.timer.lock().await;
        if PowerState::observe(relay.as_ref()).is_on() {
            let at = timer.arm();
            debug!(in_secs = ?at.saturating_duration_since(Instant::now()), "Auto-shutdown timer armed");
        }
        Ok(())
    }

    /// Status inquiry straight to the device, without any power handling
    pub async fn probe(&self) -> Result<String, PrinterError> {
        self.renderer.run(&LabelArgs::new().info().build()).await
    }

    async fn wait_until_responsive(&self) -> Result<(), PrinterError> {
        let mut last_error = match self.probe().await {
            Ok(_) => return Ok(()),
            Err(e) => e,
        };

        for (index, delay) in self.retry.delays().enumerate() {
            warn!(
                attempt = index + 2,
                of = self.retry.attempts(),
                delay_secs = delay.as_secs_f64(),
                error = %last_error,
                "Printer not responding, retrying"
            );
            sleep(delay).await;

            match self.probe().await {
                Ok(_) => {
                    info!(attempt = index + 2, "Printer responded");
                    return Ok(());
                }
                Err(e) => last_error = e,
            }
        }

        error!(attempts = self.retry.attempts(), "Printer did not respond after turning on");
        Err(PrinterError::LivenessTimeout {
            attempts: self.retry.attempts(),
            last_error: last_error.to_string(),
        })
    }

    async fn on_timer_fired(&self) {
        let timer = self.timer.lock().await;

        // Reset or disarmed between the wake-up and taking the lock
        if !timer.is_due(Instant::now()) {
            return;
        }
        timer.disarm();

        let Some(relay) = &self.relay else {
            return;
        };

        if !PowerState::observe(relay.as_ref()).is_on() {
            debug!("Auto-shutdown: relay already off");
            return;
        }

        info!(
            after_secs = timer.delay().as_secs(),
            "Auto-shutdown: Turning off printer after inactivity"
        );
        if let Err(e) = relay.deactivate().await {
            error!(error = %e, "Error during auto-shutdown");
            // Still powered, so try again after another full delay
            timer.arm();
        }
    }

    /// Stop the auto-shutdown task, disarm the timer and power the printer down
    ///
    /// Safe to call more than once; a failed relay write is logged, not returned.
    pub async fn shutdown(&self) {
        self.cancel_token.cancel();

        let handle = self.auto_shutdown.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Auto-shutdown task ended abnormally");
            }
        }

        let timer = self.timer.lock().await;
        timer.disarm();

        let Some(relay) = &self.relay else {
            return;
        };

        if PowerState::observe(relay.as_ref()).is_on() {
            match relay.deactivate().await {
                Ok(()) => info!("Printer turned off during shutdown"),
                Err(e) => error!(error = %e, "Error turning off printer during close"),
            }
        }
    }
}

async fn auto_shutdown_loop(
    manager: Weak<PowerManager>,
    mut deadlines: watch::Receiver<Option<Instant>>,
    cancel_token: CancellationToken,
) {
    debug!("Auto-shutdown task started");

    loop {
        let deadline = *deadlines.borrow_and_update();

        tokio::select! {
            _ = cancel_token.cancelled() => {
                debug!("Auto-shutdown task cancelled");
                break;
            }
            changed = deadlines.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = sleep_until_deadline(deadline) => {
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                manager.on_timer_fired().await;
            }
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use domain::{RelayError, RelayState};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FlagRelay {
        active: AtomicBool,
        writes: AtomicUsize,
    }

    impl FlagRelay {
        fn new(active: bool) -> Arc<Self> {
            Arc::new(Self {
                active: AtomicBool::new(active),
                writes: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RelayPort for FlagRelay {
        async fn activate(&self) -> Result<(), RelayError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.active.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn deactivate(&self) -> Result<(), RelayError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.active.store(false, Ordering::SeqCst);
            Ok(())
        }

        fn current_state(&self) -> RelayState {
            if self.active.load(Ordering::SeqCst) {
                RelayState::Active
            } else {
                RelayState::Inactive
            }
        }
    }

    struct AlwaysUp;

    #[async_trait]
    impl LabelRenderer for AlwaysUp {
        async fn run(&self, _args: &[String]) -> Result<String, PrinterError> {
            Ok("ok".to_string())
        }
    }

    fn manager(relay: Option<Arc<dyn RelayPort>>) -> Arc<PowerManager> {
        PowerManager::new(
            relay,
            Arc::new(AlwaysUp),
            RetryPolicy::from_secs(3, 1),
            Duration::from_secs(60),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_relay_has_no_task_and_no_state() {
        let pm = manager(None);
        assert!(!pm.has_relay());
        assert_eq!(pm.power_state(), None);
        assert!(!pm.is_auto_shutdown_running().await);
        pm.ensure_power_on().await.unwrap();
        assert_eq!(pm.shutdown_deadline().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_on_only_resets_timer() {
        let relay = FlagRelay::new(true);
        let pm = manager(Some(relay.clone()));

        pm.ensure_power_on().await.unwrap();

        assert_eq!(relay.writes.load(Ordering::SeqCst), 0);
        assert_eq!(
            pm.shutdown_deadline().await,
            Some(Instant::now() + Duration::from_secs(60))
        );
        pm.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_task() {
        let relay = FlagRelay::new(false);
        let pm = manager(Some(relay.clone()));
        assert!(pm.is_auto_shutdown_running().await);

        pm.shutdown().await;

        assert!(!pm.is_auto_shutdown_running().await);
        assert_eq!(relay.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_exits_when_manager_dropped() {
        let relay = FlagRelay::new(false);
        let pm = manager(Some(relay));
        let handle = pm.auto_shutdown.lock().await.take().unwrap();

        drop(pm);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("task should stop once the manager is gone")
            .unwrap();
    }
}
