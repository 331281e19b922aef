use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use application::printer::PowerManager;
use async_trait::async_trait;
use domain::{RelayError, RelayPort, RelayState, RetryPolicy};
use infrastructure::{MockRelay, MockRenderer};
use mockall::mock;
use tokio::time::sleep;

const TWO_MINUTES: Duration = Duration::from_secs(120);

mock! {
    pub GpioLine {}

    #[async_trait]
    impl RelayPort for GpioLine {
        async fn activate(&self) -> Result<(), RelayError>;
        async fn deactivate(&self) -> Result<(), RelayError>;
        fn current_state(&self) -> RelayState;
    }
}

fn power_manager(relay: Arc<dyn RelayPort>) -> Arc<PowerManager> {
    PowerManager::new(
        Some(relay),
        Arc::new(MockRenderer::new()),
        RetryPolicy::from_secs(3, 1),
        TWO_MINUTES,
    )
}

#[tokio::test(start_paused = true)]
async fn test_idle_timeout_writes_exactly_one_deactivate() {
    let active = Arc::new(AtomicBool::new(false));
    let mut line = MockGpioLine::new();

    let flag = active.clone();
    line.expect_activate().times(1).returning(move || {
        flag.store(true, Ordering::SeqCst);
        Ok(())
    });
    let flag = active.clone();
    line.expect_deactivate().times(1).returning(move || {
        flag.store(false, Ordering::SeqCst);
        Ok(())
    });
    let flag = active.clone();
    line.expect_current_state().returning(move || {
        if flag.load(Ordering::SeqCst) {
            RelayState::Active
        } else {
            RelayState::Inactive
        }
    });

    let pm = power_manager(Arc::new(line));
    pm.ensure_power_on().await.unwrap();

    // Well past the two minute window with no activity
    sleep(Duration::from_secs(10 * 60)).await;

    assert!(!active.load(Ordering::SeqCst));
    assert_eq!(pm.shutdown_deadline().await, None);

    // Relay already off: close must not write again
    pm.shutdown().await;
    drop(pm);
}

#[tokio::test(start_paused = true)]
async fn test_activity_postpones_shutdown() {
    let relay = MockRelay::new();
    let pm = power_manager(Arc::new(relay.clone()));

    pm.ensure_power_on().await.unwrap();
    sleep(Duration::from_secs(90)).await;
    pm.ensure_power_on().await.unwrap();

    sleep(Duration::from_secs(90)).await;
    assert_eq!(relay.current_state(), RelayState::Active);

    sleep(Duration::from_secs(31)).await;
    assert_eq!(relay.current_state(), RelayState::Inactive);
    assert_eq!(relay.write_count(RelayState::Inactive).await, 1);

    pm.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_fire_is_noop_after_out_of_band_toggle() {
    let relay = MockRelay::new();
    let pm = power_manager(Arc::new(relay.clone()));

    pm.ensure_power_on().await.unwrap();
    relay.force_state(RelayState::Inactive);

    sleep(Duration::from_secs(3 * 60)).await;

    assert_eq!(*relay.writes.lock().await, vec![RelayState::Active]);
    assert_eq!(pm.shutdown_deadline().await, None);

    pm.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_auto_shutdown_is_retried_after_next_delay() {
    let relay = MockRelay::new();
    let pm = power_manager(Arc::new(relay.clone()));

    pm.ensure_power_on().await.unwrap();
    relay.set_fail_writes(true);

    sleep(TWO_MINUTES + Duration::from_secs(1)).await;
    assert_eq!(relay.current_state(), RelayState::Active);
    assert!(pm.shutdown_deadline().await.is_some());

    relay.set_fail_writes(false);
    sleep(TWO_MINUTES).await;
    assert_eq!(relay.current_state(), RelayState::Inactive);

    pm.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_is_idempotent_and_stops_task() {
    let relay = MockRelay::new();
    let pm = power_manager(Arc::new(relay.clone()));
    pm.ensure_power_on().await.unwrap();
    assert!(pm.is_auto_shutdown_running().await);

    pm.shutdown().await;
    pm.shutdown().await;

    assert!(!pm.is_auto_shutdown_running().await);
    assert_eq!(pm.shutdown_deadline().await, None);
    assert_eq!(relay.write_count(RelayState::Inactive).await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_ignores_relay_failure() {
    let relay = MockRelay::new();
    let pm = power_manager(Arc::new(relay.clone()));
    pm.ensure_power_on().await.unwrap();
    relay.set_fail_writes(true);

    pm.shutdown().await;

    assert_eq!(relay.current_state(), RelayState::Active);
    assert!(!pm.is_auto_shutdown_running().await);
}
