use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use domain::relay::{RelayPort, RelayState};
use domain::RelayError;
use tokio::fs;
use tracing::{error, info, warn};

/// Relay on a Linux GPIO line driven through sysfs (`/sys/class/gpio`)
///
/// Most relay boards are active-low: pulling the line LOW closes the relay.
pub struct SysfsRelay {
    pin: u32,
    value_path: PathBuf,
    active_low: bool,
    active: AtomicBool,
}

impl SysfsRelay {
    /// Export the pin if needed and configure it as an output with the relay open
    pub async fn open(root: impl AsRef<Path>, pin: u32, active_low: bool) -> Result<Self, RelayError> {
        let root = root.as_ref();
        let pin_dir = root.join(format!("gpio{}", pin));

        if !fs::try_exists(&pin_dir).await.unwrap_or(false) {
            fs::write(root.join("export"), pin.to_string())
                .await
                .map_err(|e| RelayError::InitFailed {
                    pin,
                    reason: format!("export failed: {}", e),
                })?;
            wait_for_export(&pin_dir).await;
        }

        // "high"/"low" set output direction and initial level in one write
        let direction = if active_low { "high" } else { "low" };
        fs::write(pin_dir.join("direction"), direction)
            .await
            .map_err(|e| RelayError::InitFailed {
                pin,
                reason: format!("set direction failed: {}", e),
            })?;

        info!(pin, active_low, "GPIO{} initialized as relay control", pin);

        Ok(Self {
            pin,
            value_path: pin_dir.join("value"),
            active_low,
            active: AtomicBool::new(false),
        })
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }

    /// Open the relay if it is still closed, logging instead of failing
    pub async fn close(&self) {
        if !self.current_state().is_active() {
            info!(pin = self.pin, "GPIO{} relay closed", self.pin);
            return;
        }
        if let Err(e) = self.deactivate().await {
            warn!(pin = self.pin, error = %e, "Failed to turn off relay during close");
        }
        info!(pin = self.pin, "GPIO{} relay closed", self.pin);
    }

    fn level_for(&self, state: RelayState) -> &'static str {
        match (state, self.active_low) {
            (RelayState::Active, true) | (RelayState::Inactive, false) => "0",
            (RelayState::Active, false) | (RelayState::Inactive, true) => "1",
        }
    }

    async fn write_state(&self, state: RelayState) -> Result<(), RelayError> {
        let level = self.level_for(state);
        if let Err(e) = fs::write(&self.value_path, level).await {
            error!(pin = self.pin, error = %e, "Failed to write relay level");
            return Err(RelayError::WriteFailed {
                pin: self.pin,
                reason: e.to_string(),
            });
        }
        self.active.store(state.is_active(), Ordering::SeqCst);
        Ok(())
    }
}

async fn wait_for_export(pin_dir: &Path) {
    // The kernel creates the pin directory asynchronously after export
    for _ in 0..10 {
        if fs::try_exists(pin_dir.join("direction")).await.unwrap_or(false) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[async_trait]
impl RelayPort for SysfsRelay {
    async fn activate(&self) -> Result<(), RelayError> {
        self.write_state(RelayState::Active).await?;
        info!(pin = self.pin, "Relay on GPIO{} turned ON", self.pin);
        Ok(())
    }

    async fn deactivate(&self) -> Result<(), RelayError> {
        self.write_state(RelayState::Inactive).await?;
        info!(pin = self.pin, "Relay on GPIO{} turned OFF", self.pin);
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
