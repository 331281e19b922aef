use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Last commanded relay output, never read back from hardware
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelayState {
    /// Relay closed, printer energized
    Active,
    /// Relay open, printer unpowered
    #[default]
    Inactive,
}

impl RelayState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Binary actuator switching the printer's power supply
///
/// Implementations perform no retries. A write has completed when the call
/// returns, and `current_state` only changes after a successful write.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RelayPort: Send + Sync {
    /// Energize the printer
    async fn activate(&self) -> Result<(), RelayError>;

    /// Cut power to the printer
    async fn deactivate(&self) -> Result<(), RelayError>;

    /// Last successfully commanded state
    fn current_state(&self) -> RelayState;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_inactive() {
        assert_eq!(RelayState::default(), RelayState::Inactive);
        assert!(!RelayState::default().is_active());
        assert!(RelayState::Active.is_active());
    }
}
