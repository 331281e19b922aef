use serde::{Deserialize, Serialize};

use crate::relay::{RelayPort, RelayState};

/// Power state of the printer as tracked from the last relay command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerState {
    #[default]
    Off,
    On,
}

impl PowerState {
    /// Read the tracked state of a relay
    pub fn observe(relay: &dyn RelayPort) -> Self {
        relay.current_state().into()
    }

    pub fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }
}

impl From<RelayState> for PowerState {
    fn from(state: RelayState) -> Self {
        match state {
            RelayState::Active => Self::On,
            RelayState::Inactive => Self::Off,
        }
    }
}

impl std::fmt::Display for PowerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Off => write!(f, "OFF"),
            Self::On => write!(f, "ON"),
        }
    }
}
