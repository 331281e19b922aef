//! Domain layer - Pure types and ports for the label printing appliance
//!
//! This crate contains:
//! - Value Objects (PowerState, RelayState, RetryPolicy, Preset, RequesterId)
//! - Ports (RelayPort, LabelRenderer)
//! - The printer error taxonomy
//!
//! Principles:
//! - No I/O, no runtime
//! - Hardware and process seams are traits implemented in infrastructure
//! - Testable in isolation

pub mod error;
pub mod power;
pub mod preset;
pub mod preview;
pub mod printer;
pub mod relay;
pub mod retry;

// Re-export commonly used types
pub use error::{PrinterError, RelayError, Result};
pub use power::PowerState;
pub use preset::Preset;
pub use preview::RequesterId;
pub use printer::LabelRenderer;
pub use relay::{RelayPort, RelayState};
pub use retry::RetryPolicy;
