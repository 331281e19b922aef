//! Application layer - Printer power management and command execution

pub mod printer;

pub use printer::{PowerManager, PrinterSession, SessionSettings};
