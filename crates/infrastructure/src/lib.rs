//! Infrastructure layer - Hardware, process and configuration adapters

pub mod config;
pub mod printer;
pub mod relay;

pub use config::AgentConfig;
pub use printer::{MockRenderer, ProcessRenderer};
pub use relay::{MockRelay, SysfsRelay};
