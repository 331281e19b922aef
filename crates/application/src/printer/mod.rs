pub mod builder;
pub mod power_manager;
pub mod session;
pub mod shutdown_timer;

pub use builder::LabelArgs;
pub use power_manager::PowerManager;
pub use session::{PrinterSession, SessionSettings, UNKNOWN_VERSION};
pub use shutdown_timer::ShutdownTimer;
