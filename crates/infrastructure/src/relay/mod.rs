pub mod mock_relay;
pub mod sysfs_relay;

pub use mock_relay::MockRelay;
pub use sysfs_relay::SysfsRelay;
