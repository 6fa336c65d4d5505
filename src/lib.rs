pub mod advertisement;
pub mod agent;
pub mod config;
pub mod error;
pub mod gardener;
pub mod gatt;
pub mod logging;
pub mod peripheral;
pub mod uuid_ext;

pub use error::{Error, ErrorType};
pub use peripheral::{run_loop::RunContext, BluetoothStack, Peripheral, Stage};
pub use uuid_ext::SdpShortUuid;

#[cfg(target_os = "linux")]
pub use peripheral::bluez::BluezStack;
