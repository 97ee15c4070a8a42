//! Device drivers. Each device exposes the same small capability surface so
//! the kernel can load and report on them uniformly.

pub mod display;
pub mod hdd;
pub mod keyboard;

pub use display::{
    MemoryDisplayDriver, NoopPcbDisplay, NoopStatusBar, PcbDisplay, PcbDisplayDriver, StatusBar,
    StatusBarDriver,
};
pub use hdd::{Geometry, HddDriver};
pub use keyboard::KeyboardDriver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverStatus {
    #[default]
    Unloaded,
    Loaded,
}

pub trait DeviceDriver {
    fn name(&self) -> &'static str;

    /// Initialization routine, run once at boot.
    fn driver_entry(&mut self);

    fn status(&self) -> DriverStatus;
}
