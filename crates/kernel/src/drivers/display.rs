use std::fmt::Debug;

use vm::MemoryDisplay;

use super::{DeviceDriver, DriverStatus};
use crate::process::Pcb;

/// Status bar collaborator.
pub trait StatusBar: Debug {
    fn update_status_message(&mut self, text: &str);
}

/// PCB panel collaborator.
pub trait PcbDisplay: Debug {
    fn update_pcb_display(&mut self, pcb: &Pcb);
}

#[derive(Debug, Default)]
pub struct NoopStatusBar;

impl StatusBar for NoopStatusBar {
    fn update_status_message(&mut self, _text: &str) {}
}

#[derive(Debug, Default)]
pub struct NoopPcbDisplay;

impl PcbDisplay for NoopPcbDisplay {
    fn update_pcb_display(&mut self, _pcb: &Pcb) {}
}

/// Wraps a display collaborator so it loads like any other device. Updates
/// sent before `driver_entry` are dropped.
macro_rules! display_driver {
    ($driver:ident, $inner:ident, $name:literal) => {
        #[derive(Debug)]
        pub struct $driver {
            inner: Box<dyn $inner>,
            status: DriverStatus,
        }

        impl $driver {
            pub fn new(inner: Box<dyn $inner>) -> Self {
                Self {
                    inner,
                    status: DriverStatus::Unloaded,
                }
            }

            fn loaded(&self) -> bool {
                self.status == DriverStatus::Loaded
            }
        }

        impl DeviceDriver for $driver {
            fn name(&self) -> &'static str {
                $name
            }

            fn driver_entry(&mut self) {
                self.status = DriverStatus::Loaded;
            }

            fn status(&self) -> DriverStatus {
                self.status
            }
        }
    };
}

display_driver!(MemoryDisplayDriver, MemoryDisplay, "memory display");
display_driver!(StatusBarDriver, StatusBar, "status bar");
display_driver!(PcbDisplayDriver, PcbDisplay, "pcb display");

impl MemoryDisplay for MemoryDisplayDriver {
    fn update_display(&mut self, address: usize, value: u8) {
        if self.loaded() {
            self.inner.update_display(address, value);
        }
    }
}

impl StatusBarDriver {
    pub fn update_status_message(&mut self, text: &str) {
        if self.loaded() {
            self.inner.update_status_message(text);
        }
    }
}

impl PcbDisplayDriver {
    pub fn update_pcb_display(&mut self, pcb: &Pcb) {
        if self.loaded() {
            self.inner.update_pcb_display(pcb);
        }
    }
}
