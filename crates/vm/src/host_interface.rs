use std::fmt::Debug;

/// Observer for the memory table: told about every byte the MMU writes.
pub trait MemoryDisplay: Debug {
    fn update_display(&mut self, address: usize, value: u8);
}

#[derive(Debug, Default)]
pub struct NoopDisplay;

impl MemoryDisplay for NoopDisplay {
    fn update_display(&mut self, _address: usize, _value: u8) {}
}
