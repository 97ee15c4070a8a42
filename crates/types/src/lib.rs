#![no_std]

pub mod address;
pub use address::{BlockAddress, InvalidAddress, ADDRESS_LEN, NULL_ADDRESS};

pub mod primitives;
pub use primitives::*;

pub mod interrupt;
pub use interrupt::*;
