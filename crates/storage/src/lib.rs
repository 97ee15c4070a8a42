#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;

/// Simulated disk: fixed-size records addressed by a (track, sector, block) triple.
///
/// The store knows nothing about file systems. It only guarantees that every
/// record it hands back is exactly `record_size` bytes long: short writes are
/// zero padded and long writes truncated. A block that was never written (or
/// was wiped) reads as `None`, which is how an unformatted drive looks.
///
/// Uses a `RefCell` so a shared reference can still write, the same way the
/// drive is shared between the file system and the swap region.
#[derive(Debug)]
pub struct BlockStore {
    record_size: usize,
    /// Raw records keyed by their "tsb" composite key.
    pub map: RefCell<BTreeMap<String, Vec<u8>>>,
}

impl BlockStore {
    pub fn new(record_size: usize) -> Self {
        Self::with_map(record_size, BTreeMap::new())
    }

    /// Creates a store over pre-existing records, e.g. a disk image loaded by a test.
    pub fn with_map(record_size: usize, initial: BTreeMap<String, Vec<u8>>) -> Self {
        Self {
            record_size,
            map: RefCell::new(initial),
        }
    }

    fn build_composite_key(track: u8, sector: u8, block: u8) -> String {
        format!("{}{}{}", track, sector, block)
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }

    pub fn read(&self, track: u8, sector: u8, block: u8) -> Option<Vec<u8>> {
        let key = Self::build_composite_key(track, sector, block);
        self.map.borrow().get(&key).cloned()
    }

    pub fn write(&self, track: u8, sector: u8, block: u8, record: &[u8]) {
        let mut stored = vec![0u8; self.record_size];
        let len = record.len().min(self.record_size);
        stored[..len].copy_from_slice(&record[..len]);

        let key = Self::build_composite_key(track, sector, block);
        self.map.borrow_mut().insert(key, stored);
    }

    /// Forgets every record, leaving the drive unformatted.
    pub fn wipe(&self) {
        self.map.borrow_mut().clear();
    }

    /// Number of blocks that currently hold a record.
    pub fn len(&self) -> usize {
        self.map.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.borrow().is_empty()
    }

    /// Dumps every written record as hex, one block per line.
    #[cfg(feature = "std")]
    pub fn dump(&self) {
        std::println!("--- Disk Dump ---");
        for (key, value) in self.map.borrow().iter() {
            std::println!("Block {} | {}", key, hex::encode(value));
        }
        std::println!("-----------------");
    }
}
