use storage::BlockStore;
use types::BlockAddress;

use super::{DeviceDriver, DriverStatus};
use crate::fs::block::HEADER_LEN;

/// Disk shape. Track 0 holds the directory, every other track holds data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub tracks: u8,
    pub sectors: u8,
    pub blocks: u8,
    pub block_size: usize,
}

impl Geometry {
    pub fn payload_size(&self) -> usize {
        self.block_size.saturating_sub(HEADER_LEN)
    }

    /// Every address on the disk in (track, sector, block) order.
    pub fn addresses(&self) -> impl Iterator<Item = BlockAddress> + '_ {
        self.track_range(0..self.tracks)
    }

    /// Directory entries: track 0 minus the master record.
    pub fn directory(&self) -> impl Iterator<Item = BlockAddress> + '_ {
        self.track_range(0..1).skip(1)
    }

    pub fn data(&self) -> impl Iterator<Item = BlockAddress> + '_ {
        self.track_range(1..self.tracks)
    }

    pub fn contains(&self, addr: BlockAddress) -> bool {
        addr.track < self.tracks && addr.sector < self.sectors && addr.block < self.blocks
    }

    fn track_range(&self, tracks: std::ops::Range<u8>) -> impl Iterator<Item = BlockAddress> + '_ {
        tracks.flat_map(move |t| {
            (0..self.sectors)
                .flat_map(move |s| (0..self.blocks).map(move |b| BlockAddress::new(t, s, b)))
        })
    }
}

/// Hard disk driver over the raw block store.
#[derive(Debug)]
pub struct HddDriver {
    store: BlockStore,
    geometry: Geometry,
    status: DriverStatus,
}

impl HddDriver {
    pub fn new(geometry: Geometry) -> Self {
        Self::with_store(BlockStore::new(geometry.block_size), geometry)
    }

    pub fn with_store(store: BlockStore, geometry: Geometry) -> Self {
        Self {
            store,
            geometry,
            status: DriverStatus::Unloaded,
        }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn read_block(&self, addr: BlockAddress) -> Option<Vec<u8>> {
        self.store.read(addr.track, addr.sector, addr.block)
    }

    pub fn write_block(&self, addr: BlockAddress, record: &[u8]) {
        self.store.write(addr.track, addr.sector, addr.block, record);
    }

    pub fn wipe(&self) {
        self.store.wipe();
    }

    pub fn store(&self) -> &BlockStore {
        &self.store
    }
}

impl DeviceDriver for HddDriver {
    fn name(&self) -> &'static str {
        "hdd"
    }

    fn driver_entry(&mut self) {
        self.status = DriverStatus::Loaded;
    }

    fn status(&self) -> DriverStatus {
        self.status
    }
}
