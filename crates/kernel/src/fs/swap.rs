use types::{BlockAddress, Pid};

use super::{DiskBlock, FileSystem, FsError};

/// The reserved run of data blocks that holds one swapped-out process image.
///
/// Images are hex encoded and chained through the blocks in address order.
/// These blocks never appear on the free list or in any file's chain.
#[derive(Debug, Clone)]
pub struct SwapRegion {
    blocks: Vec<BlockAddress>,
    owner: Option<Pid>,
}

impl SwapRegion {
    pub fn new(blocks: Vec<BlockAddress>) -> Self {
        Self { blocks, owner: None }
    }

    pub fn blocks(&self) -> &[BlockAddress] {
        &self.blocks
    }

    pub fn owner(&self) -> Option<Pid> {
        self.owner
    }

    pub fn contains(&self, addr: BlockAddress) -> bool {
        self.blocks.contains(&addr)
    }

    pub(crate) fn clear_owner(&mut self) {
        self.owner = None;
    }
}

impl FileSystem {
    pub fn swap_region(&self) -> &SwapRegion {
        &self.swap
    }

    pub fn swap_owner(&self) -> Option<Pid> {
        self.swap.owner
    }

    /// Largest raw image the slot can hold.
    pub fn swap_capacity(&self) -> usize {
        self.swap.blocks.len() * self.geometry().payload_size() / 2
    }

    /// Stores `image` as `pid`'s swapped-out copy. Fails if another image is held.
    pub fn write_swap(&mut self, pid: Pid, image: &[u8]) -> Result<(), FsError> {
        self.ensure_formatted()?;
        if let Some(owner) = self.swap.owner {
            return Err(FsError::SwapBusy(owner));
        }
        if image.len() > self.swap_capacity() {
            return Err(FsError::SwapTooLarge {
                len: image.len(),
                capacity: self.swap_capacity(),
            });
        }

        let encoded = hex::encode(image);
        let payload = self.geometry().payload_size();
        let chunks: Vec<&[u8]> = encoded.as_bytes().chunks(payload).collect();
        for (idx, addr) in self.swap.blocks.iter().enumerate() {
            let block = match chunks.get(idx) {
                Some(chunk) => {
                    let next = if idx + 1 < chunks.len() {
                        self.swap.blocks.get(idx + 1).copied()
                    } else {
                        None
                    };
                    DiskBlock::used(next, chunk)
                }
                None => DiskBlock::free(),
            };
            self.write_block(*addr, &block);
        }
        self.swap.owner = Some(pid);
        Ok(())
    }

    /// Reads back `pid`'s image. The slot stays held until `release_swap`.
    pub fn read_swap(&self, pid: Pid) -> Result<Vec<u8>, FsError> {
        self.ensure_formatted()?;
        if self.swap.owner != Some(pid) {
            return Err(FsError::NotSwapped(pid));
        }
        let first = *self.swap.blocks.first().ok_or(FsError::NotSwapped(pid))?;

        let mut encoded = Vec::new();
        for (_, block) in self.walk(first)? {
            encoded.extend_from_slice(&block.payload);
        }
        hex::decode(&encoded).map_err(|_| FsError::Corrupt {
            address: first,
            reason: "swap image is not hex",
        })
    }

    /// Frees the slot if `pid` holds it. Returns whether anything was released.
    pub fn release_swap(&mut self, pid: Pid) -> bool {
        if self.swap.owner != Some(pid) {
            return false;
        }
        let free = DiskBlock::free();
        for addr in &self.swap.blocks {
            self.write_block(*addr, &free);
        }
        self.swap.owner = None;
        true
    }
}
