//! Linked-block file system.
//!
//! Track 0 is the directory: block (0,0,0) is the master record and every
//! other track-0 block is a directory entry naming a file and pointing at its
//! first data block. Tracks 1.. hold data blocks, each pointing at the next
//! block of its file. The tail of the data area is reserved as the swap slot.

pub mod block;
mod error;
pub mod swap;

use std::collections::{BTreeMap, VecDeque};

use types::BlockAddress;

pub use block::DiskBlock;
pub use error::FsError;
pub use swap::SwapRegion;

use crate::drivers::{Geometry, HddDriver};
use block::TERMINATOR;

pub const MASTER_RECORD: BlockAddress = BlockAddress::new(0, 0, 0);

/// Written into the master record by `format`.
pub const FS_IDENTIFIER: &[u8] = b"VBOS-FS-V1";

const FORBIDDEN_FILENAME_CHARS: &[char] = &[
    '\\', '/', '*', '?', ':', ';', '+', '[', ']', '{', '}', '<', '>', '(', ')', '\'', '"',
];

/// Checks a filename and returns its stored (upper-case) form.
pub fn normalize_filename(name: &str, max_len: usize) -> Result<String, FsError> {
    let invalid = || FsError::InvalidFilename(name.to_string());
    let len = name.chars().count();
    if len == 0 || len > max_len || name.trim().is_empty() {
        return Err(invalid());
    }
    if name
        .chars()
        .any(|c| FORBIDDEN_FILENAME_CHARS.contains(&c) || c == '\0' || c.is_control())
    {
        return Err(invalid());
    }
    let upper = name.to_uppercase();
    if upper.len() > max_len {
        return Err(invalid());
    }
    Ok(upper)
}

#[derive(Debug)]
pub struct FileSystem {
    hdd: HddDriver,
    formatted: bool,
    /// Filename to directory entry. Always agrees with track 0.
    file_index: BTreeMap<String, BlockAddress>,
    free_blocks: VecDeque<BlockAddress>,
    swap: SwapRegion,
}

impl FileSystem {
    /// Wraps a drive, reserving the last `swap_blocks` data blocks for swapping.
    /// A drive that already carries a file system is mounted as is.
    pub fn new(hdd: HddDriver, swap_blocks: usize) -> Self {
        let data: Vec<BlockAddress> = hdd.geometry().data().collect();
        let reserved = data[data.len().saturating_sub(swap_blocks)..].to_vec();

        let mut fs = Self {
            hdd,
            formatted: false,
            file_index: BTreeMap::new(),
            free_blocks: VecDeque::new(),
            swap: SwapRegion::new(reserved),
        };
        fs.mount();
        fs
    }

    pub fn geometry(&self) -> &Geometry {
        self.hdd.geometry()
    }

    pub fn hdd(&self) -> &HddDriver {
        &self.hdd
    }

    pub fn hdd_mut(&mut self) -> &mut HddDriver {
        &mut self.hdd
    }

    pub fn is_formatted(&self) -> bool {
        self.formatted
    }

    pub fn free_block_count(&self) -> usize {
        self.free_blocks.len()
    }

    pub fn file_count(&self) -> usize {
        self.file_index.len()
    }

    pub fn max_filename_len(&self) -> usize {
        self.geometry().payload_size()
    }

    /// Lays down an empty file system: every block free, the master record
    /// written, and every non-swap data block on the free list.
    pub fn format(&mut self) {
        self.file_index.clear();
        self.free_blocks.clear();
        self.swap.clear_owner();

        let free = DiskBlock::free();
        let addresses: Vec<BlockAddress> = self.geometry().addresses().collect();
        for addr in addresses {
            self.write_block(addr, &free);
        }
        self.write_block(
            MASTER_RECORD,
            &DiskBlock::used(Some(BlockAddress::new(0, 0, 1)), FS_IDENTIFIER),
        );

        let data: Vec<BlockAddress> = self.geometry().data().collect();
        self.free_blocks = data
            .into_iter()
            .filter(|addr| !self.swap.contains(*addr))
            .collect();
        self.formatted = true;
    }

    /// Rebuilds the in-memory index and free list from a previously formatted drive.
    /// Returns false (and leaves the file system unformatted) if the master record is missing.
    pub fn mount(&mut self) -> bool {
        match self.read_block(MASTER_RECORD) {
            Ok(master) if master.used && master.payload == FS_IDENTIFIER => {}
            _ => return false,
        }

        self.file_index.clear();
        self.free_blocks.clear();
        let directory: Vec<BlockAddress> = self.geometry().directory().collect();
        for addr in directory {
            if let Ok(entry) = self.read_block(addr) {
                if entry.used {
                    let name = String::from_utf8_lossy(&entry.payload).into_owned();
                    self.file_index.insert(name, addr);
                }
            }
        }
        let data: Vec<BlockAddress> = self.geometry().data().collect();
        for addr in data {
            if self.swap.contains(addr) {
                continue;
            }
            if matches!(self.read_block(addr), Ok(block) if !block.used) {
                self.free_blocks.push_back(addr);
            }
        }
        self.formatted = true;
        true
    }

    pub fn create(&mut self, filename: &str) -> Result<BlockAddress, FsError> {
        self.ensure_formatted()?;
        let name = normalize_filename(filename, self.max_filename_len())?;
        if self.file_index.contains_key(&name) {
            return Err(FsError::FileExists(name));
        }
        let entry = self.find_free().ok_or(FsError::DirectoryFull)?;
        let first = self.free_blocks.pop_front().ok_or(FsError::DiskFull)?;

        self.write_block(first, &DiskBlock::used(None, &[]));
        self.write_block(entry, &DiskBlock::used(Some(first), name.as_bytes()));
        self.file_index.insert(name, entry);
        Ok(entry)
    }

    pub fn read(&self, filename: &str) -> Result<Vec<u8>, FsError> {
        let (_, _, first) = self.lookup(filename)?;
        let mut content = Vec::new();
        for (_, block) in self.walk(first)? {
            content.extend_from_slice(&block.payload);
        }
        Ok(content)
    }

    /// Replaces the file's contents. Returns the number of blocks now in its chain.
    ///
    /// The existing chain is reused in order, extra blocks come from the free
    /// list, and blocks no longer needed go back to it. Nothing is written
    /// unless the whole file fits.
    pub fn write(&mut self, filename: &str, data: &[u8]) -> Result<usize, FsError> {
        if data.contains(&TERMINATOR) {
            return Err(FsError::InvalidData);
        }
        let (_, _, first) = self.lookup(filename)?;
        let mut chain = self.chain_from(first)?;

        let payload = self.geometry().payload_size();
        let needed = data.len().div_ceil(payload).max(1);
        if needed > chain.len() {
            let extra = needed - chain.len();
            if extra > self.free_blocks.len() {
                return Err(FsError::InsufficientStorage {
                    needed: extra,
                    available: self.free_blocks.len(),
                });
            }
            chain.extend(self.free_blocks.drain(..extra));
        }
        let surplus = chain.split_off(needed);

        let chunks: Vec<&[u8]> = if data.is_empty() {
            vec![data]
        } else {
            data.chunks(payload).collect()
        };
        for (idx, (addr, chunk)) in chain.iter().zip(chunks).enumerate() {
            let next = chain.get(idx + 1).copied();
            self.write_block(*addr, &DiskBlock::used(next, chunk));
        }
        for addr in surplus {
            self.release_block(addr);
        }
        Ok(needed)
    }

    /// Frees the file's chain and directory entry. Returns the number of data blocks freed.
    pub fn delete(&mut self, filename: &str) -> Result<usize, FsError> {
        let (name, entry, first) = self.lookup(filename)?;
        let chain = self.chain_from(first)?;
        let freed = chain.len();
        for addr in chain {
            self.release_block(addr);
        }
        self.write_block(entry, &DiskBlock::free());
        self.file_index.remove(&name);
        Ok(freed)
    }

    /// First unused directory entry, by linear scan.
    pub fn find_free(&self) -> Option<BlockAddress> {
        self.geometry()
            .directory()
            .find(|addr| !matches!(self.read_block(*addr), Ok(block) if block.used))
    }

    /// Directory entry holding `filename`, by linear scan.
    pub fn find_file(&self, filename: &str) -> Option<BlockAddress> {
        let name = normalize_filename(filename, self.max_filename_len()).ok()?;
        self.geometry().directory().find(|addr| {
            matches!(self.read_block(*addr), Ok(block) if block.used && block.payload == name.as_bytes())
        })
    }

    /// Names of every file, in directory order.
    pub fn list_files(&self) -> Result<Vec<String>, FsError> {
        self.ensure_formatted()?;
        let mut names = Vec::new();
        for addr in self.geometry().directory() {
            let entry = self.read_block(addr)?;
            if entry.used {
                names.push(String::from_utf8_lossy(&entry.payload).into_owned());
            }
        }
        Ok(names)
    }

    /// Data blocks of `filename`, in chain order.
    pub fn chain(&self, filename: &str) -> Result<Vec<BlockAddress>, FsError> {
        let (_, _, first) = self.lookup(filename)?;
        self.chain_from(first)
    }

    /// Stored name, directory entry and first data block of an existing file.
    fn lookup(&self, filename: &str) -> Result<(String, BlockAddress, BlockAddress), FsError> {
        self.ensure_formatted()?;
        let name = normalize_filename(filename, self.max_filename_len())?;
        let entry = *self
            .file_index
            .get(&name)
            .ok_or_else(|| FsError::FileNotFound(name.clone()))?;
        let dir = self.read_block(entry)?;
        let first = dir.next.ok_or(FsError::Corrupt {
            address: entry,
            reason: "directory entry has no data block",
        })?;
        Ok((name, entry, first))
    }

    fn chain_from(&self, first: BlockAddress) -> Result<Vec<BlockAddress>, FsError> {
        Ok(self.walk(first)?.into_iter().map(|(addr, _)| addr).collect())
    }

    /// Follows next pointers from `first` until the null address.
    pub(crate) fn walk(&self, first: BlockAddress) -> Result<Vec<(BlockAddress, DiskBlock)>, FsError> {
        let limit = self.geometry().addresses().count();
        let mut blocks = Vec::new();
        let mut cursor = Some(first);
        while let Some(addr) = cursor {
            if blocks.len() >= limit {
                return Err(FsError::Corrupt {
                    address: addr,
                    reason: "block chain loops",
                });
            }
            let block = self.read_block(addr)?;
            cursor = block.next;
            blocks.push((addr, block));
        }
        Ok(blocks)
    }

    fn release_block(&mut self, addr: BlockAddress) {
        self.write_block(addr, &DiskBlock::free());
        self.free_blocks.push_back(addr);
    }

    pub(crate) fn ensure_formatted(&self) -> Result<(), FsError> {
        if self.formatted {
            Ok(())
        } else {
            Err(FsError::NotFormatted)
        }
    }

    pub(crate) fn read_block(&self, addr: BlockAddress) -> Result<DiskBlock, FsError> {
        if !self.geometry().contains(addr) {
            return Err(FsError::Corrupt {
                address: addr,
                reason: "address outside the disk",
            });
        }
        let record = self.hdd.read_block(addr).ok_or(FsError::Corrupt {
            address: addr,
            reason: "block was never written",
        })?;
        DiskBlock::decode(addr, &record)
    }

    pub(crate) fn write_block(&self, addr: BlockAddress, block: &DiskBlock) {
        let size = self.geometry().block_size;
        self.hdd.write_block(addr, &block.encode(size));
    }
}
