use std::collections::{BTreeMap, VecDeque};

use thiserror::Error;
use types::{Mode, Pid};

use crate::host_interface::{MemoryDisplay, NoopDisplay};
use crate::memory::Memory;

/// A fixed partition of main memory, `[base, limit]` inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Frame {
    pub base: usize,
    pub limit: usize,
}

impl Frame {
    pub const fn new(base: usize, limit: usize) -> Self {
        Self { base, limit }
    }

    pub fn len(&self) -> usize {
        self.limit - self.base + 1
    }

    pub fn contains(&self, address: usize) -> bool {
        address >= self.base && address <= self.limit
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryFault {
    #[error("access violation: process {pid} touched physical address 0x{address:04X}")]
    AccessViolation { pid: Pid, address: usize },
    #[error("out of memory: no free partition")]
    OutOfMemory,
    #[error("user-mode access with no active process")]
    NoActiveProcess,
    #[error("process {0} has no partition")]
    Unmapped(Pid),
    #[error("physical address 0x{0:04X} is outside main memory")]
    OutOfBounds(usize),
    #[error("process {0} already owns a partition")]
    AlreadyMapped(Pid),
    #[error("image of {len} bytes does not fit a {frame_size} byte partition")]
    ImageTooLarge { len: usize, frame_size: usize },
}

/// Fixed-partition memory manager.
///
/// Main memory is cut into `memory_size / frame_size` equal frames. Each
/// resident process owns exactly one. The free list hands frames out from the
/// front and takes released frames back at the front, so the most recently
/// freed frame is the next one reused.
///
/// In `Mode::Kernel` addresses are physical. In `Mode::User` they are offsets
/// into the active process's frame and every access is range checked first;
/// a failing check leaves memory untouched.
#[derive(Debug)]
pub struct Mmu {
    memory: Memory,
    frame_size: usize,
    free_list: VecDeque<Frame>,
    memory_map: BTreeMap<Pid, Frame>,
    mode: Mode,
    active: Option<Pid>,
    display: Box<dyn MemoryDisplay>,
}

impl Mmu {
    pub fn new(memory_size: usize, frame_size: usize) -> Self {
        Self::with_display(memory_size, frame_size, Box::new(NoopDisplay))
    }

    pub fn with_display(
        memory_size: usize,
        frame_size: usize,
        display: Box<dyn MemoryDisplay>,
    ) -> Self {
        let mut mmu = Self {
            memory: Memory::new(memory_size),
            frame_size,
            free_list: VecDeque::new(),
            memory_map: BTreeMap::new(),
            mode: Mode::Kernel,
            active: None,
            display,
        };
        mmu.init();
        mmu
    }

    /// Clears memory, forgets every mapping and re-seeds the free list in address order.
    pub fn init(&mut self) {
        self.memory.clear_all();
        self.memory_map.clear();
        self.free_list.clear();
        self.mode = Mode::Kernel;
        self.active = None;

        let frames = self.max_frames();
        for idx in 0..frames {
            let base = idx * self.frame_size;
            self.free_list
                .push_back(Frame::new(base, base + self.frame_size - 1));
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn memory_size(&self) -> usize {
        self.memory.size()
    }

    pub fn max_frames(&self) -> usize {
        if self.frame_size == 0 {
            0
        } else {
            self.memory.size() / self.frame_size
        }
    }

    pub fn allocate(&mut self, pid: Pid) -> Result<Frame, MemoryFault> {
        if self.memory_map.contains_key(&pid) {
            return Err(MemoryFault::AlreadyMapped(pid));
        }
        let frame = self.free_list.pop_front().ok_or(MemoryFault::OutOfMemory)?;
        self.memory_map.insert(pid, frame);
        Ok(frame)
    }

    /// Releases `pid`'s frame. Returns `None` (and changes nothing) if it had none.
    pub fn deallocate(&mut self, pid: Pid) -> Option<Frame> {
        let frame = self.memory_map.remove(&pid)?;
        self.clear_frame(frame);
        self.free_list.push_front(frame);
        if self.active == Some(pid) {
            self.active = None;
        }
        Some(frame)
    }

    pub fn read(&self, address: usize) -> Result<u8, MemoryFault> {
        let physical = self.translate(address)?;
        self.memory
            .read_byte(physical)
            .ok_or(MemoryFault::OutOfBounds(physical))
    }

    pub fn write(&mut self, address: usize, value: u8) -> Result<(), MemoryFault> {
        let physical = self.translate(address)?;
        if !self.memory.write_byte(physical, value) {
            return Err(MemoryFault::OutOfBounds(physical));
        }
        self.display.update_display(physical, value);
        Ok(())
    }

    /// Resolves `address` to a physical address under the current mode.
    pub fn translate(&self, address: usize) -> Result<usize, MemoryFault> {
        match self.mode {
            Mode::Kernel => Ok(address),
            Mode::User => {
                let pid = self.active.ok_or(MemoryFault::NoActiveProcess)?;
                let frame = self
                    .memory_map
                    .get(&pid)
                    .ok_or(MemoryFault::Unmapped(pid))?;
                let physical = frame.base.saturating_add(address);
                self.range_check(physical)?;
                Ok(physical)
            }
        }
    }

    /// Checks a physical address against the active process's frame.
    pub fn range_check(&self, physical: usize) -> Result<(), MemoryFault> {
        let pid = self.active.ok_or(MemoryFault::NoActiveProcess)?;
        let frame = self
            .memory_map
            .get(&pid)
            .ok_or(MemoryFault::Unmapped(pid))?;
        if frame.contains(physical) {
            Ok(())
        } else {
            Err(MemoryFault::AccessViolation {
                pid,
                address: physical,
            })
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn active(&self) -> Option<Pid> {
        self.active
    }

    pub fn set_active(&mut self, pid: Option<Pid>) {
        self.active = pid;
    }

    pub fn frame_of(&self, pid: Pid) -> Option<Frame> {
        self.memory_map.get(&pid).copied()
    }

    pub fn is_mapped(&self, pid: Pid) -> bool {
        self.memory_map.contains_key(&pid)
    }

    pub fn free_frame_count(&self) -> usize {
        self.free_list.len()
    }

    pub fn free_frames(&self) -> impl Iterator<Item = &Frame> {
        self.free_list.iter()
    }

    /// Resident processes and their frames, in pid order.
    pub fn mappings(&self) -> impl Iterator<Item = (&Pid, &Frame)> {
        self.memory_map.iter()
    }

    /// Copies out the whole frame owned by `pid`.
    pub fn read_frame(&self, pid: Pid) -> Result<Vec<u8>, MemoryFault> {
        let frame = self.frame_of(pid).ok_or(MemoryFault::Unmapped(pid))?;
        self.memory
            .mem_slice(frame.base, frame.limit + 1)
            .map(<[u8]>::to_vec)
            .ok_or(MemoryFault::OutOfBounds(frame.limit))
    }

    /// Replaces the contents of `pid`'s frame with `image`, zero filling the rest.
    pub fn load_frame(&mut self, pid: Pid, image: &[u8]) -> Result<(), MemoryFault> {
        let frame = self.frame_of(pid).ok_or(MemoryFault::Unmapped(pid))?;
        if image.len() > frame.len() {
            return Err(MemoryFault::ImageTooLarge {
                len: image.len(),
                frame_size: frame.len(),
            });
        }
        for offset in 0..frame.len() {
            let value = image.get(offset).copied().unwrap_or(0);
            let physical = frame.base + offset;
            if !self.memory.write_byte(physical, value) {
                return Err(MemoryFault::OutOfBounds(physical));
            }
            self.display.update_display(physical, value);
        }
        Ok(())
    }

    /// Hands `from`'s frame to `to` without touching its bytes.
    pub fn transfer(&mut self, from: Pid, to: Pid) -> Result<Frame, MemoryFault> {
        if self.memory_map.contains_key(&to) {
            return Err(MemoryFault::AlreadyMapped(to));
        }
        let frame = self
            .memory_map
            .remove(&from)
            .ok_or(MemoryFault::Unmapped(from))?;
        self.memory_map.insert(to, frame);
        if self.active == Some(from) {
            self.active = None;
        }
        Ok(frame)
    }

    /// Raw physical view, for display dumps and tests.
    pub fn physical(&self, start: usize, end: usize) -> Option<&[u8]> {
        self.memory.mem_slice(start, end)
    }

    fn clear_frame(&mut self, frame: Frame) {
        self.memory.clear(frame.base, frame.limit);
        for address in frame.base..=frame.limit {
            self.display.update_display(address, 0);
        }
    }
}
