/// Flat main memory shared by every process.
///
/// Access through here is unchecked apart from the physical size; protection
/// and address translation belong to the `Mmu`.
#[derive(Debug, Clone)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    pub fn new(memory_size: usize) -> Self {
        Self {
            bytes: vec![0u8; memory_size],
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn read_byte(&self, addr: usize) -> Option<u8> {
        self.bytes.get(addr).copied()
    }

    /// Returns false when `addr` lies past the end of memory.
    pub fn write_byte(&mut self, addr: usize, value: u8) -> bool {
        match self.bytes.get_mut(addr) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Zeroes `[start, end]` (inclusive), clamped to the memory size.
    pub fn clear(&mut self, start: usize, end: usize) {
        if start >= self.bytes.len() || start > end {
            return;
        }
        let end = end.min(self.bytes.len() - 1);
        self.bytes[start..=end].fill(0);
    }

    pub fn clear_all(&mut self) {
        self.bytes.fill(0);
    }

    /// Borrow a slice of memory, or `None` when the range is out of bounds.
    pub fn mem_slice(&self, start: usize, end: usize) -> Option<&[u8]> {
        self.bytes.get(start..end)
    }
}
