use core::fmt;

/// Width of an encoded block address on disk ("tsb" or "---").
pub const ADDRESS_LEN: usize = 3;

/// Encoded form of a missing next-block pointer.
pub const NULL_ADDRESS: [u8; ADDRESS_LEN] = *b"---";

/// Location of one block on the simulated disk.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockAddress {
    pub track: u8,
    pub sector: u8,
    pub block: u8,
}

/// Raised when three bytes are neither a digit triple nor `NULL_ADDRESS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidAddress(pub [u8; ADDRESS_LEN]);

impl fmt::Display for InvalidAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid block address bytes {:02x?}", self.0)
    }
}

impl BlockAddress {
    pub const fn new(track: u8, sector: u8, block: u8) -> Self {
        Self { track, sector, block }
    }

    /// Each coordinate is stored as a single ASCII digit, so geometry is capped at 10.
    pub fn encode(self) -> [u8; ADDRESS_LEN] {
        [b'0' + self.track, b'0' + self.sector, b'0' + self.block]
    }

    pub fn decode(raw: &[u8]) -> Result<Self, InvalidAddress> {
        let bytes = Self::take(raw)?;
        if !bytes.iter().all(u8::is_ascii_digit) {
            return Err(InvalidAddress(bytes));
        }
        Ok(Self::new(bytes[0] - b'0', bytes[1] - b'0', bytes[2] - b'0'))
    }

    /// Encodes a next-block pointer, using `NULL_ADDRESS` for the end of a chain.
    pub fn encode_link(link: Option<BlockAddress>) -> [u8; ADDRESS_LEN] {
        match link {
            Some(addr) => addr.encode(),
            None => NULL_ADDRESS,
        }
    }

    pub fn decode_link(raw: &[u8]) -> Result<Option<BlockAddress>, InvalidAddress> {
        let bytes = Self::take(raw)?;
        if bytes == NULL_ADDRESS {
            return Ok(None);
        }
        Self::decode(&bytes).map(Some)
    }

    fn take(raw: &[u8]) -> Result<[u8; ADDRESS_LEN], InvalidAddress> {
        let mut bytes = [0u8; ADDRESS_LEN];
        if raw.len() < ADDRESS_LEN {
            bytes[..raw.len()].copy_from_slice(raw);
            return Err(InvalidAddress(bytes));
        }
        bytes.copy_from_slice(&raw[..ADDRESS_LEN]);
        Ok(bytes)
    }
}

impl fmt::Debug for BlockAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.track, self.sector, self.block)
    }
}

impl fmt::Display for BlockAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.track, self.sector, self.block)
    }
}
