use types::{ADDRESS_LEN, BlockAddress};

use super::FsError;

/// Status byte plus next-block address.
pub const HEADER_LEN: usize = 1 + ADDRESS_LEN;

pub const STATUS_FREE: u8 = b'0';
pub const STATUS_USED: u8 = b'1';

/// Payload terminator and padding.
pub const TERMINATOR: u8 = 0;

/// One on-disk record: `[status][next][payload][NUL padding]`.
///
/// Directory entries use `next` for the file's first data block and the
/// payload for its name. Data blocks use `next` for the rest of the chain.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiskBlock {
    pub used: bool,
    pub next: Option<BlockAddress>,
    pub payload: Vec<u8>,
}

impl DiskBlock {
    pub fn free() -> Self {
        Self::default()
    }

    pub fn used(next: Option<BlockAddress>, payload: &[u8]) -> Self {
        Self {
            used: true,
            next,
            payload: payload.to_vec(),
        }
    }

    /// Encodes to exactly `block_size` bytes; an over-long payload is truncated.
    pub fn encode(&self, block_size: usize) -> Vec<u8> {
        let mut record = vec![TERMINATOR; block_size.max(HEADER_LEN)];
        record[0] = if self.used { STATUS_USED } else { STATUS_FREE };
        record[1..HEADER_LEN].copy_from_slice(&BlockAddress::encode_link(self.next));

        let room = block_size.saturating_sub(HEADER_LEN);
        let len = self.payload.len().min(room);
        record[HEADER_LEN..HEADER_LEN + len].copy_from_slice(&self.payload[..len]);
        record
    }

    /// Decodes a record. The payload ends at the first NUL or the end of the record.
    pub fn decode(address: BlockAddress, record: &[u8]) -> Result<Self, FsError> {
        if record.len() < HEADER_LEN {
            return Err(FsError::Corrupt {
                address,
                reason: "record shorter than its header",
            });
        }
        let used = match record[0] {
            STATUS_USED => true,
            STATUS_FREE => false,
            _ => {
                return Err(FsError::Corrupt {
                    address,
                    reason: "bad status byte",
                });
            }
        };
        let next = BlockAddress::decode_link(&record[1..HEADER_LEN]).map_err(|_| {
            FsError::Corrupt {
                address,
                reason: "bad next-block address",
            }
        })?;
        let body = &record[HEADER_LEN..];
        let end = body
            .iter()
            .position(|b| *b == TERMINATOR)
            .unwrap_or(body.len());
        Ok(Self {
            used,
            next,
            payload: body[..end].to_vec(),
        })
    }
}
