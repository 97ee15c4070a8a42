use thiserror::Error;
use types::{BlockAddress, Pid};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FsError {
    #[error("the disk is not formatted")]
    NotFormatted,
    #[error("invalid filename {0:?}")]
    InvalidFilename(String),
    #[error("file data may not contain NUL bytes")]
    InvalidData,
    #[error("file {0} already exists")]
    FileExists(String),
    #[error("file {0} not found")]
    FileNotFound(String),
    #[error("no free directory entry")]
    DirectoryFull,
    #[error("no free data block")]
    DiskFull,
    #[error("insufficient storage: {needed} more blocks needed, {available} free")]
    InsufficientStorage { needed: usize, available: usize },
    #[error("corrupt block {address}: {reason}")]
    Corrupt {
        address: BlockAddress,
        reason: &'static str,
    },
    #[error("swap slot is held by process {0}")]
    SwapBusy(Pid),
    #[error("process {0} has no image in the swap slot")]
    NotSwapped(Pid),
    #[error("image of {len} bytes exceeds the {capacity} byte swap slot")]
    SwapTooLarge { len: usize, capacity: usize },
}
