use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fs::block::HEADER_LEN;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Machine description. Every field has a default, so a config file only
/// needs the values it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bytes of main memory.
    pub memory_size: usize,
    /// Bytes per partition; also the size of a program's address space.
    pub address_space: usize,
    /// CPU cycles a process runs before it is preempted.
    pub quantum: u32,
    pub default_priority: u32,
    pub tracks: u8,
    pub sectors: u8,
    pub blocks: u8,
    /// Bytes per disk record, header included.
    pub block_size: usize,
    /// Record kernel trace messages.
    pub trace: bool,
    /// Echo the trace to stdout.
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            memory_size: 768,
            address_space: 256,
            quantum: 6,
            default_priority: 1,
            tracks: 4,
            sectors: 8,
            blocks: 8,
            block_size: 64,
            trace: true,
            verbose: false,
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address_space == 0 {
            return Err(invalid("address_space", "must be positive"));
        }
        if self.address_space > 1 << 16 {
            return Err(invalid("address_space", "must fit 16-bit addresses"));
        }
        if self.memory_size == 0 || self.memory_size % self.address_space != 0 {
            return Err(invalid(
                "memory_size",
                format!("must be a non-zero multiple of {}", self.address_space),
            ));
        }
        if self.quantum == 0 {
            return Err(invalid("quantum", "must be at least 1"));
        }
        if !(2..=10).contains(&self.tracks) {
            return Err(invalid("tracks", "must be between 2 and 10"));
        }
        if !(1..=10).contains(&self.sectors) {
            return Err(invalid("sectors", "must be between 1 and 10"));
        }
        if !(1..=10).contains(&self.blocks) {
            return Err(invalid("blocks", "must be between 1 and 10"));
        }
        if self.block_size <= HEADER_LEN + 1 {
            return Err(invalid(
                "block_size",
                format!("must be larger than {}", HEADER_LEN + 1),
            ));
        }
        if self.swap_blocks() >= self.data_blocks() {
            return Err(invalid(
                "tracks",
                format!(
                    "{} data blocks cannot hold a {} block swap region",
                    self.data_blocks(),
                    self.swap_blocks()
                ),
            ));
        }
        Ok(())
    }

    /// Processes that fit in main memory at once.
    pub fn max_processes(&self) -> usize {
        self.memory_size / self.address_space
    }

    pub fn payload_size(&self) -> usize {
        self.block_size.saturating_sub(HEADER_LEN)
    }

    /// Blocks reserved for the swapped-out image (hex encoded, so twice the size).
    pub fn swap_blocks(&self) -> usize {
        let payload = self.payload_size().max(1);
        (2 * self.address_space).div_ceil(payload)
    }

    pub fn data_blocks(&self) -> usize {
        (self.tracks as usize).saturating_sub(1) * self.sectors as usize * self.blocks as usize
    }
}
