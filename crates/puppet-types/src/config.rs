//! Pipeline sizing parameters.
//!
//! Every pool, table, and width is fixed for the lifetime of a pipeline;
//! the parameters live in a validated configuration struct so test
//! harnesses can shrink them without rebuilding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The scheduling pool needs the running-set position plus at least one
    /// candidate.
    #[error("scheduling pool must hold at least two entries (log_scheduling_pool = {0})")]
    PoolTooSmall(u32),

    /// Winner masks are 32 bits wide.
    #[error("scheduling pool larger than 32 is unsupported (log_scheduling_pool = {0})")]
    PoolTooLarge(u32),

    /// The name space bounds every bit-vector; keep it sane.
    #[error("name space larger than 2^20 is unsupported (log_live_objects = {0})")]
    NameSpaceTooLarge(u32),

    /// Every shard must hold at least one slot.
    #[error("shard count exceeds name space (log_shards = {log_shards}, log_live_objects = {log_live_objects})")]
    TooManyShards {
        /// Configured shard count exponent.
        log_shards: u32,
        /// Configured name space exponent.
        log_live_objects: u32,
    },

    /// Probing past the shard size revisits slots.
    #[error("probe bound exceeds shard size (log_hashes = {log_hashes}, shard slots = 2^{log_shard_slots})")]
    TooManyHashes {
        /// Configured probe bound exponent.
        log_hashes: u32,
        /// Slots per shard, as an exponent.
        log_shard_slots: u32,
    },

    /// A transaction must execute for at least one cycle.
    #[error("transaction duration must be nonzero")]
    ZeroDuration,

    /// The renamer needs at least one in-flight slot.
    #[error("max_pending_transactions must be nonzero")]
    NoPendingSlots,
}

/// Sizing parameters for the whole pipeline.
///
/// Defaults: 1024 renamable names across 8 shards, a scheduling pool of 8,
/// 2 comparators, 8 puppets, 8 probe attempts, and a 2000-cycle
/// transaction duration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// log2 of the renamed name space.
    #[serde(default = "default_log_live_objects")]
    pub log_live_objects: u32,

    /// log2 of the scheduling pool size (rounds per tournament).
    #[serde(default = "default_log_scheduling_pool")]
    pub log_scheduling_pool: u32,

    /// log2 of pair-merges per scheduler cycle.
    #[serde(default = "default_log_comparators")]
    pub log_comparators: u32,

    /// log2 of the puppet pool size.
    #[serde(default = "default_log_puppets")]
    pub log_puppets: u32,

    /// log2 of the rename-table shard count.
    #[serde(default = "default_log_shards")]
    pub log_shards: u32,

    /// log2 of the linear-probing bound.
    #[serde(default = "default_log_hashes")]
    pub log_hashes: u32,

    /// Cycles a puppet stays busy per transaction.
    #[serde(default = "default_tx_duration")]
    pub tx_duration: u64,

    /// Renamer in-flight transaction slots.
    #[serde(default = "default_max_pending_transactions")]
    pub max_pending_transactions: usize,
}

fn default_log_live_objects() -> u32 {
    10
}

fn default_log_scheduling_pool() -> u32 {
    3
}

fn default_log_comparators() -> u32 {
    1
}

fn default_log_puppets() -> u32 {
    3
}

fn default_log_shards() -> u32 {
    3
}

fn default_log_hashes() -> u32 {
    3
}

fn default_tx_duration() -> u64 {
    2000
}

fn default_max_pending_transactions() -> usize {
    16
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            log_live_objects: default_log_live_objects(),
            log_scheduling_pool: default_log_scheduling_pool(),
            log_comparators: default_log_comparators(),
            log_puppets: default_log_puppets(),
            log_shards: default_log_shards(),
            log_hashes: default_log_hashes(),
            tx_duration: default_tx_duration(),
            max_pending_transactions: default_max_pending_transactions(),
        }
    }
}

impl SystemConfig {
    /// Check the structural relationships between the parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_scheduling_pool == 0 {
            return Err(ConfigError::PoolTooSmall(self.log_scheduling_pool));
        }
        if self.log_scheduling_pool > 5 {
            return Err(ConfigError::PoolTooLarge(self.log_scheduling_pool));
        }
        if self.log_live_objects > 20 {
            return Err(ConfigError::NameSpaceTooLarge(self.log_live_objects));
        }
        if self.log_shards > self.log_live_objects {
            return Err(ConfigError::TooManyShards {
                log_shards: self.log_shards,
                log_live_objects: self.log_live_objects,
            });
        }
        if self.log_hashes > self.log_shard_slots() {
            return Err(ConfigError::TooManyHashes {
                log_hashes: self.log_hashes,
                log_shard_slots: self.log_shard_slots(),
            });
        }
        if self.tx_duration == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if self.max_pending_transactions == 0 {
            return Err(ConfigError::NoPendingSlots);
        }
        Ok(())
    }

    /// Size of the renamed name space.
    pub fn num_names(&self) -> usize {
        1 << self.log_live_objects
    }

    /// Scheduling pool size (running set plus candidates).
    pub fn pool_size(&self) -> usize {
        1 << self.log_scheduling_pool
    }

    /// Merge rounds per tournament.
    pub fn rounds(&self) -> usize {
        self.log_scheduling_pool as usize
    }

    /// Pair-merges per scheduler cycle.
    pub fn comparators(&self) -> usize {
        1 << self.log_comparators
    }

    /// Number of puppets.
    pub fn num_puppets(&self) -> usize {
        1 << self.log_puppets
    }

    /// Number of rename-table shards.
    pub fn num_shards(&self) -> usize {
        1 << self.log_shards
    }

    /// Linear-probing bound per rename.
    pub fn num_hashes(&self) -> usize {
        1 << self.log_hashes
    }

    /// log2 of slots per shard.
    pub fn log_shard_slots(&self) -> u32 {
        self.log_live_objects - self.log_shards
    }

    /// Slots per shard.
    pub fn shard_slots(&self) -> usize {
        1 << self.log_shard_slots()
    }

    /// Reference-counter saturation bound.
    pub fn max_refs(&self) -> u32 {
        self.num_names() as u32
    }
}
