use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::InputError;
use crate::token::{MAX_MATCH, MIN_HASH_LEN};

/// 64KB is large enough to hold the recurring structure of typical log
/// records while keeping distances short.
pub const DEFAULT_DICTIONARY_BUDGET: usize = 64 * 1024;
pub const MAX_DICTIONARY_BUDGET: usize = 16 * 1024 * 1024;
pub const DEFAULT_MIN_MATCH: u16 = 3;
pub const MAX_MIN_MATCH: u16 = 64;
pub const DEFAULT_ENTRY_OVERHEAD: u32 = 4;
pub const DEFAULT_MAX_CHAIN: u32 = 4096;

/// Tunables for a training run. Every field has a default, so a JSON file
/// only needs to name the values it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Upper bound on the dictionary size in bytes.
    pub dictionary_budget: usize,
    /// Shortest copy the matcher will emit.
    pub min_match: u16,
    /// Fixed cost subtracted from every dictionary candidate's gain.
    pub entry_overhead: u32,
    /// Hash chain positions examined per lookup.
    pub max_chain: u32,
    /// Threads for the statistics pass; 0 picks one per CPU.
    pub workers: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dictionary_budget: DEFAULT_DICTIONARY_BUDGET,
            min_match: DEFAULT_MIN_MATCH,
            entry_overhead: DEFAULT_ENTRY_OVERHEAD,
            max_chain: DEFAULT_MAX_CHAIN,
            workers: 0,
        }
    }
}

impl TrainingConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, InputError> {
        let raw = std::fs::read_to_string(path)?;
        let config: TrainingConfig = serde_json::from_str(&raw)
            .map_err(|e| InputError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if self.dictionary_budget > MAX_DICTIONARY_BUDGET {
            return Err(InputError::InvalidConfig(format!(
                "dictionary_budget {} exceeds maximum {}",
                self.dictionary_budget, MAX_DICTIONARY_BUDGET
            )));
        }
        if !(MIN_HASH_LEN as u16..=MAX_MIN_MATCH).contains(&self.min_match) {
            return Err(InputError::InvalidConfig(format!(
                "min_match {} outside {}..={}",
                self.min_match, MIN_HASH_LEN, MAX_MIN_MATCH
            )));
        }
        if self.max_chain == 0 {
            return Err(InputError::InvalidConfig("max_chain must be at least 1".into()));
        }
        debug_assert!((self.min_match as usize) < MAX_MATCH);
        Ok(())
    }

    pub fn worker_count(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get().max(1)
        } else {
            self.workers
        }
    }
}
