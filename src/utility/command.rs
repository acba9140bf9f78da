//! Argument-vector construction for the external utility
//!
//! Every operation is validated here before any subprocess is spawned.
//! Arguments are emitted as discrete tokens and never pass through a
//! shell, so caller-supplied strings cannot be reinterpreted.

use crate::error::{RxdError, RxdResult};

/// Volume identifiers are `rxd` followed by a decimal index
pub const VOLUME_PREFIX: &str = "rxd";

/// Cache mapping identifiers are `rxc` followed by a decimal index
pub const CACHE_PREFIX: &str = "rxc";

/// Block size (in KB) passed to every cache mapping. Fixed by the
/// utility contract, not exposed to API callers.
pub const CACHE_BLOCK_SIZE_KB: u32 = 8;

/// One operation against the external utility
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtilityOp {
    /// List all volumes and cache mappings
    List,

    /// Read cache statistics for a mapping
    CacheStats { cache: String },

    /// Create a new volume of `size_mb` megabytes
    Attach { size_mb: u64 },

    /// Grow an existing volume to `size_mb` megabytes
    Resize { volume: String, size_mb: u64 },

    /// Remove a volume
    Detach { volume: String },

    /// Bind a volume as a cache in front of a source device
    CacheMap { volume: String, source: String },

    /// Remove a cache mapping
    CacheUnmap { cache: String },
}

impl UtilityOp {
    /// Build the argument vector for this operation.
    ///
    /// Returns `InvalidArgument` when any parameter violates its
    /// constraint; no partial vector is ever produced.
    pub fn build(&self) -> RxdResult<Vec<String>> {
        match self {
            Self::List => Ok(vec!["--short-list".to_string()]),

            Self::CacheStats { cache } => {
                validate_cache_id(cache)?;
                Ok(vec!["--stat-cache".to_string(), cache.clone()])
            }

            Self::Attach { size_mb } => {
                validate_size(*size_mb)?;
                Ok(vec!["--attach".to_string(), size_mb.to_string()])
            }

            Self::Resize { volume, size_mb } => {
                validate_volume_id(volume)?;
                validate_size(*size_mb)?;
                Ok(vec![
                    "--resize".to_string(),
                    volume.clone(),
                    size_mb.to_string(),
                ])
            }

            Self::Detach { volume } => {
                validate_volume_id(volume)?;
                Ok(vec!["--detach".to_string(), volume.clone()])
            }

            Self::CacheMap { volume, source } => {
                validate_volume_id(volume)?;
                if source.is_empty() {
                    return Err(RxdError::invalid_argument("source device must not be empty"));
                }
                Ok(vec![
                    "--rxc-map".to_string(),
                    volume.clone(),
                    source.clone(),
                    CACHE_BLOCK_SIZE_KB.to_string(),
                ])
            }

            Self::CacheUnmap { cache } => {
                validate_cache_id(cache)?;
                Ok(vec!["--rxc-unmap".to_string(), cache.clone()])
            }
        }
    }

    /// Whether this operation mutates device state
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::List | Self::CacheStats { .. })
    }
}

fn matches_pattern(id: &str, prefix: &str) -> bool {
    match id.strip_prefix(prefix) {
        Some(suffix) => !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Check a volume identifier against the strict `rxd<N>` grammar
pub fn validate_volume_id(id: &str) -> RxdResult<()> {
    if matches_pattern(id, VOLUME_PREFIX) {
        Ok(())
    } else {
        Err(RxdError::invalid_argument(format!(
            "'{id}' is not a valid volume identifier (expected {VOLUME_PREFIX}<N>)"
        )))
    }
}

/// Check a cache mapping identifier against the strict `rxc<N>` grammar
pub fn validate_cache_id(id: &str) -> RxdResult<()> {
    if matches_pattern(id, CACHE_PREFIX) {
        Ok(())
    } else {
        Err(RxdError::invalid_argument(format!(
            "'{id}' is not a valid cache mapping identifier (expected {CACHE_PREFIX}<N>)"
        )))
    }
}

fn validate_size(size_mb: u64) -> RxdResult<()> {
    if size_mb >= 1 {
        Ok(())
    } else {
        Err(RxdError::invalid_argument(
            "size must be a positive number of megabytes",
        ))
    }
}
