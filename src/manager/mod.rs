//! Device manager facade
//!
//! One method per API operation. Each mutating call follows the same
//! shape: validate, acquire the per-identifier guard, invoke the
//! utility, translate failure. The utility's live view is the only
//! source of truth; nothing about device existence is cached between
//! calls.

pub mod guard;

use crate::config::schema::UtilityConfig;
use crate::error::{RxdError, RxdResult};
use crate::utility::command::UtilityOp;
use crate::utility::invoker::{Invocation, Invoke, RapidDiskInvoker};
use crate::utility::parser::{self, CacheStats, ListEntry, Volume};
use crate::utility::translate;
use guard::MutationGuard;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Guard key serializing creates, which have no target identifier yet.
/// The utility scans for the next free slot, so two concurrent
/// attaches race inside it.
const ATTACH_GUARD_KEY: &str = "\u{0}attach";

/// Orchestrates validation, guarding, invocation, and translation
pub struct DeviceManager {
    invoker: Arc<dyn Invoke>,
    guard: MutationGuard,
    timeout: Duration,
}

impl DeviceManager {
    /// Build a manager over an arbitrary invoker (tests use a mock)
    pub fn new(invoker: Arc<dyn Invoke>, timeout: Duration) -> Self {
        Self {
            invoker,
            guard: MutationGuard::new(),
            timeout,
        }
    }

    /// Build a manager running the real utility per deployment config
    pub fn from_config(config: &UtilityConfig) -> Self {
        Self::new(
            Arc::new(RapidDiskInvoker::new(config)),
            Duration::from_secs(config.timeout_secs),
        )
    }

    async fn invoke_checked(&self, args: &[String]) -> RxdResult<Invocation> {
        let invocation = self.invoker.invoke(args, self.timeout).await?;
        if invocation.success() {
            Ok(invocation)
        } else {
            Err(translate::translate(&invocation))
        }
    }

    /// List all volumes and cache mappings the utility reports
    pub async fn list(&self) -> RxdResult<Vec<ListEntry>> {
        let args = UtilityOp::List.build()?;
        let invocation = self.invoke_checked(&args).await?;
        parser::parse_list(&invocation.stdout)
    }

    /// Read the current statistics for one cache mapping
    pub async fn cache_stats(&self, cache: &str) -> RxdResult<CacheStats> {
        let args = UtilityOp::CacheStats {
            cache: cache.to_string(),
        }
        .build()?;
        let invocation = self.invoke_checked(&args).await?;
        parser::parse_stats(&invocation.stdout)
    }

    /// Create a new volume of `size_mb` megabytes
    pub async fn create(&self, size_mb: u64) -> RxdResult<String> {
        let args = UtilityOp::Attach { size_mb }.build()?;

        let _permit = self.guard.acquire(ATTACH_GUARD_KEY).await;
        let invocation = self.invoke_checked(&args).await?;
        info!("Created volume of {size_mb} MB");
        Ok(invocation.stdout_joined())
    }

    /// Grow an existing volume to `size_mb` megabytes.
    ///
    /// The utility only grows volumes; a non-growing request is
    /// rejected here before any mutating subprocess runs.
    pub async fn resize(&self, volume: &str, size_mb: u64) -> RxdResult<String> {
        let op = UtilityOp::Resize {
            volume: volume.to_string(),
            size_mb,
        };
        let args = op.build()?;

        let _permit = self.guard.acquire(volume).await;

        let current = self
            .find_volume(volume)
            .await?
            .ok_or_else(|| RxdError::not_found(format!("volume '{volume}' does not exist")))?;
        if size_mb <= current.size_mb {
            return Err(RxdError::invalid_argument(format!(
                "volume '{volume}' is {} MB; resize can only grow it",
                current.size_mb
            )));
        }

        let invocation = self.invoke_checked(&args).await?;
        info!("Resized volume {volume} to {size_mb} MB");
        Ok(invocation.stdout_joined())
    }

    /// Remove a volume.
    ///
    /// A volume referenced by an active cache mapping fails as `Busy`,
    /// surfaced from the utility rather than masked.
    pub async fn remove(&self, volume: &str) -> RxdResult<String> {
        let args = UtilityOp::Detach {
            volume: volume.to_string(),
        }
        .build()?;

        let _permit = self.guard.acquire(volume).await;
        let invocation = self.invoke_checked(&args).await?;
        info!("Removed volume {volume}");
        Ok(invocation.stdout_joined())
    }

    /// Bind a volume as a cache in front of a source device
    pub async fn map_create(&self, volume: &str, source: &str) -> RxdResult<String> {
        let args = UtilityOp::CacheMap {
            volume: volume.to_string(),
            source: source.to_string(),
        }
        .build()?;

        let _permit = self.guard.acquire(volume).await;
        let invocation = self.invoke_checked(&args).await?;
        info!("Mapped volume {volume} in front of {source}");
        Ok(invocation.stdout_joined())
    }

    /// Remove a cache mapping
    pub async fn map_remove(&self, cache: &str) -> RxdResult<String> {
        let args = UtilityOp::CacheUnmap {
            cache: cache.to_string(),
        }
        .build()?;

        let _permit = self.guard.acquire(cache).await;
        let invocation = self.invoke_checked(&args).await?;
        info!("Unmapped cache {cache}");
        Ok(invocation.stdout_joined())
    }

    /// Look up one volume in the utility's live list
    async fn find_volume(&self, name: &str) -> RxdResult<Option<Volume>> {
        let entries = self.list().await?;
        Ok(entries.into_iter().find_map(|entry| match entry {
            ListEntry::Volume(v) if v.name == name => Some(v),
            _ => None,
        }))
    }
}
