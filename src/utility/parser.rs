//! Parsing of the utility's line-oriented output
//!
//! The utility has no machine-readable output mode. `--short-list`
//! emits one colon-delimited line per device; `--stat-cache` emits a
//! multi-line block where counter lines carry `name(value)` pairs.
//! Anything that deviates from those shapes is `MalformedOutput`,
//! except unrecognized list tags, which are skipped so a newer utility
//! can add device classes without breaking us.

use crate::error::{RxdError, RxdResult};
use crate::utility::command::{CACHE_PREFIX, VOLUME_PREFIX};
use std::collections::BTreeMap;

/// A RAM-backed block device as reported by the utility
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub name: String,
    pub size_mb: u64,
}

/// A cache mapping binding a volume in front of a source device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheMapping {
    pub name: String,
    pub cache: String,
    pub source: String,
}

/// One entry from the utility's device list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEntry {
    Volume(Volume),
    Mapping(CacheMapping),
}

/// Counters every supported utility version reports
const REQUIRED_COUNTERS: [&str; 4] = ["reads", "writes", "cache hits", "cache misses"];

/// Point-in-time cache statistics for one mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub reads: u64,
    pub writes: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Version-dependent counters, in name order
    pub extra: BTreeMap<String, u64>,
}

impl CacheStats {
    /// Render the stable single-line form used as the wire message:
    /// required counters first, then extras, each as `name(value)`.
    pub fn normalized(&self) -> String {
        let mut parts = vec![
            format!("reads({})", self.reads),
            format!("writes({})", self.writes),
            format!("cache hits({})", self.cache_hits),
            format!("cache misses({})", self.cache_misses),
        ];
        for (name, value) in &self.extra {
            parts.push(format!("{name}({value})"));
        }
        parts.join(" ")
    }
}

/// Parse `--short-list` output into typed entries.
///
/// Tag classification is deliberately substring-based to match what
/// deployed utilities emit; caller-supplied identifiers are validated
/// against the strict grammar elsewhere.
pub fn parse_list(lines: &[String]) -> RxdResult<Vec<ListEntry>> {
    let mut entries = Vec::new();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (tag, payload) = line
            .split_once(':')
            .ok_or_else(|| RxdError::MalformedOutput(format!("list line has no colon: '{line}'")))?;

        if tag.contains(VOLUME_PREFIX) {
            let size_mb = payload.trim().parse::<u64>().map_err(|_| {
                RxdError::MalformedOutput(format!("volume size is not an integer: '{line}'"))
            })?;
            entries.push(ListEntry::Volume(Volume {
                name: tag.to_string(),
                size_mb,
            }));
        } else if tag.contains(CACHE_PREFIX) {
            let fields: Vec<&str> = payload.split(',').collect();
            if fields.len() != 2 {
                return Err(RxdError::MalformedOutput(format!(
                    "mapping payload must be 'cache,source': '{line}'"
                )));
            }
            entries.push(ListEntry::Mapping(CacheMapping {
                name: tag.to_string(),
                cache: fields[0].trim().to_string(),
                source: fields[1].trim().to_string(),
            }));
        }
        // Unknown tags are skipped for forward compatibility.
    }

    Ok(entries)
}

/// Parse a `--stat-cache` block into named counters.
///
/// Only lines containing a parenthesis carry counters; header and
/// config lines are ignored. Commas and run-whitespace in counter
/// names are normalized away.
pub fn parse_stats(lines: &[String]) -> RxdResult<CacheStats> {
    let mut counters: BTreeMap<String, u64> = BTreeMap::new();

    for line in lines {
        if !line.contains('(') {
            continue;
        }
        for segment in line.split(',') {
            let segment = segment.trim();
            let Some((name, rest)) = segment.split_once('(') else {
                continue;
            };
            let Some(value) = rest.strip_suffix(')') else {
                continue;
            };
            let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
            if name.is_empty() {
                continue;
            }
            // Non-numeric parenthesised fields (config lines) are not counters.
            if let Ok(value) = value.trim().parse::<u64>() {
                counters.insert(name, value);
            }
        }
    }

    for required in REQUIRED_COUNTERS {
        if !counters.contains_key(required) {
            return Err(RxdError::MalformedOutput(format!(
                "statistics block is missing the '{required}' counter"
            )));
        }
    }

    // Presence of the required keys was checked above.
    let take = |map: &mut BTreeMap<String, u64>, key: &str| map.remove(key).unwrap_or_default();
    let reads = take(&mut counters, "reads");
    let writes = take(&mut counters, "writes");
    let cache_hits = take(&mut counters, "cache hits");
    let cache_misses = take(&mut counters, "cache misses");

    Ok(CacheStats {
        reads,
        writes,
        cache_hits,
        cache_misses,
        extra: counters,
    })
}
