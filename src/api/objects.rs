//! Wire request and response types
//!
//! Shapes here are the compatibility contract with existing clients
//! and must serialize to the exact historical field names. Request
//! bodies are strict schemas: unknown or missing fields are rejected,
//! never defaulted to nulls.

use crate::error::RxdError;
use crate::utility::parser::ListEntry;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Uniform response for every mutating operation and for statistics.
/// `errorCode` 0 means success; the HTTP status is 200 either way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "errorCode")]
    pub error_code: i32,
    pub message: String,
}

impl Envelope {
    /// Successful operation with the utility's message
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            error_code: 0,
            message: message.into(),
        }
    }

    /// Failed operation; the code is authoritative for clients
    pub fn from_error(err: &RxdError) -> Self {
        match err {
            RxdError::MalformedOutput(_) | RxdError::Internal { .. } => {
                error!("Operation failed: {err}");
            }
            _ => {}
        }
        Self {
            error_code: err.wire_code(),
            message: err.to_string(),
        }
    }
}

/// One entry in the volume listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum VolumeEntry {
    Disk {
        #[serde(rename = "rapidDisk")]
        rapid_disk: String,
        size: u64,
    },
    Cache {
        #[serde(rename = "rapidCache")]
        rapid_cache: String,
        cache: String,
        source: String,
    },
}

impl From<ListEntry> for VolumeEntry {
    fn from(entry: ListEntry) -> Self {
        match entry {
            ListEntry::Volume(v) => Self::Disk {
                rapid_disk: v.name,
                size: v.size_mb,
            },
            ListEntry::Mapping(m) => Self::Cache {
                rapid_cache: m.name,
                cache: m.cache,
                source: m.source,
            },
        }
    }
}

/// Response body for `GET /v1/volumes`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumesResponse {
    pub volumes: Vec<VolumeEntry>,
}

/// Body for `POST /v1/volumes`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateVolumeBody {
    pub size: u64,
}

/// Body for `PUT /v1/volumes`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResizeVolumeBody {
    #[serde(rename = "rapidDisk")]
    pub rapid_disk: String,
    pub size: u64,
}

/// Body for `POST /v1/cacheMappings`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMappingBody {
    #[serde(rename = "rapidDisk")]
    pub rapid_disk: String,
    #[serde(rename = "sourceDrive")]
    pub source_drive: String,
}
