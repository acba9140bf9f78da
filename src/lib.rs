//! rxdiskd - REST management daemon for RAM-backed block devices
//!
//! Translates structured API requests into invocations of the
//! privileged device-management utility, parses its line-oriented
//! output back into typed records, and serializes concurrent
//! mutations per device.

pub mod api;
pub mod config;
pub mod error;
pub mod manager;
pub mod utility;

pub use error::{RxdError, RxdResult};
