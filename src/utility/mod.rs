//! Translation layer for the external device-management utility
//!
//! Everything needed to go from a validated operation to a typed
//! result: argument-vector construction, subprocess execution, output
//! parsing, and exit-code translation.

pub mod command;
pub mod invoker;
pub mod parser;
pub mod translate;

pub use command::UtilityOp;
pub use invoker::{Invocation, Invoke, RapidDiskInvoker};
pub use parser::{CacheMapping, CacheStats, ListEntry, Volume};
