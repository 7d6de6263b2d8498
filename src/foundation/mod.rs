//! Shared scalar types, unit conversions, byte-order helpers and the error taxonomy.

/// Little-endian field readers and writers.
pub mod bytes;
/// Channel layouts, defaults and ms/frame conversions.
pub mod core;
/// Error taxonomy and exit codes.
pub mod error;
