//! Storage trait module.
//!
//! These traits define the contract between maintenance logic and the
//! underlying storage backend. The SQLite implementation lives in
//! `frontdesk-storage`. All traits are object-safe, `Send + Sync`, and have
//! blanket `Arc<T>` impls.

pub mod cleanup;
pub mod test_helpers;

pub use cleanup::{CleanupStep, ICleanupStorage};
