//! Shared traits used across frontdesk crates.

pub mod storage;

pub use storage::{CleanupStep, ICleanupStorage};
