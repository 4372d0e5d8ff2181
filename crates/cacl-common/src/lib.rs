//! Common infrastructure for the control-plane ACL manager daemon.
//!
//! This crate provides the shared plumbing the daemon is built on:
//!
//! - [`shell`]: Safe shell command execution with proper quoting
//! - [`fields`]: Field-value collections as read from CONFIG_DB hashes
//! - [`source`]: The [`ConfigSource`] snapshot-provider seam and the
//!   [`ConfigMgr`] trait driven by the watcher loop
//! - [`db`]: Redis-backed CONFIG_DB reader and change-notification listener
//!   (behind the default `redis` feature)
//! - [`error`]: Error types for daemon operations
//!
//! # Architecture
//!
//! The daemon follows the classic cfgmgr pattern:
//!
//! 1. Subscribe to CONFIG_DB tables for configuration changes
//! 2. On each change, read a fresh snapshot of the subscribed tables
//! 3. Derive the desired host state and execute shell commands to apply it
//!
//! The core translation logic never talks to Redis directly; it sees only the
//! [`ConfigSource`] trait, so it can be tested with an in-memory fake.

pub mod error;
pub mod fields;
pub mod shell;
pub mod source;

#[cfg(feature = "redis")]
pub mod db;

// Re-export commonly used items at crate root
pub use error::{CaclError, CaclResult};
pub use fields::{FieldValue, FieldValues, FieldValuesExt};
pub use source::{ChangeEvent, ConfigMgr, ConfigSource, TableEntry};
