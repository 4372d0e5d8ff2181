//! Config store seams: snapshot provider and manager traits.
//!
//! The translation core never holds a database connection. It reads through
//! [`ConfigSource`], and change notifications arrive as opaque
//! [`ChangeEvent`]s over a channel. Production wires both to Redis (see the
//! [`db`](crate::db) module); tests wire them to in-memory fakes.

use async_trait::async_trait;

use crate::error::CaclResult;
use crate::fields::FieldValues;

/// One record read from a config store table.
#[derive(Debug, Clone)]
pub struct TableEntry {
    /// The record key with the table-name prefix stripped
    /// (e.g. "SSH_ONLY" or "SSH_ONLY|RULE_1").
    pub key: String,
    /// Field-value pairs of the record.
    pub fvs: FieldValues,
}

impl TableEntry {
    /// Creates a new entry.
    pub fn new(key: impl Into<String>, fvs: FieldValues) -> Self {
        Self {
            key: key.into(),
            fvs,
        }
    }
}

/// A change notification for a subscribed table.
///
/// The payload identifies what changed, but consumers treat any event as
/// "re-derive everything" and ignore it beyond logging.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// The table the change belongs to.
    pub table: String,
    /// The changed key within the table.
    pub key: String,
}

/// Read access to the current configuration snapshot.
///
/// Every reconciliation pass reads fresh state through this trait; nothing
/// is cached between passes.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Reads all current entries of the named table.
    async fn read_table(&self, table: &str) -> CaclResult<Vec<TableEntry>>;
}

/// Base trait for configuration manager daemons driven by the watcher loop.
#[async_trait]
pub trait ConfigMgr: Send {
    /// Returns the daemon name (e.g., "caclmgrd") for logging.
    fn daemon_name(&self) -> &str;

    /// Returns the subscribed config store table names.
    fn config_table_names(&self) -> &[&str];

    /// Performs one full read-derive-apply pass.
    async fn reconcile_once(&mut self) -> CaclResult<()>;
}
