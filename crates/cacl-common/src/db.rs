//! Redis-backed config store access.
//!
//! SONiC-style devices keep their declarative configuration in CONFIG_DB, a
//! Redis database of hashes keyed `TABLE|key`. This module provides:
//!
//! - [`ConfigDb`]: a [`ConfigSource`] implementation reading full tables
//! - [`spawn_change_listener`]: a background task that turns Redis keyspace
//!   notifications for subscribed tables into [`ChangeEvent`]s on a channel

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use async_trait::async_trait;

use crate::error::{CaclError, CaclResult};
use crate::source::{ChangeEvent, ConfigSource, TableEntry};

/// Configuration for a Redis connection.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis server hostname or IP
    pub host: String,
    /// Redis server port
    pub port: u16,
    /// Database index
    pub db: u8,
}

/// CONFIG_DB database index on SONiC devices.
pub const CONFIG_DB_INDEX: u8 = 4;

impl RedisConfig {
    /// Creates a new Redis configuration.
    pub fn new(host: impl Into<String>, port: u16, db: u8) -> Self {
        Self {
            host: host.into(),
            port,
            db,
        }
    }

    /// Creates a CONFIG_DB connection config.
    pub fn config_db(host: impl Into<String>, port: u16) -> Self {
        Self::new(host, port, CONFIG_DB_INDEX)
    }

    /// Returns the Redis connection URI.
    pub fn uri(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

/// Redis-backed snapshot provider for CONFIG_DB tables.
pub struct ConfigDb {
    config: RedisConfig,
    connection: ConnectionManager,
}

impl ConfigDb {
    /// Connects to the config store.
    pub async fn connect(config: RedisConfig) -> CaclResult<Self> {
        let uri = config.uri();

        let client = redis::Client::open(uri.clone())
            .map_err(|e| CaclError::database("open", format!("{}: {}", uri, e)))?;

        let connection = client
            .get_connection_manager()
            .await
            .map_err(|e| CaclError::database("connect", e.to_string()))?;

        info!("Connected to config store: {} (db={})", config.host, config.db);

        Ok(Self { config, connection })
    }

    /// Returns the connection configuration.
    pub fn config(&self) -> &RedisConfig {
        &self.config
    }
}

#[async_trait]
impl ConfigSource for ConfigDb {
    /// Reads all entries of a table via `KEYS table|*` + `HGETALL`.
    ///
    /// The returned keys have the table-name prefix stripped but keep any
    /// further separators, so ACL_RULE entries come back as `table|rule`.
    async fn read_table(&self, table: &str) -> CaclResult<Vec<TableEntry>> {
        debug!("Reading table: {}", table);

        let mut connection = self.connection.clone();
        let pattern = format!("{}|*", table);

        let keys: Vec<String> = connection
            .keys(&pattern)
            .await
            .map_err(|e| CaclError::database("keys", e.to_string()))?;

        let mut entries = Vec::with_capacity(keys.len());
        let prefix = format!("{}|", table);

        for key in keys {
            let fvs: Vec<(String, String)> = connection
                .hgetall(&key)
                .await
                .map_err(|e| CaclError::database("hgetall", e.to_string()))?;

            let Some(entry_key) = key.strip_prefix(&prefix) else {
                continue;
            };
            entries.push(TableEntry::new(entry_key, fvs));
        }

        debug!("Read {} entries from table {}", entries.len(), table);
        Ok(entries)
    }
}

/// Spawns a background task forwarding keyspace notifications for the given
/// tables into `tx` as [`ChangeEvent`]s.
///
/// The task enables keyspace event notification on the server (`CONFIG SET
/// notify-keyspace-events KEA`), psubscribes `__keyspace@<db>__:<table>|*`
/// per table, and runs until the channel or the subscription closes.
pub async fn spawn_change_listener(
    config: RedisConfig,
    tables: Vec<String>,
    tx: mpsc::Sender<ChangeEvent>,
) -> CaclResult<JoinHandle<()>> {
    let client = redis::Client::open(config.uri())
        .map_err(|e| CaclError::database("open", e.to_string()))?;

    let mut connection = client
        .get_connection_manager()
        .await
        .map_err(|e| CaclError::database("connect", e.to_string()))?;

    // Best effort: the server may already have this set, or forbid CONFIG.
    let enabled: Result<(), redis::RedisError> = redis::cmd("CONFIG")
        .arg("SET")
        .arg("notify-keyspace-events")
        .arg("KEA")
        .query_async(&mut connection)
        .await;
    if let Err(e) = enabled {
        warn!("Could not enable keyspace notifications: {}", e);
    }

    let mut pubsub = client
        .get_async_pubsub()
        .await
        .map_err(|e| CaclError::database("pubsub", e.to_string()))?;

    let channel_prefix = format!("__keyspace@{}__:", config.db);
    for table in &tables {
        let pattern = format!("{}{}|*", channel_prefix, table);
        pubsub
            .psubscribe(&pattern)
            .await
            .map_err(|e| CaclError::database("psubscribe", e.to_string()))?;
        info!("Subscribed to changes: {}", pattern);
    }

    let handle = tokio::spawn(async move {
        let mut stream = pubsub.on_message();
        while let Some(msg) = stream.next().await {
            let channel = msg.get_channel_name().to_string();
            let Some(db_key) = channel.strip_prefix(&channel_prefix) else {
                continue;
            };
            let (table, key) = match db_key.split_once('|') {
                Some((t, k)) => (t.to_string(), k.to_string()),
                None => (db_key.to_string(), String::new()),
            };

            debug!(table = %table, key = %key, "Config change notification");
            if tx
                .send(ChangeEvent { table, key })
                .await
                .is_err()
            {
                warn!("Change event channel closed, stopping listener");
                break;
            }
        }
    });

    Ok(handle)
}
