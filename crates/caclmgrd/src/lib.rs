//! caclmgrd - Control-Plane ACL Manager
//!
//! Derives host firewall rules (iptables/ip6tables) from CONFIG_DB
//! control-plane ACL tables and keeps the live filter state synchronized
//! with the declarative configuration.
//!
//! Pipeline per reconciliation pass:
//!
//! 1. [`normalize`]: raw ACL_TABLE/ACL_RULE records → validated tables
//! 2. [`compiler`]: validated tables → ordered packet-filter command list
//! 3. [`cacl_mgr`]: bootstrap + compiled commands applied best effort
//!
//! The [`watcher`] loop triggers a pass at startup and on every config
//! change notification.

pub mod cacl_mgr;
pub mod catalog;
pub mod commands;
pub mod compiler;
pub mod normalize;
pub mod tables;
pub mod types;
pub mod watcher;

pub use cacl_mgr::{CaclMgr, CommandExecutor, ShellExecutor};
pub use normalize::NormalizedTable;
pub use types::{AclRule, AclTable, IpVersion, PacketAction, ServiceDef, TcpFlags};
