//! Static service catalog.
//!
//! Maps a logical service name referenced from ACL_TABLE `services` to its
//! default protocols and destination ports. Entries are fixed at compile
//! time; service names not present here are rejected per table during
//! normalization.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::types::ServiceDef;

static CATALOG: Lazy<HashMap<&'static str, ServiceDef>> = Lazy::new(|| {
    let services = [
        ServiceDef {
            name: "NTP",
            ip_protocols: &["udp"],
            dst_ports: &["123"],
        },
        ServiceDef {
            name: "SNMP",
            ip_protocols: &["tcp", "udp"],
            dst_ports: &["161"],
        },
        ServiceDef {
            name: "SSH",
            ip_protocols: &["tcp"],
            dst_ports: &["22"],
        },
    ];
    services.into_iter().map(|s| (s.name, s)).collect()
});

/// Looks up a service definition by name.
pub fn lookup(name: &str) -> Option<&'static ServiceDef> {
    CATALOG.get(name)
}
