//! Rule model normalizer.
//!
//! Converts raw ACL_TABLE and ACL_RULE records into validated in-memory
//! tables ready for compilation. All failures here are local: a malformed
//! rule, a missing field, or an unknown service only removes that rule or
//! table from the pass, never the pass itself.

use std::collections::BTreeMap;
use std::str::FromStr;

use tracing::warn;

use cacl_common::{FieldValuesExt, TableEntry};

use crate::catalog;
use crate::tables::{fields, ACL_TABLE_TYPE_CTRLPLANE};
use crate::types::{AclRule, AclTable, IpVersion, PacketAction, ServiceDef, TcpFlags};

/// One control-plane table ready for compilation.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    /// Table name.
    pub name: String,
    /// Address family inferred from the table's rules.
    pub ip_version: IpVersion,
    /// Catalog-resolved services, in declared order.
    pub services: Vec<&'static ServiceDef>,
    /// Valid rules keyed by priority. Rules sharing a priority collapse to
    /// one, last one read wins.
    pub rules: BTreeMap<i32, AclRule>,
}

/// Normalizes a raw snapshot into compilable tables, preserving the read
/// order of the ACL_TABLE entries.
pub fn normalize(table_entries: &[TableEntry], rule_entries: &[TableEntry]) -> Vec<NormalizedTable> {
    parse_tables(table_entries)
        .into_iter()
        .filter_map(|table| normalize_table(&table, rule_entries))
        .collect()
}

/// Parses ACL_TABLE records, keeping only control-plane tables.
fn parse_tables(entries: &[TableEntry]) -> Vec<AclTable> {
    let mut tables = Vec::new();

    for entry in entries {
        if entry.fvs.get_field(fields::TYPE) != Some(ACL_TABLE_TYPE_CTRLPLANE) {
            continue;
        }

        let services_raw = entry
            .fvs
            .get_field(fields::SERVICES_LIST)
            .or_else(|| entry.fvs.get_field(fields::SERVICES))
            .unwrap_or("");

        let services: Vec<String> = services_raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        tables.push(AclTable {
            name: entry.key.clone(),
            services,
        });
    }

    tables
}

/// Normalizes one control-plane table, or drops it for this pass.
fn normalize_table(table: &AclTable, rule_entries: &[TableEntry]) -> Option<NormalizedTable> {
    let mut services = Vec::new();
    for name in &table.services {
        match catalog::lookup(name) {
            Some(def) => services.push(def),
            None => {
                warn!(table = %table.name, service = %name, "Unknown service, skipping");
            }
        }
    }

    if services.is_empty() {
        warn!(table = %table.name, "No recognized services, skipping table");
        return None;
    }

    let valid_rules = validate_rules(&table.name, rule_entries);

    // The first valid rule carrying a source address fixes the family for
    // the whole table; a table with no usable source address is skipped
    // rather than guessed at.
    let ip_version = valid_rules
        .iter()
        .find_map(|rule| rule.src_ip.as_deref().and_then(IpVersion::from_src_ip));

    let Some(ip_version) = ip_version else {
        warn!(table = %table.name, "Could not determine IP version, skipping table");
        return None;
    };

    // Priority-keyed insert in read order: equal priorities collapse,
    // last one read wins.
    let mut rules = BTreeMap::new();
    for rule in valid_rules {
        rules.insert(rule.priority, rule);
    }

    Some(NormalizedTable {
        name: table.name.clone(),
        ip_version,
        services,
        rules,
    })
}

/// Validates this table's rule records, preserving read order.
fn validate_rules(table_name: &str, rule_entries: &[TableEntry]) -> Vec<AclRule> {
    let mut rules = Vec::new();

    for entry in rule_entries {
        let Some((rule_table, rule_id)) = entry.key.split_once('|') else {
            warn!(key = %entry.key, "Malformed ACL_RULE key, skipping");
            continue;
        };
        if rule_table != table_name {
            continue;
        }

        if entry.fvs.is_empty() {
            warn!(table = %table_name, rule = %rule_id, "Empty rule record, skipping");
            continue;
        }

        let Some(priority) = entry
            .fvs
            .get_field(fields::PRIORITY)
            .and_then(|p| p.parse::<i32>().ok())
        else {
            warn!(table = %table_name, rule = %rule_id, "Missing or invalid PRIORITY, skipping rule");
            continue;
        };

        let Some(action) = entry
            .fvs
            .get_field(fields::PACKET_ACTION)
            .and_then(|a| PacketAction::from_str(a).ok())
        else {
            warn!(table = %table_name, rule = %rule_id, "Missing or invalid PACKET_ACTION, skipping rule");
            continue;
        };

        let src_ip = entry
            .fvs
            .get_field(fields::SRC_IP)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        if let Some(src) = &src_ip {
            if IpVersion::from_src_ip(src).is_none() {
                warn!(table = %table_name, rule = %rule_id, src_ip = %src, "Unparsable SRC_IP, skipping rule");
                continue;
            }
        }

        let tcp_flags = match entry.fvs.get_field(fields::TCP_FLAGS) {
            Some(raw) => match TcpFlags::from_str(raw) {
                Ok(tf) => Some(tf),
                Err(e) => {
                    warn!(table = %table_name, rule = %rule_id, error = %e, "Invalid TCP_FLAGS, skipping rule");
                    continue;
                }
            },
            None => None,
        };

        rules.push(AclRule {
            priority,
            src_ip,
            action,
            tcp_flags,
        });
    }

    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use cacl_common::field_values;
    use pretty_assertions::assert_eq;

    fn ctrlplane_table(name: &str, services: &str) -> TableEntry {
        TableEntry::new(
            name,
            field_values! { "type" => "CTRLPLANE", "services" => services },
        )
    }

    fn rule(key: &str, priority: &str, action: &str, src_ip: &str) -> TableEntry {
        let mut fvs = field_values! { "PRIORITY" => priority, "PACKET_ACTION" => action };
        if !src_ip.is_empty() {
            fvs.push(("SRC_IP".to_string(), src_ip.to_string()));
        }
        TableEntry::new(key, fvs)
    }

    #[test]
    fn test_normalize_basic_table() {
        let tables = vec![ctrlplane_table("SSH_ONLY", "SSH")];
        let rules = vec![rule("SSH_ONLY|RULE_1", "10", "ACCEPT", "10.0.0.1/32")];

        let normalized = normalize(&tables, &rules);
        assert_eq!(normalized.len(), 1);

        let table = &normalized[0];
        assert_eq!(table.name, "SSH_ONLY");
        assert_eq!(table.ip_version, IpVersion::V4);
        assert_eq!(table.services.len(), 1);
        assert_eq!(table.services[0].name, "SSH");
        assert_eq!(table.rules.len(), 1);
        assert_eq!(table.rules[&10].action, PacketAction::Accept);
    }

    #[test]
    fn test_non_ctrlplane_tables_ignored() {
        let tables = vec![TableEntry::new(
            "DATAACL",
            field_values! { "type" => "L3", "services" => "SSH" },
        )];
        let rules = vec![rule("DATAACL|RULE_1", "10", "ACCEPT", "10.0.0.1/32")];

        assert!(normalize(&tables, &rules).is_empty());
    }

    #[test]
    fn test_unknown_service_skipped_known_kept() {
        let tables = vec![ctrlplane_table("MIXED", "TELNET,SSH")];
        let rules = vec![rule("MIXED|RULE_1", "10", "ACCEPT", "10.0.0.1/32")];

        let normalized = normalize(&tables, &rules);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].services.len(), 1);
        assert_eq!(normalized[0].services[0].name, "SSH");
    }

    #[test]
    fn test_all_services_unknown_drops_table() {
        let tables = vec![ctrlplane_table("BOGUS", "TELNET,RLOGIN")];
        let rules = vec![rule("BOGUS|RULE_1", "10", "ACCEPT", "10.0.0.1/32")];

        assert!(normalize(&tables, &rules).is_empty());
    }

    #[test]
    fn test_indeterminate_ip_version_drops_table() {
        let tables = vec![ctrlplane_table("NO_SRC", "SSH")];
        let rules = vec![rule("NO_SRC|RULE_1", "10", "ACCEPT", "")];

        assert!(normalize(&tables, &rules).is_empty());
    }

    #[test]
    fn test_ipv6_inference() {
        let tables = vec![ctrlplane_table("SSH_V6", "SSH")];
        let rules = vec![rule("SSH_V6|RULE_1", "10", "ACCEPT", "2001:db8::1/128")];

        let normalized = normalize(&tables, &rules);
        assert_eq!(normalized[0].ip_version, IpVersion::V6);
    }

    #[test]
    fn test_first_src_ip_fixes_version() {
        let tables = vec![ctrlplane_table("MIXED_FAM", "SSH")];
        let rules = vec![
            rule("MIXED_FAM|RULE_1", "20", "ACCEPT", "10.0.0.1/32"),
            rule("MIXED_FAM|RULE_2", "10", "ACCEPT", "2001:db8::1/128"),
        ];

        let normalized = normalize(&tables, &rules);
        assert_eq!(normalized[0].ip_version, IpVersion::V4);
        // Both rules remain; only the family inference is first-wins
        assert_eq!(normalized[0].rules.len(), 2);
    }

    #[test]
    fn test_missing_priority_drops_rule() {
        let tables = vec![ctrlplane_table("T", "SSH")];
        let rules = vec![
            TableEntry::new(
                "T|BAD",
                field_values! { "PACKET_ACTION" => "ACCEPT", "SRC_IP" => "10.0.0.1/32" },
            ),
            rule("T|GOOD", "5", "ACCEPT", "10.0.0.2/32"),
        ];

        let normalized = normalize(&tables, &rules);
        assert_eq!(normalized[0].rules.len(), 1);
        assert!(normalized[0].rules.contains_key(&5));
    }

    #[test]
    fn test_missing_action_drops_rule() {
        let tables = vec![ctrlplane_table("T", "SSH")];
        let rules = vec![
            TableEntry::new(
                "T|BAD",
                field_values! { "PRIORITY" => "10", "SRC_IP" => "10.0.0.1/32" },
            ),
            rule("T|GOOD", "5", "DROP", "10.0.0.2/32"),
        ];

        let normalized = normalize(&tables, &rules);
        assert_eq!(normalized[0].rules.len(), 1);
    }

    #[test]
    fn test_empty_rule_record_dropped() {
        let tables = vec![ctrlplane_table("T", "SSH")];
        let rules = vec![
            TableEntry::new("T|EMPTY", vec![]),
            rule("T|GOOD", "5", "ACCEPT", "10.0.0.2/32"),
        ];

        let normalized = normalize(&tables, &rules);
        assert_eq!(normalized[0].rules.len(), 1);
    }

    #[test]
    fn test_equal_priority_last_seen_wins() {
        let tables = vec![ctrlplane_table("T", "SSH")];
        let rules = vec![
            rule("T|FIRST", "10", "ACCEPT", "10.0.0.1/32"),
            rule("T|SECOND", "10", "DROP", "10.0.0.2/32"),
        ];

        let normalized = normalize(&tables, &rules);
        assert_eq!(normalized[0].rules.len(), 1);
        let collapsed = &normalized[0].rules[&10];
        assert_eq!(collapsed.action, PacketAction::Drop);
        assert_eq!(collapsed.src_ip.as_deref(), Some("10.0.0.2/32"));
    }

    #[test]
    fn test_rules_scoped_to_table() {
        let tables = vec![
            ctrlplane_table("A", "SSH"),
            ctrlplane_table("B", "NTP"),
        ];
        let rules = vec![
            rule("A|RULE_1", "10", "ACCEPT", "10.0.0.1/32"),
            rule("B|RULE_1", "20", "ACCEPT", "192.168.0.0/24"),
        ];

        let normalized = normalize(&tables, &rules);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].rules.len(), 1);
        assert!(normalized[0].rules.contains_key(&10));
        assert_eq!(normalized[1].rules.len(), 1);
        assert!(normalized[1].rules.contains_key(&20));
    }

    #[test]
    fn test_invalid_tcp_flags_drops_rule() {
        let tables = vec![ctrlplane_table("T", "SSH")];
        let mut fvs = field_values! {
            "PRIORITY" => "10",
            "PACKET_ACTION" => "ACCEPT",
            "SRC_IP" => "10.0.0.1/32",
        };
        fvs.push(("TCP_FLAGS".to_string(), "garbage".to_string()));
        let rules = vec![
            TableEntry::new("T|BAD", fvs),
            rule("T|GOOD", "5", "ACCEPT", "10.0.0.2/32"),
        ];

        let normalized = normalize(&tables, &rules);
        assert_eq!(normalized[0].rules.len(), 1);
    }
}
