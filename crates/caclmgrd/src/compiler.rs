//! Command compiler.
//!
//! Pure translation from normalized tables to the ordered command sequence
//! the executor runs. For a fixed snapshot the output is byte-identical and
//! order-stable: tables compile in read order, services in declared order,
//! rules by descending priority.

use crate::commands::{
    build_acl_rule_cmd, build_delete_chains_cmd, build_flush_cmd, build_loopback_accept_cmd,
    build_policy_cmd, DEFAULT_CHAINS,
};
use crate::normalize::NormalizedTable;
use crate::types::IpVersion;

/// Builds the fixed bootstrap sequence prepended before any ACL command:
///
/// 1. open default chain policies, both families, so a remote management
///    session survives the rebuild window
/// 2. flush all rules and delete non-default chains, both families
/// 3. unconditionally permit loopback traffic, both families, ahead of any
///    ACL-derived rule
pub fn bootstrap_commands() -> Vec<String> {
    let mut cmds = Vec::new();

    for version in [IpVersion::V4, IpVersion::V6] {
        for chain in DEFAULT_CHAINS {
            cmds.push(build_policy_cmd(version, chain, "ACCEPT"));
        }
    }

    for version in [IpVersion::V4, IpVersion::V6] {
        cmds.push(build_flush_cmd(version));
        cmds.push(build_delete_chains_cmd(version));
    }

    for version in [IpVersion::V4, IpVersion::V6] {
        cmds.push(build_loopback_accept_cmd(version));
    }

    cmds
}

/// Compiles one table: for every service, for every priority from highest to
/// lowest, for every protocol/port pair of the service, one append command.
pub fn compile_table(table: &NormalizedTable) -> Vec<String> {
    let mut cmds = Vec::new();

    for service in &table.services {
        for rule in table.rules.values().rev() {
            for proto in service.ip_protocols {
                for port in service.dst_ports {
                    cmds.push(build_acl_rule_cmd(table.ip_version, rule, proto, port));
                }
            }
        }
    }

    cmds
}

/// Compiles the full command sequence for one reconciliation pass:
/// bootstrap first, then every table's commands in table order.
pub fn compile(tables: &[NormalizedTable]) -> Vec<String> {
    let mut cmds = bootstrap_commands();
    for table in tables {
        cmds.extend(compile_table(table));
    }
    cmds
}
