//! Packet-filter command builders.
//!
//! Each builder returns one shell-executable line targeting iptables or
//! ip6tables as selected by the table's address family.

use cacl_common::shell::shellquote;

use crate::types::{AclRule, IpVersion};

/// Chains whose default policy gets opened before a rebuild.
pub const DEFAULT_CHAINS: [&str; 3] = ["INPUT", "FORWARD", "OUTPUT"];

/// Build a default chain policy command.
pub fn build_policy_cmd(version: IpVersion, chain: &str, target: &str) -> String {
    format!("{} -P {} {}", version.tool(), chain, target)
}

/// Build a flush-all-rules command.
pub fn build_flush_cmd(version: IpVersion) -> String {
    format!("{} -F", version.tool())
}

/// Build a delete-non-default-chains command.
pub fn build_delete_chains_cmd(version: IpVersion) -> String {
    format!("{} -X", version.tool())
}

/// Build the unconditional loopback accept command.
pub fn build_loopback_accept_cmd(version: IpVersion) -> String {
    format!("{} -A INPUT -i lo -j ACCEPT", version.tool())
}

/// Renders a catalog port token; `a-b` ranges use iptables `a:b` syntax.
fn render_port(port: &str) -> String {
    port.replace('-', ":")
}

/// Build one ACL rule append command for a protocol/port pair.
///
/// Shape: `<tool> -A INPUT -p <proto> [-s <src>] --dport <port>
/// [--tcp-flags <mask-names> <set-names>] -j <ACTION>`. The tcp-flags clause
/// is emitted only for TCP and only when the significant mask is non-zero.
pub fn build_acl_rule_cmd(version: IpVersion, rule: &AclRule, proto: &str, port: &str) -> String {
    let mut cmd = format!("{} -A INPUT -p {}", version.tool(), proto);

    if let Some(src_ip) = &rule.src_ip {
        cmd.push_str(&format!(" -s {}", shellquote(src_ip)));
    }

    cmd.push_str(&format!(" --dport {}", render_port(port)));

    if proto == "tcp" {
        if let Some(tcp_flags) = &rule.tcp_flags {
            if tcp_flags.mask != 0 {
                cmd.push_str(&format!(
                    " --tcp-flags {} {}",
                    tcp_flags.mask_names(),
                    tcp_flags.flag_names()
                ));
            }
        }
    }

    cmd.push_str(&format!(" -j {}", rule.action.as_target()));
    cmd
}
