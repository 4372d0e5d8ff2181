//! Typed entities for control-plane ACL configuration.

use std::net::IpAddr;
use std::str::FromStr;

use cacl_common::shell::{IP6TABLES_CMD, IPTABLES_CMD};
use cacl_common::CaclError;

/// IP address family of an ACL table, inferred from its rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// Returns the packet-filter tool path for this family.
    pub fn tool(&self) -> &'static str {
        match self {
            IpVersion::V4 => IPTABLES_CMD,
            IpVersion::V6 => IP6TABLES_CMD,
        }
    }

    /// Infers the family from a source prefix literal like "10.0.0.1/32".
    ///
    /// Only the address portion before any prefix length is parsed; an
    /// unparsable address yields `None`.
    pub fn from_src_ip(src_ip: &str) -> Option<Self> {
        let addr = src_ip.split('/').next()?;
        match IpAddr::from_str(addr).ok()? {
            IpAddr::V4(_) => Some(IpVersion::V4),
            IpAddr::V6(_) => Some(IpVersion::V6),
        }
    }
}

/// Action applied to matching packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketAction {
    Accept,
    Drop,
    Reject,
}

impl PacketAction {
    /// Returns the iptables target name.
    pub fn as_target(&self) -> &'static str {
        match self {
            PacketAction::Accept => "ACCEPT",
            PacketAction::Drop => "DROP",
            PacketAction::Reject => "REJECT",
        }
    }
}

impl FromStr for PacketAction {
    type Err = CaclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACCEPT" => Ok(PacketAction::Accept),
            "DROP" => Ok(PacketAction::Drop),
            "REJECT" => Ok(PacketAction::Reject),
            other => Err(CaclError::invalid_config(
                "PACKET_ACTION",
                format!("unknown action '{}'", other),
            )),
        }
    }
}

/// TCP flag names in bit order, low to high. Only the first six bits are
/// supported; ECE and CWR are silently omitted.
const TCP_FLAG_NAMES: [&str; 6] = ["FIN", "SYN", "RST", "PSH", "ACK", "URG"];

/// TCP flags match: which bits are significant and which of those must be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpFlags {
    /// Significant bits.
    pub mask: u8,
    /// Bits that must be set, subset of `mask`.
    pub flags: u8,
}

impl TcpFlags {
    /// Returns the comma-joined names of the set bits in `value`, in bit
    /// order FIN through URG.
    fn names(value: u8) -> String {
        let mut names = Vec::new();
        for (i, name) in TCP_FLAG_NAMES.iter().enumerate() {
            if value & (1 << i) != 0 {
                names.push(*name);
            }
        }
        names.join(",")
    }

    /// Renders the mask name list.
    pub fn mask_names(&self) -> String {
        Self::names(self.mask)
    }

    /// Renders the set-bits name list, restricted to significant bits.
    pub fn flag_names(&self) -> String {
        Self::names(self.flags & self.mask)
    }
}

impl FromStr for TcpFlags {
    type Err = CaclError;

    /// Parses the CONFIG_DB encoding `<hex-mask>/<hex-flags>`, with or
    /// without `0x` prefixes (e.g. "0x12/0x02").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (mask_str, flags_str) = s.split_once('/').ok_or_else(|| {
            CaclError::invalid_config("TCP_FLAGS", format!("expected <mask>/<flags>, got '{}'", s))
        })?;

        let parse = |v: &str| {
            let trimmed = v.trim().trim_start_matches("0x").trim_start_matches("0X");
            u8::from_str_radix(trimmed, 16).map_err(|e| {
                CaclError::invalid_config("TCP_FLAGS", format!("bad hex value '{}': {}", v, e))
            })
        };

        Ok(TcpFlags {
            mask: parse(mask_str)?,
            flags: parse(flags_str)?,
        })
    }
}

/// A named default protocol/port template (e.g. SSH).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDef {
    /// Service name as referenced by ACL tables.
    pub name: &'static str,
    /// IP protocols the service uses, in emission order.
    pub ip_protocols: &'static [&'static str],
    /// Destination ports or `a-b` ranges, in emission order.
    pub dst_ports: &'static [&'static str],
}

/// One validated ACL rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclRule {
    /// Ordering key within the table; higher compiles first.
    pub priority: i32,
    /// Optional source prefix literal.
    pub src_ip: Option<String>,
    /// Action for matching packets.
    pub action: PacketAction,
    /// Optional TCP flags match.
    pub tcp_flags: Option<TcpFlags>,
}

/// One control-plane ACL table as declared in CONFIG_DB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclTable {
    /// Unique table name.
    pub name: String,
    /// Referenced service names, in declared order.
    pub services: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ip_version_from_src_ip() {
        assert_eq!(IpVersion::from_src_ip("10.0.0.1/32"), Some(IpVersion::V4));
        assert_eq!(IpVersion::from_src_ip("10.0.0.1"), Some(IpVersion::V4));
        assert_eq!(IpVersion::from_src_ip("fe80::1/128"), Some(IpVersion::V6));
        assert_eq!(IpVersion::from_src_ip("2001:db8::/64"), Some(IpVersion::V6));
        assert_eq!(IpVersion::from_src_ip("not-an-ip/24"), None);
        assert_eq!(IpVersion::from_src_ip(""), None);
    }

    #[test]
    fn test_ip_version_tool() {
        assert_eq!(IpVersion::V4.tool(), "/sbin/iptables");
        assert_eq!(IpVersion::V6.tool(), "/sbin/ip6tables");
    }

    #[test]
    fn test_packet_action_parse() {
        assert_eq!("ACCEPT".parse::<PacketAction>().unwrap(), PacketAction::Accept);
        assert_eq!("DROP".parse::<PacketAction>().unwrap(), PacketAction::Drop);
        assert_eq!("REJECT".parse::<PacketAction>().unwrap(), PacketAction::Reject);
        assert!("accept".parse::<PacketAction>().is_err());
        assert!("".parse::<PacketAction>().is_err());
    }

    #[test]
    fn test_tcp_flags_parse() {
        let tf: TcpFlags = "0x12/0x02".parse().unwrap();
        assert_eq!(tf.mask, 0x12);
        assert_eq!(tf.flags, 0x02);

        let tf: TcpFlags = "3f/00".parse().unwrap();
        assert_eq!(tf.mask, 0x3f);
        assert_eq!(tf.flags, 0x00);

        assert!("0x12".parse::<TcpFlags>().is_err());
        assert!("zz/02".parse::<TcpFlags>().is_err());
    }

    #[test]
    fn test_tcp_flags_names_bit_order() {
        // SYN+ACK significant, SYN set
        let tf = TcpFlags { mask: 0x12, flags: 0x02 };
        assert_eq!(tf.mask_names(), "SYN,ACK");
        assert_eq!(tf.flag_names(), "SYN");
    }

    #[test]
    fn test_tcp_flags_high_bits_omitted() {
        // ECE (0x40) and CWR (0x80) have no names and must not render
        let tf = TcpFlags { mask: 0xc1, flags: 0xc0 };
        assert_eq!(tf.mask_names(), "FIN");
        assert_eq!(tf.flag_names(), "");
    }

    #[test]
    fn test_tcp_flags_set_restricted_to_mask() {
        // ACK set but not significant: not rendered in the flags list
        let tf = TcpFlags { mask: 0x02, flags: 0x12 };
        assert_eq!(tf.flag_names(), "SYN");
    }
}
