//! Table and field name constants for caclmgrd

/// CONFIG_DB ACL table container table name
pub const CFG_ACL_TABLE_NAME: &str = "ACL_TABLE";

/// CONFIG_DB ACL rule table name
pub const CFG_ACL_RULE_TABLE_NAME: &str = "ACL_RULE";

/// ACL table `type` value marking a control-plane table
pub const ACL_TABLE_TYPE_CTRLPLANE: &str = "CTRLPLANE";

/// Field names
pub mod fields {
    /// ACL table type field
    pub const TYPE: &str = "type";

    /// ACL table services list field
    pub const SERVICES: &str = "services";

    /// ACL table services list field, CONFIG_DB list encoding
    pub const SERVICES_LIST: &str = "services@";

    /// Rule priority field
    pub const PRIORITY: &str = "PRIORITY";

    /// Rule action field
    pub const PACKET_ACTION: &str = "PACKET_ACTION";

    /// Rule source prefix field
    pub const SRC_IP: &str = "SRC_IP";

    /// Rule TCP flags field, formatted `<hex-mask>/<hex-flags>`
    pub const TCP_FLAGS: &str = "TCP_FLAGS";
}
