#![forbid(unsafe_code)]

mod query;

pub use query::VlanPeers;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Span covering a whole source line (1-based line, 1-based columns).
    #[must_use]
    pub fn at_line(line: usize, line_len: usize) -> Self {
        let start = Position { line, col: 1 };
        let end = Position {
            line,
            col: line_len.max(1),
        };
        Self::new(start, end)
    }
}

/// Parser context that a line depends on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ContextKind {
    Gateway,
    Vsid,
    InterfaceClass,
}

impl ContextKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gateway => "gateway header (`Name:`)",
            Self::Vsid => "VSID header (`vsid <n>:`)",
            Self::InterfaceClass => "interface counter line",
        }
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum VsxErrorCode {
    #[default]
    MalformedTableRow,
    DuplicateVsid,
    MissingContext,
    MalformedRecord,
    UnterminatedTable,
}

impl VsxErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MalformedTableRow => "vsx/error/malformed-table-row",
            Self::DuplicateVsid => "vsx/error/duplicate-vsid",
            Self::MissingContext => "vsx/error/missing-context",
            Self::MalformedRecord => "vsx/error/malformed-record",
            Self::UnterminatedTable => "vsx/error/unterminated-table",
        }
    }
}

/// Fatal parse failure. Every variant carries the span of the offending line.
#[derive(Debug, Clone, Serialize, Deserialize, Error, PartialEq, Eq)]
pub enum VsxError {
    #[error("line {}: malformed table row ({reason}): `{content}`", .span.start.line)]
    MalformedTableRow {
        reason: String,
        content: String,
        span: Span,
    },
    #[error(
        "line {}: duplicate VSID {vsid} in gateway {gateway} while reading the virtual devices table",
        .span.start.line
    )]
    DuplicateVsid {
        gateway: String,
        vsid: u32,
        span: Span,
    },
    #[error("line {}: no {missing} seen before `{content}`", .span.start.line)]
    MissingContext {
        missing: ContextKind,
        content: String,
        span: Span,
    },
    #[error("line {}: malformed record ({reason}): `{content}`", .span.start.line)]
    MalformedRecord {
        reason: String,
        content: String,
        span: Span,
    },
    #[error(
        "line {}: virtual devices table for gateway {gateway} is never terminated by a `Type:` line",
        .span.start.line
    )]
    UnterminatedTable { gateway: String, span: Span },
}

impl VsxError {
    #[must_use]
    pub fn code(&self) -> VsxErrorCode {
        match self {
            Self::MalformedTableRow { .. } => VsxErrorCode::MalformedTableRow,
            Self::DuplicateVsid { .. } => VsxErrorCode::DuplicateVsid,
            Self::MissingContext { .. } => VsxErrorCode::MissingContext,
            Self::MalformedRecord { .. } => VsxErrorCode::MalformedRecord,
            Self::UnterminatedTable { .. } => VsxErrorCode::UnterminatedTable,
        }
    }

    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::MalformedTableRow { span, .. }
            | Self::DuplicateVsid { span, .. }
            | Self::MissingContext { span, .. }
            | Self::MalformedRecord { span, .. }
            | Self::UnterminatedTable { span, .. } => *span,
        }
    }

    /// 1-based line number of the offending input line.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.span().start.line
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum VsxWarningCode {
    #[default]
    UnterminatedTable,
}

impl VsxWarningCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnterminatedTable => "vsx/warn/unterminated-table",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct VsxWarning {
    pub code: VsxWarningCode,
    pub message: String,
    pub span: Span,
}

/// A virtual system identified across all gateways, written `<gateway>+<vsid>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FullVsid {
    pub gateway: String,
    pub vsid: u32,
}

impl FullVsid {
    #[must_use]
    pub fn new(gateway: impl Into<String>, vsid: u32) -> Self {
        Self {
            gateway: gateway.into(),
            vsid,
        }
    }
}

impl fmt::Display for FullVsid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.gateway, self.vsid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid full VSID `{0}`, expected `<gateway>+<vsid>`")]
pub struct ParseFullVsidError(pub String);

impl FromStr for FullVsid {
    type Err = ParseFullVsidError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseFullVsidError(raw.to_string());
        let (gateway, vsid) = raw.rsplit_once('+').ok_or_else(invalid)?;
        if gateway.is_empty() {
            return Err(invalid());
        }
        let vsid = vsid.parse::<u32>().map_err(|_| invalid())?;
        Ok(Self::new(gateway, vsid))
    }
}

/// Key used by the physical interface index: `<gateway>-<interface>`.
#[must_use]
pub fn physical_interface_key(gateway: &str, interface: &str) -> String {
    format!("{gateway}-{interface}")
}

/// Virtual-system flavour derived from the single-letter type code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum VsKind {
    VirtualSystem,
    BridgeMode,
    VirtualRouter,
    VirtualSwitch,
    /// No type code; the gateway's own context.
    Root,
    Unknown,
}

impl VsKind {
    #[must_use]
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            None => Self::Root,
            Some("S") => Self::VirtualSystem,
            Some("B") => Self::BridgeMode,
            Some("R") => Self::VirtualRouter,
            Some("W") => Self::VirtualSwitch,
            Some(_) => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VirtualSystem => "Virtual System",
            Self::BridgeMode => "Virtual System in Bridge mode",
            Self::VirtualRouter => "Virtual Router",
            Self::VirtualSwitch => "Virtual Switch",
            Self::Root => "Root VSID",
            Self::Unknown => "Unknown type",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum InterfaceClass {
    Physical,
    Virtual,
}

impl InterfaceClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Physical => "physical",
            Self::Virtual => "virtual",
        }
    }
}

/// Second and remaining columns of an interface enumeration line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct InterfaceStatus {
    /// IP address or link state, whichever the device printed second.
    pub status: String,
    /// Remaining tokens joined by single spaces; empty when absent.
    pub details: String,
}

impl InterfaceStatus {
    #[must_use]
    pub fn new(status: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            details: details.into(),
        }
    }

    #[must_use]
    pub fn is_secured(&self) -> bool {
        self.status.contains("(secured)") || self.details.contains("(secured)")
    }
}

pub type InterfaceMap = BTreeMap<String, InterfaceStatus>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct VsRecord {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub vs_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sic_status: Option<String>,
    #[serde(default)]
    pub is_virtual_switch: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_interfaces: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_secure_interfaces: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_cluster_interfaces: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_interfaces: Option<InterfaceMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_interfaces: Option<InterfaceMap>,
}

impl VsRecord {
    #[must_use]
    pub fn kind(&self) -> VsKind {
        VsKind::from_code(self.vs_type.as_deref())
    }

    #[must_use]
    pub fn interfaces(&self, class: InterfaceClass) -> Option<&InterfaceMap> {
        match class {
            InterfaceClass::Physical => self.physical_interfaces.as_ref(),
            InterfaceClass::Virtual => self.virtual_interfaces.as_ref(),
        }
    }

    /// Interface map for `class`, created empty on first use.
    pub fn interfaces_mut(&mut self, class: InterfaceClass) -> &mut InterfaceMap {
        match class {
            InterfaceClass::Physical => self.physical_interfaces.get_or_insert_with(BTreeMap::new),
            InterfaceClass::Virtual => self.virtual_interfaces.get_or_insert_with(BTreeMap::new),
        }
    }
}

pub type GatewayRecords = BTreeMap<u32, VsRecord>;

/// The three structures produced by one parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct VsxInventory {
    /// gateway -> vsid -> record
    pub gateways: BTreeMap<String, GatewayRecords>,
    /// VLAN id -> full VSIDs carrying that tag, in encounter order
    pub vlans: BTreeMap<String, Vec<String>>,
    /// `<gateway>-<interface>` -> full VSIDs using that interface, in encounter order
    pub physical_interfaces: BTreeMap<String, Vec<String>>,
}

impl VsxInventory {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn record(&self, gateway: &str, vsid: u32) -> Option<&VsRecord> {
        self.gateways.get(gateway)?.get(&vsid)
    }

    #[must_use]
    pub fn record_by_full_vsid(&self, full_vsid: &FullVsid) -> Option<&VsRecord> {
        self.record(&full_vsid.gateway, full_vsid.vsid)
    }

    #[must_use]
    pub fn vs_count(&self) -> usize {
        self.gateways.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty() && self.vlans.is_empty() && self.physical_interfaces.is_empty()
    }

    /// Split into `(gateways, vlans, physical_interfaces)`.
    #[must_use]
    pub fn into_parts(
        self,
    ) -> (
        BTreeMap<String, GatewayRecords>,
        BTreeMap<String, Vec<String>>,
        BTreeMap<String, Vec<String>>,
    ) {
        (self.gateways, self.vlans, self.physical_interfaces)
    }
}

/// What to do when input ends inside the virtual devices table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnterminatedTablePolicy {
    #[default]
    Error,
    Warn,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ParseConfig {
    /// Line prefixes that identify interface enumeration lines.
    pub interface_prefixes: Vec<String>,
    /// Virtual interfaces with these prefixes never feed the VLAN index.
    pub vlan_excluded_prefixes: Vec<String>,
    pub unterminated_table: UnterminatedTablePolicy,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            interface_prefixes: ["eth", "bond", "Sync", "wrp"]
                .into_iter()
                .map(String::from)
                .collect(),
            vlan_excluded_prefixes: vec!["wrp".to_string()],
            unterminated_table: UnterminatedTablePolicy::Error,
        }
    }
}

impl ParseConfig {
    #[must_use]
    pub fn is_interface_line(&self, line: &str) -> bool {
        self.interface_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && line.starts_with(prefix.as_str()))
    }

    #[must_use]
    pub fn is_vlan_excluded(&self, interface: &str) -> bool {
        self.vlan_excluded_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && interface.starts_with(prefix.as_str()))
    }
}
