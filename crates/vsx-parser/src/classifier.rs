use vsx_core::{InterfaceClass, ParseConfig};

pub(crate) const TABLE_START_MARKER: &str = "Virtual Devices Status";
pub(crate) const TABLE_END_PREFIX: &str = "Type:";
pub(crate) const GATEWAY_PREFIX: &str = "Name:";
pub(crate) const VIRTUAL_SWITCH_MARKER: &str = "VS is working as a Virtual Switch.";
pub(crate) const LICENSE_ALLOWANCE_PREFIX: &str = "Number of Virtual Systems allowed by license";
pub(crate) const ACTIVE_CONFIGURED_PREFIX: &str = "Virtual Systems [active / configured]:";
pub(crate) const VSID_PREFIX: &str = "vsid ";

const NOISE_PREFIXES: [&str; 3] = ["-", "=", "ID"];

const COUNTER_PREFIXES: [(&str, CounterKind); 3] = [
    ("Required interfaces", CounterKind::RequiredInterfaces),
    (
        "Required secured interfaces",
        CounterKind::RequiredSecuredInterfaces,
    ),
    (
        "Virtual cluster interfaces",
        CounterKind::VirtualClusterInterfaces,
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Mode {
    #[default]
    Normal,
    /// Reading the `Virtual Devices Status` listing.
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CounterKind {
    RequiredInterfaces,
    RequiredSecuredInterfaces,
    VirtualClusterInterfaces,
}

impl CounterKind {
    /// Interface class of the enumeration lines that follow this counter.
    pub(crate) const fn interface_class(self) -> InterfaceClass {
        match self {
            Self::RequiredInterfaces | Self::RequiredSecuredInterfaces => InterfaceClass::Physical,
            Self::VirtualClusterInterfaces => InterfaceClass::Virtual,
        }
    }

    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::RequiredInterfaces => "required interfaces",
            Self::RequiredSecuredInterfaces => "required secured interfaces",
            Self::VirtualClusterInterfaces => "virtual cluster interfaces",
        }
    }
}

/// Category of one trimmed input line. Borrowed payloads are the text after
/// the recognized prefix (or the whole line for rows and interfaces).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineKind<'a> {
    Noise,
    TableStart,
    TableEnd,
    TableRow(&'a str),
    GatewayHeader(&'a str),
    VirtualSwitchMarker,
    LicenseAllowance(&'a str),
    ActiveConfigured(&'a str),
    VsidHeader(&'a str),
    Counter(CounterKind, &'a str),
    InterfaceEntry(&'a str),
    Unrecognized,
}

pub(crate) fn is_noise(line: &str) -> bool {
    line.is_empty() || NOISE_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

/// Classify a trimmed line for the given mode. Pure: no parser state is read
/// beyond `mode`.
pub(crate) fn classify<'a>(line: &'a str, mode: Mode, config: &ParseConfig) -> LineKind<'a> {
    if is_noise(line) {
        return LineKind::Noise;
    }

    match mode {
        Mode::Table => {
            if line.starts_with(TABLE_END_PREFIX) {
                LineKind::TableEnd
            } else {
                LineKind::TableRow(line)
            }
        }
        Mode::Normal => classify_normal(line, config),
    }
}

fn classify_normal<'a>(line: &'a str, config: &ParseConfig) -> LineKind<'a> {
    if line == TABLE_START_MARKER {
        return LineKind::TableStart;
    }
    if let Some(rest) = line.strip_prefix(GATEWAY_PREFIX) {
        return LineKind::GatewayHeader(rest);
    }
    if line == VIRTUAL_SWITCH_MARKER {
        return LineKind::VirtualSwitchMarker;
    }
    if let Some(rest) = line.strip_prefix(LICENSE_ALLOWANCE_PREFIX) {
        return LineKind::LicenseAllowance(rest);
    }
    if let Some(rest) = line.strip_prefix(ACTIVE_CONFIGURED_PREFIX) {
        return LineKind::ActiveConfigured(rest);
    }
    if let Some(rest) = line.strip_prefix(VSID_PREFIX) {
        return LineKind::VsidHeader(rest);
    }
    for (prefix, kind) in COUNTER_PREFIXES {
        if let Some(rest) = line.strip_prefix(prefix) {
            return LineKind::Counter(kind, rest);
        }
    }
    if config.is_interface_line(line) {
        return LineKind::InterfaceEntry(line);
    }
    LineKind::Unrecognized
}

#[cfg(test)]
mod tests {
    use vsx_core::{InterfaceClass, ParseConfig};

    use super::{CounterKind, LineKind, Mode, classify, is_noise};

    fn normal(line: &str) -> LineKind<'_> {
        classify(line, Mode::Normal, &ParseConfig::default())
    }

    #[test]
    fn noise_lines_are_dropped_in_both_modes() {
        let config = ParseConfig::default();
        for line in ["", "-----+------", "=====", "ID  | Type & Name", "ID         Unique Address"] {
            assert!(is_noise(line), "{line:?} should be noise");
            assert_eq!(classify(line, Mode::Normal, &config), LineKind::Noise);
            assert_eq!(classify(line, Mode::Table, &config), LineKind::Noise);
        }
    }

    #[test]
    fn table_mode_only_knows_rows_and_end_marker() {
        let config = ParseConfig::default();
        assert_eq!(
            classify("Type: S - Virtual System", Mode::Table, &config),
            LineKind::TableEnd
        );
        assert_eq!(
            classify("Name: GW1", Mode::Table, &config),
            LineKind::TableRow("Name: GW1")
        );
        assert_eq!(
            classify("Virtual Devices Status", Mode::Table, &config),
            LineKind::TableRow("Virtual Devices Status")
        );
    }

    #[test]
    fn end_marker_is_ordinary_text_in_normal_mode() {
        assert_eq!(normal("Type: S - Virtual System"), LineKind::Unrecognized);
    }

    #[test]
    fn recognizes_headers_and_markers() {
        assert_eq!(normal("Virtual Devices Status"), LineKind::TableStart);
        assert_eq!(normal("Name:            GW1"), LineKind::GatewayHeader("            GW1"));
        assert_eq!(
            normal("VS is working as a Virtual Switch."),
            LineKind::VirtualSwitchMarker
        );
        assert_eq!(normal("vsid 12:"), LineKind::VsidHeader("12:"));
        assert!(matches!(
            normal("Number of Virtual Systems allowed by license:   25"),
            LineKind::LicenseAllowance(_)
        ));
        assert!(matches!(
            normal("Virtual Systems [active / configured]:   3 / 3"),
            LineKind::ActiveConfigured(_)
        ));
    }

    #[test]
    fn counter_prefixes_do_not_shadow_each_other() {
        assert_eq!(
            normal("Required interfaces: 3"),
            LineKind::Counter(CounterKind::RequiredInterfaces, ": 3")
        );
        assert_eq!(
            normal("Required secured interfaces: 1"),
            LineKind::Counter(CounterKind::RequiredSecuredInterfaces, ": 1")
        );
        assert_eq!(
            normal("Virtual cluster interfaces: 4"),
            LineKind::Counter(CounterKind::VirtualClusterInterfaces, ": 4")
        );
        assert_eq!(
            CounterKind::RequiredSecuredInterfaces.interface_class(),
            InterfaceClass::Physical
        );
        assert_eq!(
            CounterKind::VirtualClusterInterfaces.interface_class(),
            InterfaceClass::Virtual
        );
    }

    #[test]
    fn interface_lines_follow_configured_prefixes() {
        assert_eq!(
            normal("eth1.100   10.0.0.1"),
            LineKind::InterfaceEntry("eth1.100   10.0.0.1")
        );
        assert!(matches!(normal("Sync UP sync(secured)"), LineKind::InterfaceEntry(_)));
        assert_eq!(normal("lo  127.0.0.1"), LineKind::Unrecognized);

        let config = ParseConfig {
            interface_prefixes: vec!["lo".to_string()],
            ..ParseConfig::default()
        };
        assert!(matches!(
            classify("lo  127.0.0.1", Mode::Normal, &config),
            LineKind::InterfaceEntry(_)
        ));
        assert_eq!(
            classify("eth0 10.0.0.1", Mode::Normal, &config),
            LineKind::Unrecognized
        );
    }

    #[test]
    fn vsid_prefix_requires_separator() {
        assert_eq!(normal("vsidmap"), LineKind::Unrecognized);
    }
}
