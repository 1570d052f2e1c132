use rustc_hash::FxHashSet;
use tracing::{debug, trace};
use vsx_core::{
    ContextKind, FullVsid, InterfaceClass, InterfaceStatus, ParseConfig, VsRecord, VsxError,
    VsxInventory, VsxWarning, physical_interface_key,
};

use crate::{ParseResult, SourceLine, classifier::CounterKind, table::TableRow};

/// Record builder: owns the inventory under construction and the context
/// pointers (gateway, VSID, interface class) that give lines their meaning.
pub(crate) struct InventoryBuilder {
    inventory: VsxInventory,
    current_gateway: Option<String>,
    current_vsid: Option<u32>,
    interface_class: Option<InterfaceClass>,
    /// `(gateway, vsid)` pairs created by a table row.
    table_rows_seen: FxHashSet<(String, u32)>,
    warnings: Vec<VsxWarning>,
}

impl InventoryBuilder {
    pub(crate) fn new() -> Self {
        Self {
            inventory: VsxInventory::empty(),
            current_gateway: None,
            current_vsid: None,
            interface_class: None,
            table_rows_seen: FxHashSet::default(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn current_gateway(&self) -> Option<&str> {
        self.current_gateway.as_deref()
    }

    pub(crate) fn add_warning(&mut self, warning: VsxWarning) {
        self.warnings.push(warning);
    }

    pub(crate) fn finish(self) -> ParseResult {
        ParseResult {
            inventory: self.inventory,
            warnings: self.warnings,
        }
    }

    /// `Name: <gateway>`
    pub(crate) fn enter_gateway(
        &mut self,
        rest: &str,
        line: &SourceLine<'_>,
    ) -> Result<(), VsxError> {
        let gateway = rest
            .split_whitespace()
            .last()
            .ok_or_else(|| line.malformed_record("gateway header has no identifier"))?;

        let unseen = !self.inventory.gateways.contains_key(gateway);
        if unseen {
            self.inventory
                .gateways
                .insert(gateway.to_string(), Default::default());
        }
        if unseen || self.current_gateway.as_deref() != Some(gateway) {
            self.current_vsid = None;
        }
        self.current_gateway = Some(gateway.to_string());
        debug!("[Gateway]: {gateway}");
        Ok(())
    }

    /// Seed or enrich the record for one table row under the active gateway.
    pub(crate) fn insert_table_row(
        &mut self,
        row: TableRow,
        line: &SourceLine<'_>,
    ) -> Result<(), VsxError> {
        let gateway = self
            .current_gateway
            .clone()
            .ok_or_else(|| line.missing(ContextKind::Gateway))?;

        let key = (gateway, row.vsid);
        if self.table_rows_seen.contains(&key) {
            return Err(VsxError::DuplicateVsid {
                gateway: key.0,
                vsid: row.vsid,
                span: line.span,
            });
        }

        debug!(
            "[table] {} {} {} {} {} {}",
            row.vsid, row.vs_type, row.name, row.policy, row.installed_time, row.sic_status
        );
        let record = self
            .inventory
            .gateways
            .entry(key.0.clone())
            .or_default()
            .entry(row.vsid)
            .or_default();
        record.vs_type = Some(row.vs_type);
        record.name = Some(row.name);
        record.policy = Some(row.policy);
        record.installed_time = Some(row.installed_time);
        record.sic_status = Some(row.sic_status);

        self.table_rows_seen.insert(key);
        Ok(())
    }

    /// `VS is working as a Virtual Switch.`
    pub(crate) fn mark_virtual_switch(&mut self, line: &SourceLine<'_>) -> Result<(), VsxError> {
        let active = self.active_vsid(line)?;
        self.record_mut(&active, line)?.is_virtual_switch = true;
        debug!("[virtswitch] {active}");
        Ok(())
    }

    /// `vsid <n>:`
    pub(crate) fn enter_vsid(&mut self, rest: &str, line: &SourceLine<'_>) -> Result<(), VsxError> {
        let token = rest
            .split_whitespace()
            .last()
            .ok_or_else(|| line.malformed_record("VSID header has no identifier"))?;
        let digits = match token.chars().last() {
            Some(last) if last.is_ascii_punctuation() => &token[..token.len() - 1],
            _ => token,
        };
        let vsid = digits.parse::<u32>().map_err(|_| {
            line.malformed_record(format!("VSID `{digits}` is not a non-negative integer"))
        })?;

        let gateway = self
            .current_gateway
            .as_deref()
            .ok_or_else(|| line.missing(ContextKind::Gateway))?;
        self.inventory
            .gateways
            .entry(gateway.to_string())
            .or_default()
            .entry(vsid)
            .or_insert_with(VsRecord::default);
        self.current_vsid = Some(vsid);
        debug!("[New vsid]: {}", FullVsid::new(gateway, vsid));
        Ok(())
    }

    /// `Required interfaces`, `Required secured interfaces`, `Virtual cluster interfaces`
    pub(crate) fn set_counter(
        &mut self,
        kind: CounterKind,
        rest: &str,
        line: &SourceLine<'_>,
    ) -> Result<(), VsxError> {
        let active = self.active_vsid(line)?;
        let count = rest
            .split_whitespace()
            .last()
            .and_then(|token| token.parse::<u32>().ok())
            .ok_or_else(|| {
                line.malformed_record(format!("{} count is not a non-negative integer", kind.as_str()))
            })?;

        let record = self.record_mut(&active, line)?;
        match kind {
            CounterKind::RequiredInterfaces => record.required_interfaces = Some(count),
            CounterKind::RequiredSecuredInterfaces => {
                record.required_secure_interfaces = Some(count);
            }
            CounterKind::VirtualClusterInterfaces => {
                record.virtual_cluster_interfaces = Some(count);
            }
        }
        self.interface_class = Some(kind.interface_class());
        debug!("[{}] {active}: {count}", kind.as_str());
        Ok(())
    }

    /// `<interface> <ip-or-status> [details...]`
    pub(crate) fn record_interface(
        &mut self,
        text: &str,
        line: &SourceLine<'_>,
        config: &ParseConfig,
    ) -> Result<(), VsxError> {
        let mut tokens = text.split_whitespace();
        let (Some(interface), Some(status)) = (tokens.next(), tokens.next()) else {
            return Err(line.malformed_record("interface line needs a name and a status"));
        };
        let details = tokens.collect::<Vec<_>>().join(" ");

        let active = self.active_vsid(line)?;
        let class = self
            .interface_class
            .ok_or_else(|| line.missing(ContextKind::InterfaceClass))?;
        let full_vsid = active.to_string();

        debug!("[int]: {} {interface} {status} {details}", class.as_str());
        self.record_mut(&active, line)?
            .interfaces_mut(class)
            .insert(interface.to_string(), InterfaceStatus::new(status, details));

        match class {
            InterfaceClass::Physical => {
                self.inventory
                    .physical_interfaces
                    .entry(physical_interface_key(&active.gateway, interface))
                    .or_default()
                    .push(full_vsid);
            }
            InterfaceClass::Virtual => {
                if config.is_vlan_excluded(interface) {
                    trace!("[vlan] {interface} excluded from VLAN index");
                    return Ok(());
                }
                let tag = interface
                    .rsplit_once('.')
                    .map(|(_, vlan)| vlan)
                    .filter(|vlan| !vlan.is_empty());
                if let Some(vlan) = tag {
                    debug!("[vlan]: {vlan} added to vsid: {full_vsid}");
                    self.inventory
                        .vlans
                        .entry(vlan.to_string())
                        .or_default()
                        .push(full_vsid);
                }
            }
        }
        Ok(())
    }

    fn active_vsid(&self, line: &SourceLine<'_>) -> Result<FullVsid, VsxError> {
        let gateway = self
            .current_gateway
            .as_deref()
            .ok_or_else(|| line.missing(ContextKind::Gateway))?;
        let vsid = self
            .current_vsid
            .ok_or_else(|| line.missing(ContextKind::Vsid))?;
        Ok(FullVsid::new(gateway, vsid))
    }

    fn record_mut(
        &mut self,
        active: &FullVsid,
        line: &SourceLine<'_>,
    ) -> Result<&mut VsRecord, VsxError> {
        self.inventory
            .gateways
            .get_mut(&active.gateway)
            .and_then(|records| records.get_mut(&active.vsid))
            .ok_or_else(|| line.missing(ContextKind::Vsid))
    }
}
