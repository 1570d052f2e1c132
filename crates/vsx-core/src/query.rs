//! Read-only views over a parsed inventory, shaped for report generation.

use std::cmp::Ordering;

use crate::{FullVsid, VsKind, VsRecord, VsxInventory};

const UNNAMED: &str = "unnamed";
const ROOT_NAME: &str = "Root";

/// Connectivity of one VS through one VLAN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VlanPeers<'a> {
    /// The VS is the only member; the VLAN leaves the gateway.
    Direct,
    /// Other members of the VLAN, in membership order.
    Shared(Vec<&'a str>),
}

impl VsRecord {
    /// Name without the `<gateway>_VS_` / `<gateway>_VSW_` prefix.
    #[must_use]
    pub fn display_name<'a>(&'a self, gateway: &str) -> &'a str {
        let Some(name) = self.name.as_deref() else {
            return UNNAMED;
        };
        name.strip_prefix(&format!("{gateway}_VS_"))
            .or_else(|| name.strip_prefix(&format!("{gateway}_VSW_")))
            .unwrap_or(name)
    }

    /// Human description of the type code; unknown codes are kept verbatim.
    #[must_use]
    pub fn type_description(&self) -> String {
        match (self.kind(), self.vs_type.as_deref()) {
            (VsKind::Unknown, Some(code)) => format!("Unknown type `{code}`"),
            (kind, _) => kind.as_str().to_string(),
        }
    }

    /// Physical interfaces reported as `(secured)`.
    #[must_use]
    pub fn secured_interface_count(&self) -> usize {
        self.physical_interfaces
            .as_ref()
            .map(|interfaces| interfaces.values().filter(|entry| entry.is_secured()).count())
            .unwrap_or(0)
    }

    #[must_use]
    pub fn has_insufficient_secured_interfaces(&self) -> bool {
        if self.physical_interfaces.is_none() {
            return false;
        }
        let required = self.required_secure_interfaces.unwrap_or(0) as usize;
        self.secured_interface_count() != required
    }
}

impl VsxInventory {
    #[must_use]
    pub fn sorted_gateways(&self) -> Vec<&str> {
        self.gateways.keys().map(String::as_str).collect()
    }

    /// Records of one gateway ordered by lowercased name.
    #[must_use]
    pub fn vs_listing(&self, gateway: &str) -> Vec<(u32, &VsRecord)> {
        let Some(records) = self.gateways.get(gateway) else {
            return Vec::new();
        };
        let mut listing: Vec<(u32, &VsRecord)> =
            records.iter().map(|(vsid, record)| (*vsid, record)).collect();
        listing.sort_by_cached_key(|(vsid, record)| {
            (
                record.name.as_deref().unwrap_or(UNNAMED).to_lowercase(),
                *vsid,
            )
        });
        listing
    }

    /// Human name for a full VSID. VSID 0 is always `Root`.
    #[must_use]
    pub fn vs_name(&self, full_vsid: &FullVsid) -> Option<&str> {
        if full_vsid.vsid == 0 {
            return Some(ROOT_NAME);
        }
        let record = self.record_by_full_vsid(full_vsid)?;
        Some(record.name.as_deref().unwrap_or(ROOT_NAME))
    }

    /// First VS (gateway order, then VSID order) whose name ends with `suffix`.
    #[must_use]
    pub fn find_by_name_suffix(&self, suffix: &str) -> Option<(FullVsid, &VsRecord)> {
        self.gateways.iter().find_map(|(gateway, records)| {
            records.iter().find_map(|(vsid, record)| {
                record
                    .name
                    .as_deref()
                    .filter(|name| name.ends_with(suffix))
                    .map(|_| (FullVsid::new(gateway.clone(), *vsid), record))
            })
        })
    }

    /// VLAN ids in numeric order; non-numeric ids sort last.
    #[must_use]
    pub fn sorted_vlan_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.vlans.keys().map(String::as_str).collect();
        ids.sort_by(|left, right| compare_vlan_ids(left, right));
        ids
    }

    /// VLANs the VS is a member of, in numeric order.
    #[must_use]
    pub fn vlans_for(&self, full_vsid: &FullVsid) -> Vec<&str> {
        let wanted = full_vsid.to_string();
        self.sorted_vlan_ids()
            .into_iter()
            .filter(|vlan| {
                self.vlans
                    .get(*vlan)
                    .is_some_and(|members| members.iter().any(|member| *member == wanted))
            })
            .collect()
    }

    #[must_use]
    pub fn vlan_peers(&self, vlan: &str, full_vsid: &FullVsid) -> Option<VlanPeers<'_>> {
        let members = self.vlans.get(vlan)?;
        if members.len() <= 1 {
            return Some(VlanPeers::Direct);
        }
        let own = full_vsid.to_string();
        Some(VlanPeers::Shared(
            members
                .iter()
                .map(String::as_str)
                .filter(|member| *member != own)
                .collect(),
        ))
    }

    /// `(interface, members)` for one gateway, sorted by interface name.
    #[must_use]
    pub fn gateway_physical_interfaces(&self, gateway: &str) -> Vec<(&str, &[String])> {
        let prefix = format!("{gateway}-");
        self.physical_interfaces
            .iter()
            .filter_map(|(key, members)| {
                let interface = key.strip_prefix(prefix.as_str())?;
                // `gw-a-eth0` belongs to gateway `gw-a`, not `gw`.
                if self.owned_by_longer_gateway(gateway, key) {
                    return None;
                }
                Some((interface, members.as_slice()))
            })
            .collect()
    }

    fn owned_by_longer_gateway(&self, gateway: &str, key: &str) -> bool {
        self.gateways.keys().any(|other| {
            other.len() > gateway.len()
                && other.starts_with(gateway)
                && key.starts_with(&format!("{other}-"))
        })
    }
}

fn compare_vlan_ids(left: &str, right: &str) -> Ordering {
    match (left.parse::<u64>(), right.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b).then_with(|| left.cmp(right)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => left.cmp(right),
    }
}
