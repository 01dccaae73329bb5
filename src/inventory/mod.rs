//! Inventory layer: raw record shapes returned by the cluster API plus the
//! `Inventory` trait the assembler pulls them through.
//!
//! Record shapes are deliberately loose: every field is optional or
//! defaulted so that a sparse record deserializes and the assembler decides
//! whether it is usable.

pub mod config;

use crate::Result;

use serde::Deserialize;
use serde::de::Deserializer;
use serde_json::Number;
use std::collections::BTreeMap;

/// `/cluster/sdn/zones` entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZoneRecord {
    #[serde(default)]
    pub zone: String,

    #[serde(default)]
    pub id: String,
}

impl ZoneRecord {
    pub fn name(&self) -> Option<&str> {
        first_non_empty(&[&self.zone, &self.id])
    }
}

/// `/cluster/sdn/vnets` entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkRecord {
    #[serde(default)]
    pub vnet: String,

    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub zone: String,

    #[serde(default)]
    pub bridge: String,
}

impl NetworkRecord {
    pub fn name(&self) -> Option<&str> {
        first_non_empty(&[&self.vnet, &self.id])
    }
}

/// `/nodes` entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostRecord {
    #[serde(default)]
    pub node: String,

    pub status: Option<String>,
    pub cpu: Option<Number>,
    pub maxcpu: Option<Number>,
    pub mem: Option<Number>,
    pub maxmem: Option<Number>,
    pub uptime: Option<Number>,
}

/// `/nodes/{node}/status` payload (only the fields we keep).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostStatus {
    pub memory: Option<MemoryUsage>,
    pub cpu: Option<Number>,
    pub cpuinfo: Option<CpuInfo>,
    pub uptime: Option<Number>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemoryUsage {
    pub used: Option<Number>,
    pub total: Option<Number>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CpuInfo {
    pub model: Option<String>,
    pub cpus: Option<Number>,
    pub sockets: Option<Number>,
    pub cores: Option<Number>,
}

/// `/nodes/{node}/network` entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterfaceRecord {
    #[serde(default)]
    pub iface: String,

    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Guest flavour; decides which config endpoint to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuestKind {
    #[default]
    Qemu,
    Lxc,
}

impl GuestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GuestKind::Qemu => "qemu",
            GuestKind::Lxc => "lxc",
        }
    }
}

/// `/cluster/resources?type=vm` entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VmRecord {
    #[serde(default, deserialize_with = "deserialize_vmid")]
    pub vmid: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub node: String,

    #[serde(rename = "type", default)]
    pub kind: GuestKind,

    pub status: Option<String>,
    pub mem: Option<Number>,
    pub maxmem: Option<Number>,
    pub disk: Option<Number>,
    pub maxdisk: Option<Number>,
    pub cpu: Option<Number>,

    /// `;`-separated tag string.
    pub tags: Option<String>,
}

impl VmRecord {
    /// A guest is only usable when it can be named and its config located.
    pub fn is_addressable(&self) -> bool {
        [&self.name, &self.vmid, &self.node]
            .iter()
            .all(|field| !field.trim().is_empty())
    }

    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split([';', ','])
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Guest configuration: raw key/value pairs, sorted by key.
pub type VmConfig = BTreeMap<String, serde_json::Value>;

/// One fallible call per entity category. Each call is independent; a
/// failure in one never prevents the others from being attempted.
pub trait Inventory {
    fn zones(&self) -> Result<Vec<ZoneRecord>>;
    fn networks(&self) -> Result<Vec<NetworkRecord>>;
    fn hosts(&self) -> Result<Vec<HostRecord>>;
    fn host_status(&self, host: &str) -> Result<HostStatus>;
    fn host_interfaces(&self, host: &str) -> Result<Vec<InterfaceRecord>>;
    fn vms(&self) -> Result<Vec<VmRecord>>;
    fn vm_config(&self, vm: &VmRecord) -> Result<VmConfig>;
}

fn first_non_empty<'a>(candidates: &[&'a String]) -> Option<&'a str> {
    candidates
        .iter()
        .copied()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
}

/// VMIDs come back as JSON numbers from some endpoints and strings from others.
fn deserialize_vmid<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    Ok(match v {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.trim().to_string(),
        _ => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn vmid_accepts_numbers_and_strings() {
        let vms: Vec<VmRecord> = serde_json::from_str(
            r#"[
                {"vmid": 100, "name": "vm-a", "node": "pve1", "type": "qemu"},
                {"vmid": "101", "name": "ct-b", "node": "pve1", "type": "lxc"},
                {"name": "broken"}
            ]"#,
        )
        .unwrap();

        assert_eq!(vms[0].vmid, "100");
        assert_eq!(vms[1].vmid, "101");
        assert_eq!(vms[1].kind, GuestKind::Lxc);
        assert!(vms[0].is_addressable());
        assert!(!vms[2].is_addressable());

        let blank_name = VmRecord {
            vmid: "102".into(),
            name: "   ".into(),
            node: "pve1".into(),
            ..VmRecord::default()
        };
        assert!(!blank_name.is_addressable());
    }

    #[test]
    fn zone_and_network_names_fall_back_to_id() {
        let z: ZoneRecord = serde_json::from_str(r#"{"id": "z1"}"#).unwrap();
        assert_eq!(z.name(), Some("z1"));
        let z: ZoneRecord = serde_json::from_str(r#"{"type": "simple"}"#).unwrap();
        assert_eq!(z.name(), None);

        let n: NetworkRecord =
            serde_json::from_str(r#"{"vnet": "vnet1", "zone": "z1", "tag": 10}"#).unwrap();
        assert_eq!(n.name(), Some("vnet1"));
        assert_eq!(n.zone, "z1");
        assert_eq!(n.bridge, "");
    }

    #[test]
    fn tags_split_on_separators() {
        let vm = VmRecord {
            tags: Some("prod; web;;".to_string()),
            ..VmRecord::default()
        };
        assert_eq!(vm.tag_list(), vec!["prod".to_string(), "web".to_string()]);
        assert!(VmRecord::default().tag_list().is_empty());
    }
}
