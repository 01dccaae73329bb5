//! Graph layer: the serialized topology plus the pieces that build it.
//!
//! It owns:
//! - EntityKind (node type tags)
//! - Node / Link / Graph (the persisted JSON contract)
//! - Registry, ExclusionFilter and the Assembler

pub mod assemble;
pub mod filter;
pub mod registry;

pub use assemble::Assembler;
pub use filter::ExclusionFilter;
pub use registry::Registry;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Node type tag. Serialized lower-case, e.g. `"bridge"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Zone,
    Net,
    Bridge,
    Nic,
    Host,
    Vm,
    Disk,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Zone,
        EntityKind::Net,
        EntityKind::Bridge,
        EntityKind::Nic,
        EntityKind::Host,
        EntityKind::Vm,
        EntityKind::Disk,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Zone => "zone",
            EntityKind::Net => "net",
            EntityKind::Bridge => "bridge",
            EntityKind::Nic => "nic",
            EntityKind::Host => "host",
            EntityKind::Vm => "vm",
            EntityKind::Disk => "disk",
        }
    }
}

/// A single auxiliary value attached to a node.
///
/// Numbers keep the exact JSON form the API returned (`1024` stays an
/// integer). Anything the other variants cannot hold lands in `Other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InfoValue {
    Number(serde_json::Number),
    Text(String),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
    Other(serde_json::Value),
}

impl InfoValue {
    /// Empty values never overwrite anything during a merge.
    pub fn is_empty(&self) -> bool {
        match self {
            InfoValue::Number(_) => false,
            InfoValue::Text(s) => s.is_empty(),
            InfoValue::List(v) => v.is_empty(),
            InfoValue::Map(m) => m.is_empty(),
            InfoValue::Other(v) => v.is_null(),
        }
    }
}

impl From<&str> for InfoValue {
    fn from(s: &str) -> Self {
        InfoValue::Text(s.to_string())
    }
}

impl From<String> for InfoValue {
    fn from(s: String) -> Self {
        InfoValue::Text(s)
    }
}

impl From<serde_json::Number> for InfoValue {
    fn from(n: serde_json::Number) -> Self {
        InfoValue::Number(n)
    }
}

impl From<Vec<String>> for InfoValue {
    fn from(v: Vec<String>) -> Self {
        InfoValue::List(v)
    }
}

impl From<BTreeMap<String, String>> for InfoValue {
    fn from(m: BTreeMap<String, String>) -> Self {
        InfoValue::Map(m)
    }
}

pub type Info = BTreeMap<String, InfoValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: EntityKind,

    pub name: String,

    #[serde(default, skip_serializing_if = "Info::is_empty")]
    pub info: Info,
}

impl Node {
    /// Bare node: id doubles as display name, no info.
    pub fn new(id: impl Into<String>, kind: EntityKind) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind,
            info: Info::new(),
        }
    }

    /// Set `key` unless `value` is empty.
    pub fn with_info(mut self, key: &str, value: impl Into<InfoValue>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.info.insert(key.to_string(), value);
        }
        self
    }

    /// Like `with_info`, for fields the API may omit.
    pub fn with_opt_info<V: Into<InfoValue>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with_info(key, v),
            None => self,
        }
    }
}

/// Directed child -> parent edge (interface -> host, disk -> vm, net -> zone).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
}

impl Link {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,

    #[serde(default)]
    pub links: Vec<Link>,
}

impl Graph {
    #[cfg(test)]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn to_json_pretty(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn node_serializes_type_and_omits_empty_info() {
        let node = Node::new("vmbr0", EntityKind::Bridge);
        let v = serde_json::to_value(&node).unwrap();
        assert_eq!(v, json!({"id": "vmbr0", "type": "bridge", "name": "vmbr0"}));
    }

    #[test]
    fn info_values_serialize_untagged() {
        let mut cpuinfo = BTreeMap::new();
        cpuinfo.insert("cores".to_string(), "8".to_string());
        let node = Node::new("pve1", EntityKind::Host)
            .with_info("mem", serde_json::Number::from(1024))
            .with_info("status", "online")
            .with_info("tags", vec!["prod".to_string()])
            .with_info("cpuinfo", cpuinfo)
            .with_info("empty", "");

        let v = serde_json::to_value(&node).unwrap();
        assert_eq!(
            v["info"],
            json!({
                "cpuinfo": {"cores": "8"},
                "mem": 1024,
                "status": "online",
                "tags": ["prod"],
            })
        );
    }

    #[test]
    fn graph_json_roundtrips_through_the_viewer_schema() {
        let text = r#"{
            "nodes": [
                {"id": "z1", "type": "zone", "name": "z1"},
                {"id": "vnet1", "type": "net", "name": "vnet1", "info": {"zone": "z1"}}
            ],
            "links": [{"source": "vnet1", "target": "z1"}]
        }"#;
        let g: Graph = serde_json::from_str(text).unwrap();
        assert_eq!(g.nodes.len(), 2);
        assert_eq!(g.node("vnet1").unwrap().info["zone"], InfoValue::from("z1"));
        assert_eq!(g.links, vec![Link::new("vnet1", "z1")]);
    }

    #[test]
    fn stored_info_values_survive_a_reload_unchanged() {
        let stored = json!({
            "nodes": [{
                "id": "pve1",
                "type": "host",
                "name": "pve1",
                "info": {
                    "cpu": 0.25,
                    "ha": true,
                    "maxmem": 17179869184u64,
                    "mem": 1024,
                    "net": {"mtu": 1500},
                    "ports": [1, 2]
                }
            }],
            "links": []
        });
        let g: Graph = serde_json::from_value(stored.clone()).unwrap();
        assert_eq!(g.nodes[0].info["mem"], InfoValue::Number(1024.into()));
        assert_eq!(serde_json::to_value(&g).unwrap(), stored);
    }
}
