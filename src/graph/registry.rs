use crate::graph::{Info, Node};
use std::collections::HashMap;

/// Canonical node per id, kept in first-observation order.
#[derive(Debug, Default)]
pub struct Registry {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an unseen id verbatim; otherwise merge its info into the
    /// existing node. `kind` and `name` of an existing node never change.
    pub fn observe(&mut self, candidate: Node) {
        match self.index.get(&candidate.id) {
            Some(&pos) => merge_info(&mut self.nodes[pos].info, candidate.info),
            None => {
                self.index.insert(candidate.id.clone(), self.nodes.len());
                self.nodes.push(candidate);
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }
}

/// Additive merge: new keys are added, empty incoming values are dropped,
/// and an existing value is only replaced when it is itself empty.
fn merge_info(existing: &mut Info, incoming: Info) {
    for (key, value) in incoming {
        if value.is_empty() {
            continue;
        }
        match existing.get(&key) {
            Some(current) if !current.is_empty() => {}
            _ => {
                existing.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EntityKind, InfoValue};
    use pretty_assertions::assert_eq;

    #[test]
    fn observing_twice_keeps_one_node() {
        let mut reg = Registry::new();
        reg.observe(Node::new("z1", EntityKind::Zone));
        reg.observe(Node::new("z1", EntityKind::Zone));
        assert_eq!(reg.len(), 1);
        assert!(reg.contains("z1"));
        assert!(!reg.contains("z2"));
    }

    #[test]
    fn info_merge_is_additive() {
        let host = |key: &str, n: u64| {
            Node::new("x", EntityKind::Host).with_info(key, serde_json::Number::from(n))
        };
        let mut reg = Registry::new();
        reg.observe(host("a", 1));
        reg.observe(host("b", 2));
        reg.observe(host("a", 9));

        let nodes = reg.into_nodes();
        assert_eq!(nodes.len(), 1);
        let keys: Vec<&str> = nodes[0].info.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(nodes[0].info["a"], InfoValue::Number(1.into()));
    }

    #[test]
    fn empty_values_never_clobber_and_can_be_filled() {
        let mut existing = Info::new();
        existing.insert("zone".into(), InfoValue::from("z1"));
        existing.insert("bridge".into(), InfoValue::from(""));

        let mut incoming = Info::new();
        incoming.insert("zone".into(), InfoValue::from(""));
        incoming.insert("bridge".into(), InfoValue::from("vmbr0"));
        merge_info(&mut existing, incoming);

        assert_eq!(existing["zone"], InfoValue::from("z1"));
        assert_eq!(existing["bridge"], InfoValue::from("vmbr0"));
    }

    #[test]
    fn first_observed_kind_and_order_win() {
        let mut reg = Registry::new();
        reg.observe(Node::new("shared", EntityKind::Net));
        reg.observe(Node::new("other", EntityKind::Zone));
        reg.observe(Node::new("shared", EntityKind::Vm).with_info("status", "running"));

        let nodes = reg.into_nodes();
        assert_eq!(nodes[0].kind, EntityKind::Net);
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["shared", "other"]);
        assert_eq!(nodes[0].info["status"], InfoValue::from("running"));
    }
}
