//! Discovery pass: pull every category through the registry and filter.
//!
//! Order is fixed: zones, networks, hosts (status + interfaces), guests
//! (config -> bridges + disks). Later categories point back at ids the
//! earlier ones registered.

use crate::diagnostics::{Quiet, Reporter};
use crate::graph::{EntityKind, ExclusionFilter, Graph, Link, Node, Registry};
use crate::inventory::{HostRecord, HostStatus, Inventory, VmRecord, config};
use crate::Result;

use std::collections::BTreeMap;

/// Raw interface types rendered as bridges; matched case-sensitively.
const BRIDGE_KINDS: [&str; 2] = ["bridge", "OVSBridge"];

static QUIET: Quiet = Quiet;

pub struct Assembler<'a> {
    filter: ExclusionFilter,
    reporter: &'a dyn Reporter,
    registry: Registry,
    links: Vec<Link>,
}

impl<'a> Assembler<'a> {
    pub fn new(filter: ExclusionFilter) -> Self {
        Self {
            filter,
            reporter: &QUIET,
            registry: Registry::new(),
            links: Vec::new(),
        }
    }

    pub fn with_reporter(mut self, reporter: &'a dyn Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Run one full discovery pass. Fetch failures only cost their own
    /// category; the graph is always produced.
    pub fn run<I: Inventory + ?Sized>(mut self, inv: &I) -> Graph {
        self.zones(inv);
        self.networks(inv);
        self.hosts(inv);
        self.guests(inv);

        self.reporter.progress(&format!(
            "assembled {} nodes, {} links",
            self.registry.len(),
            self.links.len()
        ));

        Graph {
            nodes: self.registry.into_nodes(),
            links: self.links,
        }
    }

    fn zones<I: Inventory + ?Sized>(&mut self, inv: &I) {
        if self.filter.excludes(EntityKind::Zone) {
            return;
        }
        let zones = self.fetched("zones", inv.zones());
        for zone in &zones {
            if let Some(name) = zone.name() {
                self.observe(Node::new(name, EntityKind::Zone));
            }
        }
    }

    fn networks<I: Inventory + ?Sized>(&mut self, inv: &I) {
        if self.filter.excludes(EntityKind::Net) {
            return;
        }
        let networks = self.fetched("networks", inv.networks());
        for net in &networks {
            let Some(name) = net.name() else {
                continue;
            };
            self.observe(
                Node::new(name, EntityKind::Net)
                    .with_info("zone", net.zone.trim())
                    .with_info("bridge", net.bridge.trim()),
            );
            self.relate(name, EntityKind::Net, net.zone.trim(), EntityKind::Zone);
            self.relate(name, EntityKind::Net, net.bridge.trim(), EntityKind::Bridge);
        }
    }

    fn hosts<I: Inventory + ?Sized>(&mut self, inv: &I) {
        if self.filter.excludes(EntityKind::Host) {
            return;
        }
        let hosts = self.fetched("hosts", inv.hosts());
        let want_ifaces =
            !(self.filter.excludes(EntityKind::Bridge) && self.filter.excludes(EntityKind::Nic));

        for host in &hosts {
            let name = host.node.trim();
            if name.is_empty() {
                continue;
            }

            let mut node = Node::new(name, EntityKind::Host);
            match inv.host_status(name) {
                Ok(status) => node = with_status(node, &status),
                Err(e) => self.reporter.warn(&format!("get status of host {}: {:#}", name, e)),
            }
            self.observe(node);
            // List-level figures only fill what the status call did not supply.
            self.observe(listed_host(name, host));

            if !want_ifaces {
                continue;
            }
            let ifaces = match inv.host_interfaces(name) {
                Ok(ifaces) => ifaces,
                Err(e) => {
                    self.reporter
                        .warn(&format!("get interfaces of host {}: {:#}", name, e));
                    continue;
                }
            };
            for iface in &ifaces {
                let id = iface.iface.trim();
                let kind = if BRIDGE_KINDS.contains(&iface.kind.as_str()) {
                    EntityKind::Bridge
                } else {
                    EntityKind::Nic
                };
                if self.observe(Node::new(id, kind).with_info("kind", iface.kind.as_str())) {
                    self.relate(id, kind, name, EntityKind::Host);
                }
            }
        }
    }

    fn guests<I: Inventory + ?Sized>(&mut self, inv: &I) {
        if self.filter.excludes(EntityKind::Vm) {
            return;
        }
        let vms = self.fetched("vms", inv.vms());
        let want_bridges = !self.filter.excludes(EntityKind::Bridge);
        let want_disks = !self.filter.excludes(EntityKind::Disk);

        for vm in vms.iter().filter(|vm| vm.is_addressable()) {
            let name = vm.name.trim();
            if !self.observe(guest_node(name, vm)) {
                continue;
            }
            if !(want_bridges || want_disks) {
                continue;
            }
            let cfg = match inv.vm_config(vm) {
                Ok(cfg) => cfg,
                Err(e) => {
                    self.reporter.warn(&format!(
                        "get config of {} {} ({}): {:#}",
                        vm.kind.as_str(),
                        vm.vmid,
                        name,
                        e
                    ));
                    continue;
                }
            };

            for bridge in config::bridges(&cfg) {
                if self.observe(Node::new(bridge.as_str(), EntityKind::Bridge)) {
                    self.relate(&bridge, EntityKind::Bridge, name, EntityKind::Vm);
                }
            }
            for disk in config::disks(&cfg) {
                if self.observe(Node::new(disk.as_str(), EntityKind::Disk)) {
                    self.relate(&disk, EntityKind::Disk, name, EntityKind::Vm);
                }
            }
        }
    }

    /// Register `node` unless its id is empty or its type is excluded.
    /// Returns whether the id is now part of the graph.
    fn observe(&mut self, node: Node) -> bool {
        if node.id.is_empty() || self.filter.excludes(node.kind) {
            return false;
        }
        self.registry.observe(node);
        true
    }

    /// Emit `source -> target`, registering a bare target node if needed.
    /// Nothing happens when either end is empty, excluded or unregistered.
    fn relate(
        &mut self,
        source: &str,
        source_kind: EntityKind,
        target: &str,
        target_kind: EntityKind,
    ) {
        if source.is_empty() || target.is_empty() {
            return;
        }
        if self.filter.excludes(source_kind) || self.filter.excludes(target_kind) {
            return;
        }
        if !self.registry.contains(source) {
            return;
        }
        self.registry.observe(Node::new(target, target_kind));
        self.links.push(Link::new(source, target));
    }

    fn fetched<T>(&self, what: &str, res: Result<Vec<T>>) -> Vec<T> {
        match res {
            Ok(records) => {
                self.reporter
                    .progress(&format!("fetched {} {}", records.len(), what));
                records
            }
            Err(e) => {
                self.reporter.warn(&format!("get {}: {:#}", what, e));
                Vec::new()
            }
        }
    }
}

fn with_status(node: Node, status: &HostStatus) -> Node {
    let memory = status.memory.clone().unwrap_or_default();
    let cpuinfo = status.cpuinfo.clone().unwrap_or_default();

    let mut cpu_summary = BTreeMap::new();
    if let Some(model) = cpuinfo.model.filter(|m| !m.is_empty()) {
        cpu_summary.insert("model".to_string(), model);
    }
    if let Some(sockets) = cpuinfo.sockets {
        cpu_summary.insert("sockets".to_string(), sockets.to_string());
    }
    if let Some(cores) = cpuinfo.cores {
        cpu_summary.insert("cores".to_string(), cores.to_string());
    }

    node.with_opt_info("mem", memory.used)
        .with_opt_info("maxmem", memory.total)
        .with_opt_info("cpu", status.cpu.clone())
        .with_opt_info("maxcpu", cpuinfo.cpus)
        .with_opt_info("uptime", status.uptime.clone())
        .with_info("cpuinfo", cpu_summary)
}

fn listed_host(name: &str, host: &HostRecord) -> Node {
    Node::new(name, EntityKind::Host)
        .with_opt_info("status", host.status.clone())
        .with_opt_info("mem", host.mem.clone())
        .with_opt_info("maxmem", host.maxmem.clone())
        .with_opt_info("cpu", host.cpu.clone())
        .with_opt_info("maxcpu", host.maxcpu.clone())
        .with_opt_info("uptime", host.uptime.clone())
}

fn guest_node(name: &str, vm: &VmRecord) -> Node {
    Node::new(name, EntityKind::Vm)
        .with_info("vmid", vm.vmid.as_str())
        .with_info("host", vm.node.as_str())
        .with_info("kind", vm.kind.as_str())
        .with_opt_info("status", vm.status.clone())
        .with_opt_info("mem", vm.mem.clone())
        .with_opt_info("maxmem", vm.maxmem.clone())
        .with_opt_info("disk", vm.disk.clone())
        .with_opt_info("maxdisk", vm.maxdisk.clone())
        .with_opt_info("cpu", vm.cpu.clone())
        .with_info("tags", vm.tag_list())
}
