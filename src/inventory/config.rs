//! Guest configuration scanning: which bridges a guest is plugged into and
//! which volumes back its disks.
//!
//! Example qemu config entries:
//!   net0:  virtio=BC:24:11:00:00:01,bridge=vmbr0,firewall=1
//!   scsi0: local-lvm:vm-100-disk-0,iothread=1,size=32G
//!   ide2:  local:iso/debian.iso,media=cdrom
//!   scsihw: virtio-scsi-single

use crate::inventory::VmConfig;

use regex::Regex;
use std::sync::LazyLock;

static NET_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^net\d+$").expect("valid net key regex"));

// `scsihw` selects the controller model; it never matches because of the `\d+`.
static DISK_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:scsi|virtio|sata|ide|mp)\d+|rootfs)$").expect("valid disk key regex")
});

/// Distinct bridge names referenced by `netN` entries, first-seen order.
pub fn bridges(config: &VmConfig) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for (key, value) in config {
        if !NET_KEY_RE.is_match(key) {
            continue;
        }
        let Some(bridge) = value.as_str().and_then(bridge_of) else {
            continue;
        };
        if !out.iter().any(|b| b == bridge) {
            out.push(bridge.to_string());
        }
    }
    out
}

/// Volume ids of every non-removable disk entry, in key order.
pub fn disks(config: &VmConfig) -> Vec<String> {
    config
        .iter()
        .filter(|(key, _)| DISK_KEY_RE.is_match(key))
        .filter_map(|(_, value)| value.as_str().and_then(volume_of))
        .map(str::to_string)
        .collect()
}

/// `virtio=..,bridge=vmbr0,firewall=1` -> `vmbr0`.
fn bridge_of(value: &str) -> Option<&str> {
    value
        .split(',')
        .find_map(|part| part.trim().strip_prefix("bridge="))
        .map(str::trim)
        .filter(|b| !b.is_empty())
}

/// `local-lvm:vm-100-disk-0,size=32G` -> `local-lvm:vm-100-disk-0`.
/// Optical media and empty drives yield nothing.
fn volume_of(value: &str) -> Option<&str> {
    let mut parts = value.split(',').map(str::trim);
    let volume = parts.next().filter(|v| !v.is_empty() && *v != "none")?;
    if parts.any(|p| p == "media=cdrom") {
        return None;
    }
    Some(volume)
}
