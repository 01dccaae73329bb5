//! Graph snapshots on disk: one pretty-printed JSON file per sync.

use crate::graph::Graph;
use crate::Result;

use anyhow::{Context, bail};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SNAPSHOT: &str = "graph.json";

/// Write `graph` to `path`, creating parent directories as needed.
pub fn save_graph(path: &Path, graph: &Graph) -> Result<()> {
    let json = graph.to_json_pretty().context("serialize graph")?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn read_graph(path: &Path) -> Result<Graph> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse graph {}", path.display()))
}

/// Load snapshot `name` from `dir` as raw JSON, values exactly as stored.
/// Only the final path component of `name` is used, so callers cannot
/// escape `dir`.
pub fn load_snapshot(dir: &Path, name: Option<&str>) -> Result<serde_json::Value> {
    let path = snapshot_path(dir, name)?;
    let text = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse snapshot {}", path.display()))
}

/// Regular `*.json` files in `dir`, sorted by name.
pub fn list_graphs(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

fn snapshot_path(dir: &Path, name: Option<&str>) -> Result<PathBuf> {
    let name = name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or(DEFAULT_SNAPSHOT);
    match Path::new(name).file_name() {
        Some(base) => Ok(dir.join(base)),
        None => bail!("invalid snapshot name {:?}", name),
    }
}
