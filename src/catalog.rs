use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::DataIntegrityError;
use crate::model::CatalogEntry;
use crate::tool_id::{self, ToolIdShape};
use crate::util::{read_jsonl, write_json_pretty};

#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    groups: BTreeMap<String, Vec<String>>,
    base_of: HashMap<String, String>,
}

impl CatalogIndex {
    pub fn build(entries: &[CatalogEntry]) -> Result<Self, DataIntegrityError> {
        let mut seen: HashMap<&str, &CatalogEntry> = HashMap::with_capacity(entries.len());
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for entry in entries {
            if let Some(previous) = seen.get(entry.tool_id.as_str()) {
                if let Some(field) = conflicting_field(previous, entry) {
                    return Err(DataIntegrityError::DuplicateEntry {
                        tool_id: entry.tool_id.clone(),
                        field,
                    });
                }
                continue;
            }
            seen.insert(entry.tool_id.as_str(), entry);

            groups
                .entry(entry_base_id(entry).to_string())
                .or_default()
                .push(entry.tool_id.clone());
        }

        for tool_ids in groups.values_mut() {
            order_newest_first(tool_ids);
        }

        Ok(Self::from_groups(groups))
    }

    pub fn from_groups(groups: BTreeMap<String, Vec<String>>) -> Self {
        let mut base_of = HashMap::new();
        for (base, tool_ids) in &groups {
            for tool_id in tool_ids {
                base_of.insert(tool_id.clone(), base.clone());
            }
        }
        Self { groups, base_of }
    }

    pub fn exists(&self, tool_id: &str) -> bool {
        self.base_of.contains_key(tool_id)
    }

    pub fn base_of<'a>(&'a self, tool_id: &'a str) -> &'a str {
        self.base_of
            .get(tool_id)
            .map(String::as_str)
            .unwrap_or_else(|| tool_id::base_id(tool_id))
    }

    pub fn alternatives_for(&self, tool_id: &str) -> Vec<&str> {
        self.groups
            .get(self.base_of(tool_id))
            .map(|tool_ids| {
                tool_ids
                    .iter()
                    .map(String::as_str)
                    .filter(|candidate| *candidate != tool_id)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn groups(&self) -> &BTreeMap<String, Vec<String>> {
        &self.groups
    }

    pub fn tool_count(&self) -> usize {
        self.base_of.len()
    }

    pub fn base_count(&self) -> usize {
        self.groups.len()
    }
}

fn entry_base_id(entry: &CatalogEntry) -> &str {
    let declared = entry.base_id.trim();
    if declared.is_empty() {
        tool_id::base_id(&entry.tool_id)
    } else {
        declared
    }
}

fn conflicting_field(left: &CatalogEntry, right: &CatalogEntry) -> Option<&'static str> {
    if entry_base_id(left) != entry_base_id(right) {
        return Some("base_id");
    }
    if left.name != right.name {
        return Some("name");
    }
    if left.version != right.version {
        return Some("version");
    }
    if left.description != right.description {
        return Some("description");
    }
    if left.io != right.io {
        return Some("io metadata");
    }
    None
}

// only all-Guid groups have a reliable version order
fn order_newest_first(tool_ids: &mut [String]) {
    let all_versioned = tool_ids
        .iter()
        .all(|tool_id| tool_id::classify(tool_id) == ToolIdShape::Guid);
    if !all_versioned {
        return;
    }

    tool_ids.sort_by(|left, right| {
        let left_version = tool_id::version_segment(left).unwrap_or_default();
        let right_version = tool_id::version_segment(right).unwrap_or_default();
        tool_id::compare_versions(right_version, left_version)
    });
}

pub fn load_catalog(path: &Path) -> Result<Vec<CatalogEntry>> {
    if !path.exists() {
        bail!("tool catalog not found: {}", path.display());
    }

    let mut entries = Vec::new();
    let mut skipped = 0usize;
    for line in read_jsonl(path)? {
        let value = match line.value {
            Ok(value) => value,
            Err(err) => bail!("invalid catalog json at {}:{}: {err}", path.display(), line.line),
        };

        let has_tool_id = value
            .get("tool_id")
            .and_then(Value::as_str)
            .is_some_and(|tool_id| !tool_id.trim().is_empty());
        if !value.is_object() || !has_tool_id {
            warn!(line = line.line, path = %path.display(), "skipping catalog line without tool_id");
            skipped += 1;
            continue;
        }

        let entry: CatalogEntry = serde_json::from_value(value).with_context(|| {
            format!("failed to parse catalog entry at {}:{}", path.display(), line.line)
        })?;
        entries.push(entry);
    }

    info!(
        path = %path.display(),
        entries = entries.len(),
        skipped,
        "loaded tool catalog"
    );
    Ok(entries)
}

pub fn write_index(path: &Path, index: &CatalogIndex) -> Result<()> {
    write_json_pretty(path, index.groups())
}

pub fn load_index(path: &Path) -> Result<CatalogIndex> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let groups: BTreeMap<String, Vec<String>> = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse catalog index {}", path.display()))?;
    Ok(CatalogIndex::from_groups(groups))
}

pub fn load_snapshot(path: &Path) -> Result<CatalogIndex> {
    let is_index = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let index = if is_index {
        load_index(path)?
    } else {
        let entries = load_catalog(path)?;
        CatalogIndex::build(&entries)
            .with_context(|| format!("failed to index catalog {}", path.display()))?
    };

    info!(
        path = %path.display(),
        tools = index.tool_count(),
        bases = index.base_count(),
        "catalog snapshot ready"
    );
    Ok(index)
}
