use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::catalog::CatalogIndex;
use crate::error::DataIntegrityError;
use crate::expansion::{self, EquivalenceTable, ExpansionProposal, ItemDiff, ProposalOutcome, RejectReason};
use crate::model::BenchmarkItem;
use crate::util::{append_jsonl, now_utc_string, read_jsonl, sha256_bytes, write_jsonl};

#[derive(Debug, Clone, PartialEq)]
pub enum ToolsField {
    Missing,
    Strings(Vec<String>),
    Malformed,
}

pub fn read_tools(record: &Value) -> ToolsField {
    match record.get("tools") {
        None | Some(Value::Null) => ToolsField::Missing,
        Some(Value::Array(values)) => {
            let tools = values
                .iter()
                .map(|value| value.as_str().map(str::to_string))
                .collect::<Option<Vec<String>>>();
            match tools {
                Some(tools) => ToolsField::Strings(tools),
                None => ToolsField::Malformed,
            }
        }
        Some(_) => ToolsField::Malformed,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Revision {
    pub revision: u64,
    pub parent_digest: String,
    pub digest: String,
    pub created_at: String,
    pub diff: ItemDiff,
}

#[derive(Debug, Clone)]
pub enum StoreOutcome {
    Committed(Revision),
    Rejected(RejectReason),
}

#[derive(Debug, Clone)]
pub struct GoldStore {
    items: Vec<BenchmarkItem>,
    positions: HashMap<String, usize>,
    revision: u64,
    digest: String,
}

impl GoldStore {
    fn from_numbered(items: Vec<(usize, BenchmarkItem)>, origin: &str) -> Result<Self> {
        if items.is_empty() {
            return Err(DataIntegrityError::EmptyGold {
                path: origin.to_string(),
            }
            .into());
        }

        let mut first_lines: HashMap<String, usize> = HashMap::with_capacity(items.len());
        let mut positions = HashMap::with_capacity(items.len());
        let mut ordered = Vec::with_capacity(items.len());
        for (line, item) in items {
            if item.tools.is_empty() {
                return Err(DataIntegrityError::EmptyTools { id: item.id, line }.into());
            }
            if let Some(first_line) = first_lines.get(&item.id) {
                return Err(DataIntegrityError::DuplicateId {
                    id: item.id,
                    line,
                    first_line: *first_line,
                }
                .into());
            }
            first_lines.insert(item.id.clone(), line);
            positions.insert(item.id.clone(), ordered.len());
            ordered.push(item);
        }

        let digest = content_digest(&ordered)?;
        Ok(Self {
            items: ordered,
            positions,
            revision: 0,
            digest,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("benchmark file not found: {}", path.display());
        }

        let mut numbered = Vec::new();
        for line in read_jsonl(path)? {
            let value = line
                .value
                .map_err(|err| anyhow!("invalid json at {}:{}: {err}", path.display(), line.line))?;
            let id = value
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .with_context(|| format!("missing string id at {}:{}", path.display(), line.line))?;

            match read_tools(&value) {
                ToolsField::Strings(tools) if tools.is_empty() => {
                    return Err(DataIntegrityError::EmptyTools { id, line: line.line }.into());
                }
                ToolsField::Strings(_) => {}
                ToolsField::Missing | ToolsField::Malformed => {
                    return Err(DataIntegrityError::MalformedTools { id, line: line.line }.into());
                }
            }

            let item: BenchmarkItem = serde_json::from_value(value).with_context(|| {
                format!("failed to parse benchmark item at {}:{}", path.display(), line.line)
            })?;
            numbered.push((line.line, item));
        }

        let store = Self::from_numbered(numbered, &path.display().to_string())?;
        info!(
            path = %path.display(),
            items = store.len(),
            digest = %store.digest,
            "loaded benchmark store"
        );
        Ok(store)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_jsonl(path, &self.items)
    }

    pub fn items(&self) -> &[BenchmarkItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&BenchmarkItem> {
        self.positions.get(id).map(|position| &self.items[*position])
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn resume_from(&mut self, revision: u64) {
        self.revision = revision;
    }

    pub fn propose(
        &mut self,
        item_id: &str,
        proposal: &ExpansionProposal,
        catalog: &CatalogIndex,
        table: Option<&EquivalenceTable>,
    ) -> Result<StoreOutcome> {
        let position = *self
            .positions
            .get(item_id)
            .with_context(|| format!("unknown benchmark item id `{item_id}`"))?;

        let diff = match expansion::propose(&mut self.items[position], proposal, catalog, table) {
            ProposalOutcome::Accepted(diff) => diff,
            ProposalOutcome::Rejected(reason) => return Ok(StoreOutcome::Rejected(reason)),
        };

        let parent_digest = std::mem::take(&mut self.digest);
        self.digest = content_digest(&self.items)?;
        self.revision += 1;

        Ok(StoreOutcome::Committed(Revision {
            revision: self.revision,
            parent_digest,
            digest: self.digest.clone(),
            created_at: now_utc_string(),
            diff,
        }))
    }
}

fn content_digest(items: &[BenchmarkItem]) -> Result<String> {
    let mut data = Vec::new();
    for item in items {
        let line = serde_json::to_vec(item)
            .with_context(|| format!("failed to serialize benchmark item `{}`", item.id))?;
        data.extend_from_slice(&line);
        data.push(b'\n');
    }
    Ok(sha256_bytes(&data))
}

#[derive(Debug, Clone)]
pub struct RevisionLog {
    path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionHead {
    pub revision: u64,
    pub digest: String,
}

impl RevisionLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn for_gold(gold_path: &Path) -> Self {
        let mut name = gold_path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".revisions.jsonl");
        Self::new(gold_path.with_file_name(name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn head(&self) -> Result<Option<RevisionHead>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let mut head = None;
        for line in read_jsonl(&self.path)? {
            let value = line.value.map_err(|err| {
                anyhow!("invalid revision log json at {}:{}: {err}", self.path.display(), line.line)
            })?;
            let revision = value.get("revision").and_then(Value::as_u64);
            let digest = value.get("digest").and_then(Value::as_str);
            match (revision, digest) {
                (Some(revision), Some(digest)) => {
                    head = Some(RevisionHead {
                        revision,
                        digest: digest.to_string(),
                    });
                }
                _ => bail!(
                    "revision log entry at {}:{} lacks revision/digest",
                    self.path.display(),
                    line.line
                ),
            }
        }
        Ok(head)
    }

    pub fn append(&self, revision: &Revision) -> Result<()> {
        append_jsonl(&self.path, revision)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fs;

    use serde_json::Map;

    use super::*;
    use crate::expansion::{EquivalenceJudgment, ExpansionKind};

    fn item(id: &str, tools: &[&str]) -> BenchmarkItem {
        BenchmarkItem {
            id: id.to_string(),
            tutorial_id: None,
            query: "Trim adapters from paired-end reads.".to_string(),
            tools: tools.iter().map(|tool| tool.to_string()).collect(),
            metadata: Map::new(),
            extra: Map::new(),
        }
    }

    fn store_of(items: Vec<BenchmarkItem>) -> Result<GoldStore> {
        let numbered = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| (index + 1, item))
            .collect();
        GoldStore::from_numbered(numbered, "<memory>")
    }

    fn catalog(tool_ids: &[&str]) -> CatalogIndex {
        let mut groups = BTreeMap::new();
        for tool_id in tool_ids {
            groups.insert(tool_id.to_string(), vec![tool_id.to_string()]);
        }
        CatalogIndex::from_groups(groups)
    }

    fn proposal(candidate: &str) -> ExpansionProposal {
        ExpansionProposal {
            candidate: candidate.to_string(),
            judgment: EquivalenceJudgment::HumanJudgment {
                reviewer: "curator".to_string(),
                same_intent: true,
                note: "both trim adapters".to_string(),
            },
            kind: ExpansionKind::Alternative,
        }
    }

    #[test]
    fn load_rejects_duplicate_ids_with_line_numbers() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("items.jsonl");
        fs::write(
            &path,
            "{\"id\":\"q1\",\"tools\":[\"a\"]}\n\n{\"id\":\"q1\",\"tools\":[\"b\"]}\n",
        )
        .expect("fixture should be written");

        let err = GoldStore::load(&path).expect_err("duplicate id should fail");
        let integrity = err
            .downcast_ref::<DataIntegrityError>()
            .expect("should be an integrity error");
        assert!(matches!(
            integrity,
            DataIntegrityError::DuplicateId { line: 3, first_line: 1, .. }
        ));
    }

    #[test]
    fn load_rejects_empty_and_malformed_tools() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let empty = dir.path().join("empty_tools.jsonl");
        fs::write(&empty, "{\"id\":\"q1\",\"tools\":[]}\n").expect("fixture should be written");
        let err = GoldStore::load(&empty).expect_err("empty tools should fail");
        assert!(matches!(
            err.downcast_ref::<DataIntegrityError>(),
            Some(DataIntegrityError::EmptyTools { .. })
        ));

        let malformed = dir.path().join("malformed.jsonl");
        fs::write(&malformed, "{\"id\":\"q1\",\"tools\":[\"a\", 3]}\n")
            .expect("fixture should be written");
        let err = GoldStore::load(&malformed).expect_err("non-string tools should fail");
        assert!(matches!(
            err.downcast_ref::<DataIntegrityError>(),
            Some(DataIntegrityError::MalformedTools { .. })
        ));

        let blank = dir.path().join("blank.jsonl");
        fs::write(&blank, "\n\n").expect("fixture should be written");
        let err = GoldStore::load(&blank).expect_err("empty file should fail");
        assert!(matches!(
            err.downcast_ref::<DataIntegrityError>(),
            Some(DataIntegrityError::EmptyGold { .. })
        ));
    }

    #[test]
    fn accepted_proposal_bumps_revision_and_digest() {
        let mut store = store_of(vec![item("q1", &["cutadapt"]), item("q2", &["fastp"])])
            .expect("store should build");
        let initial_digest = store.digest().to_string();

        let outcome = store
            .propose("q1", &proposal("trimmomatic"), &catalog(&["cutadapt", "trimmomatic"]), None)
            .expect("proposal should run");
        let StoreOutcome::Committed(revision) = outcome else {
            panic!("proposal should be committed");
        };
        assert_eq!(revision.revision, 1);
        assert_eq!(revision.parent_digest, initial_digest);
        assert_ne!(revision.digest, initial_digest);
        assert_eq!(store.revision(), 1);
        assert_eq!(
            store.get("q1").map(|item| item.tools.clone()),
            Some(vec!["cutadapt".to_string(), "trimmomatic".to_string()])
        );
    }

    #[test]
    fn rejected_proposal_leaves_store_unchanged() {
        let mut store = store_of(vec![item("q1", &["cutadapt"])]).expect("store should build");
        let digest = store.digest().to_string();

        let outcome = store
            .propose("q1", &proposal("trimmomatic"), &catalog(&["cutadapt"]), None)
            .expect("proposal should run");
        assert!(matches!(
            outcome,
            StoreOutcome::Rejected(RejectReason::NotInSnapshot)
        ));
        assert_eq!(store.digest(), digest);
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn unknown_item_is_an_error() {
        let mut store = store_of(vec![item("q1", &["cutadapt"])]).expect("store should build");
        let err = store
            .propose("missing", &proposal("fastp"), &catalog(&["fastp"]), None)
            .expect_err("unknown id should fail");
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn saved_file_digest_matches_store_digest() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("items.jsonl");
        let store = store_of(vec![item("q1", &["cutadapt"])]).expect("store should build");
        store.save(&path).expect("store should save");

        let file_digest = crate::util::sha256_file(&path).expect("file should hash");
        assert_eq!(file_digest, store.digest());

        let reloaded = GoldStore::load(&path).expect("store should reload");
        assert_eq!(reloaded.items(), store.items());
    }

    #[test]
    fn revision_log_reports_latest_head() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let gold = dir.path().join("v1_items.jsonl");
        let log = RevisionLog::for_gold(&gold);
        assert_eq!(
            log.path().file_name().and_then(|name| name.to_str()),
            Some("v1_items.jsonl.revisions.jsonl")
        );
        assert_eq!(log.head().expect("missing log is fine"), None);

        let mut store = store_of(vec![item("q1", &["cutadapt"])]).expect("store should build");
        let snapshot = catalog(&["cutadapt", "fastp", "trimmomatic"]);
        for candidate in ["fastp", "trimmomatic"] {
            if let StoreOutcome::Committed(revision) = store
                .propose("q1", &proposal(candidate), &snapshot, None)
                .expect("proposal should run")
            {
                log.append(&revision).expect("revision should append");
            }
        }

        let head = log.head().expect("log should read").expect("log should have a head");
        assert_eq!(head.revision, 2);
        assert_eq!(head.digest, store.digest());
    }

    #[test]
    fn read_tools_distinguishes_shapes() {
        assert_eq!(read_tools(&serde_json::json!({"id": "q"})), ToolsField::Missing);
        assert_eq!(
            read_tools(&serde_json::json!({"tools": ["a"]})),
            ToolsField::Strings(vec!["a".to_string()])
        );
        assert_eq!(read_tools(&serde_json::json!({"tools": "a"})), ToolsField::Malformed);
    }
}
