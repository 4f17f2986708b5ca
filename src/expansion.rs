use std::collections::HashMap;
use std::path::Path;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::catalog::CatalogIndex;
use crate::model::BenchmarkItem;
use crate::util::read_jsonl;

pub const EXPANDED_FLAG_KEY: &str = "alternatives_expanded";
pub const EXPANSION_NOTES_KEY: &str = "alternatives_notes";
pub const VERSION_DRIFT_KEY: &str = "version_drift_from";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EquivalenceJudgment {
    HumanJudgment {
        reviewer: String,
        same_intent: bool,
        note: String,
    },
    PrevettedTable,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionKind {
    Alternative,
    VersionDrift,
}

#[derive(Debug, Clone)]
pub struct ExpansionProposal {
    pub candidate: String,
    pub judgment: EquivalenceJudgment,
    pub kind: ExpansionKind,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectReason {
    AlreadyPresent,
    NotInSnapshot,
    IntentMismatch,
    NotVetted,
    MissingJustification,
    NoDrift,
}

impl RejectReason {
    pub fn code(self) -> &'static str {
        match self {
            Self::AlreadyPresent => "already-present",
            Self::NotInSnapshot => "not-in-snapshot",
            Self::IntentMismatch => "intent-mismatch",
            Self::NotVetted => "not-vetted",
            Self::MissingJustification => "missing-justification",
            Self::NoDrift => "no-drift",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acceptance {
    pub position: usize,
    pub justification: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accept(Acceptance),
    Reject(RejectReason),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemDiff {
    pub item_id: String,
    pub kind: ExpansionKind,
    pub added_tool: String,
    pub position: usize,
    pub tools_before: Vec<String>,
    pub tools_after: Vec<String>,
    pub justification: String,
    pub source: String,
}

#[derive(Debug, Clone, Deserialize)]
struct EquivalenceRecord {
    tool_id: String,
    equivalent: Vec<String>,
    #[serde(default)]
    note: String,
}

#[derive(Debug, Clone, Default)]
pub struct EquivalenceTable {
    name: String,
    notes: HashMap<(String, String), String>,
}

impl EquivalenceTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            notes: HashMap::new(),
        }
    }

    pub fn insert(&mut self, tool_id: &str, equivalent: &str, note: &str) {
        self.notes
            .insert(pair_key(tool_id, equivalent), note.trim().to_string());
    }

    pub fn load(path: &Path) -> Result<Self> {
        let mut table = Self::new(path.display().to_string());
        for line in read_jsonl(path)? {
            let value = match line.value {
                Ok(value) => value,
                Err(err) => bail!(
                    "invalid equivalence json at {}:{}: {err}",
                    path.display(),
                    line.line
                ),
            };
            let record: EquivalenceRecord = match serde_json::from_value(value) {
                Ok(record) => record,
                Err(err) => bail!(
                    "invalid equivalence record at {}:{}: {err}",
                    path.display(),
                    line.line
                ),
            };
            for equivalent in &record.equivalent {
                table.insert(&record.tool_id, equivalent, &record.note);
            }
        }

        info!(path = %path.display(), pairs = table.len(), "loaded equivalence table");
        Ok(table)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn note_for(&self, left: &str, right: &str) -> Option<&str> {
        self.notes.get(&pair_key(left, right)).map(String::as_str)
    }
}

fn pair_key(left: &str, right: &str) -> (String, String) {
    if left <= right {
        (left.to_string(), right.to_string())
    } else {
        (right.to_string(), left.to_string())
    }
}

pub fn decide(
    item: &BenchmarkItem,
    proposal: &ExpansionProposal,
    catalog: &CatalogIndex,
    table: Option<&EquivalenceTable>,
) -> Decision {
    let candidate = proposal.candidate.as_str();
    if item.tools.iter().any(|tool| tool == candidate) {
        return Decision::Reject(RejectReason::AlreadyPresent);
    }
    if !catalog.exists(candidate) {
        return Decision::Reject(RejectReason::NotInSnapshot);
    }

    let position = match proposal.kind {
        ExpansionKind::Alternative => item.tools.len(),
        ExpansionKind::VersionDrift => {
            let drifted = item.primary_tool().is_some_and(|primary| !catalog.exists(primary));
            if !drifted {
                return Decision::Reject(RejectReason::NoDrift);
            }
            0
        }
    };

    let (justification, source) = match &proposal.judgment {
        EquivalenceJudgment::HumanJudgment {
            reviewer,
            same_intent,
            note,
        } => {
            if !same_intent {
                return Decision::Reject(RejectReason::IntentMismatch);
            }
            if note.trim().is_empty() {
                return Decision::Reject(RejectReason::MissingJustification);
            }
            let source = if reviewer.trim().is_empty() {
                "human".to_string()
            } else {
                format!("human:{}", reviewer.trim())
            };
            (note.trim().to_string(), source)
        }
        EquivalenceJudgment::PrevettedTable => {
            let Some(table) = table else {
                return Decision::Reject(RejectReason::NotVetted);
            };
            let note = item
                .tools
                .iter()
                .find_map(|tool| table.note_for(tool, candidate));
            match note {
                Some(note) if !note.is_empty() => {
                    (note.to_string(), format!("table:{}", table.name()))
                }
                Some(_) => (
                    format!("listed as equivalent in {}", table.name()),
                    format!("table:{}", table.name()),
                ),
                None => return Decision::Reject(RejectReason::NotVetted),
            }
        }
    };

    Decision::Accept(Acceptance {
        position,
        justification,
        source,
    })
}

pub fn apply(item: &mut BenchmarkItem, proposal: &ExpansionProposal, acceptance: &Acceptance) -> ItemDiff {
    let tools_before = item.tools.clone();

    if proposal.kind == ExpansionKind::VersionDrift {
        if let Some(primary) = item.primary_tool() {
            item.metadata
                .insert(VERSION_DRIFT_KEY.to_string(), Value::String(primary.to_string()));
        }
    }
    let position = acceptance.position.min(item.tools.len());
    item.tools.insert(position, proposal.candidate.clone());

    item.metadata
        .insert(EXPANDED_FLAG_KEY.to_string(), Value::Bool(true));
    let note = format!(
        "{}: {} ({})",
        proposal.candidate, acceptance.justification, acceptance.source
    );
    match item.metadata.get_mut(EXPANSION_NOTES_KEY) {
        Some(Value::Array(notes)) => notes.push(Value::String(note)),
        _ => {
            item.metadata.insert(
                EXPANSION_NOTES_KEY.to_string(),
                Value::Array(vec![Value::String(note)]),
            );
        }
    }

    ItemDiff {
        item_id: item.id.clone(),
        kind: proposal.kind,
        added_tool: proposal.candidate.clone(),
        position,
        tools_before,
        tools_after: item.tools.clone(),
        justification: acceptance.justification.clone(),
        source: acceptance.source.clone(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProposalOutcome {
    Accepted(ItemDiff),
    Rejected(RejectReason),
}

pub fn propose(
    item: &mut BenchmarkItem,
    proposal: &ExpansionProposal,
    catalog: &CatalogIndex,
    table: Option<&EquivalenceTable>,
) -> ProposalOutcome {
    match decide(item, proposal, catalog, table) {
        Decision::Accept(acceptance) => ProposalOutcome::Accepted(apply(item, proposal, &acceptance)),
        Decision::Reject(reason) => ProposalOutcome::Rejected(reason),
    }
}

pub fn is_expanded(metadata: &Map<String, Value>) -> bool {
    metadata
        .get(EXPANDED_FLAG_KEY)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    const OLD: &str = "toolshed.g2.bx.psu.edu/repos/iuc/featurecounts/featurecounts/1.6.4+galaxy1";
    const NEW: &str = "toolshed.g2.bx.psu.edu/repos/iuc/featurecounts/featurecounts/2.0.3+galaxy2";
    const HTSEQ: &str = "toolshed.g2.bx.psu.edu/repos/lparsons/htseq_count/htseq_count/2.0.5+galaxy0";

    fn snapshot(tool_ids: &[&str]) -> CatalogIndex {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for tool_id in tool_ids {
            groups
                .entry(crate::tool_id::base_id(tool_id).to_string())
                .or_default()
                .push(tool_id.to_string());
        }
        CatalogIndex::from_groups(groups)
    }

    fn item(tools: &[&str]) -> BenchmarkItem {
        BenchmarkItem {
            id: "rna-seq-counts-q011".to_string(),
            tutorial_id: Some("transcriptomics/ref-based".to_string()),
            query: "Count reads per gene from my aligned BAM files.".to_string(),
            tools: tools.iter().map(|tool| tool.to_string()).collect(),
            metadata: Map::new(),
            extra: Map::new(),
        }
    }

    fn human(note: &str) -> EquivalenceJudgment {
        EquivalenceJudgment::HumanJudgment {
            reviewer: "curator".to_string(),
            same_intent: true,
            note: note.to_string(),
        }
    }

    fn alternative(candidate: &str, judgment: EquivalenceJudgment) -> ExpansionProposal {
        ExpansionProposal {
            candidate: candidate.to_string(),
            judgment,
            kind: ExpansionKind::Alternative,
        }
    }

    #[test]
    fn accepted_alternative_is_appended_and_stamped() {
        let catalog = snapshot(&[OLD, HTSEQ]);
        let mut target = item(&[OLD]);
        let proposal = alternative(HTSEQ, human("both count reads per feature"));

        let outcome = propose(&mut target, &proposal, &catalog, None);
        let ProposalOutcome::Accepted(diff) = &outcome else {
            panic!("proposal should be accepted: {outcome:?}");
        };
        assert_eq!(diff.position, 1);
        assert_eq!(target.tools, vec![OLD.to_string(), HTSEQ.to_string()]);
        assert!(is_expanded(&target.metadata));
        let notes = target.metadata[EXPANSION_NOTES_KEY]
            .as_array()
            .expect("notes should be an array");
        assert_eq!(notes.len(), 1);
        assert!(notes[0].as_str().unwrap_or_default().contains("human:curator"));
    }

    #[test]
    fn candidate_missing_from_snapshot_is_rejected_without_mutation() {
        let catalog = snapshot(&[OLD]);
        let mut target = item(&[OLD]);
        let before = target.clone();

        let outcome = propose(&mut target, &alternative(HTSEQ, human("same")), &catalog, None);
        assert_eq!(outcome, ProposalOutcome::Rejected(RejectReason::NotInSnapshot));
        assert_eq!(target, before);
        assert_eq!(RejectReason::NotInSnapshot.code(), "not-in-snapshot");
    }

    #[test]
    fn repeating_an_accepted_candidate_is_a_no_op() {
        let catalog = snapshot(&[OLD, HTSEQ]);
        let mut target = item(&[OLD]);
        let proposal = alternative(HTSEQ, human("both count reads per feature"));

        assert!(matches!(
            propose(&mut target, &proposal, &catalog, None),
            ProposalOutcome::Accepted(_)
        ));
        let after_first = target.clone();
        assert_eq!(
            propose(&mut target, &proposal, &catalog, None),
            ProposalOutcome::Rejected(RejectReason::AlreadyPresent)
        );
        assert_eq!(target, after_first);
    }

    #[test]
    fn human_judgment_needs_same_intent_and_a_note() {
        let catalog = snapshot(&[OLD, HTSEQ]);
        let target = item(&[OLD]);

        let mismatch = EquivalenceJudgment::HumanJudgment {
            reviewer: "curator".to_string(),
            same_intent: false,
            note: "different output".to_string(),
        };
        assert_eq!(
            decide(&target, &alternative(HTSEQ, mismatch), &catalog, None),
            Decision::Reject(RejectReason::IntentMismatch)
        );
        assert_eq!(
            decide(&target, &alternative(HTSEQ, human("  ")), &catalog, None),
            Decision::Reject(RejectReason::MissingJustification)
        );
    }

    #[test]
    fn table_judgment_requires_a_vetted_pair() {
        let catalog = snapshot(&[OLD, HTSEQ]);
        let target = item(&[OLD]);
        let proposal = alternative(HTSEQ, EquivalenceJudgment::PrevettedTable);

        assert_eq!(
            decide(&target, &proposal, &catalog, None),
            Decision::Reject(RejectReason::NotVetted)
        );

        let mut table = EquivalenceTable::new("counting.jsonl");
        table.insert(HTSEQ, OLD, "gene-level read counting");
        let Decision::Accept(acceptance) = decide(&target, &proposal, &catalog, Some(&table)) else {
            panic!("vetted pair should be accepted");
        };
        assert_eq!(acceptance.justification, "gene-level read counting");
        assert_eq!(acceptance.source, "table:counting.jsonl");
    }

    #[test]
    fn version_drift_keeps_the_drifted_primary() {
        let catalog = snapshot(&[NEW]);
        let mut target = item(&[OLD]);
        let proposal = ExpansionProposal {
            candidate: NEW.to_string(),
            judgment: human("same tool, newer wrapper"),
            kind: ExpansionKind::VersionDrift,
        };

        let ProposalOutcome::Accepted(diff) = propose(&mut target, &proposal, &catalog, None) else {
            panic!("drift correction should be accepted");
        };
        assert_eq!(diff.position, 0);
        assert_eq!(target.tools, vec![NEW.to_string(), OLD.to_string()]);
        assert_eq!(target.metadata[VERSION_DRIFT_KEY], Value::String(OLD.to_string()));
    }

    #[test]
    fn version_drift_is_rejected_when_primary_still_exists() {
        let catalog = snapshot(&[OLD, NEW]);
        let target = item(&[OLD]);
        let proposal = ExpansionProposal {
            candidate: NEW.to_string(),
            judgment: human("newer wrapper"),
            kind: ExpansionKind::VersionDrift,
        };
        assert_eq!(
            decide(&target, &proposal, &catalog, None),
            Decision::Reject(RejectReason::NoDrift)
        );
    }

    #[test]
    fn equivalence_table_loads_symmetric_pairs() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("equivalences.jsonl");
        std::fs::write(
            &path,
            format!("{{\"tool_id\":\"{OLD}\",\"equivalent\":[\"{HTSEQ}\"],\"note\":\"read counting\"}}\n"),
        )
        .expect("fixture should be written");

        let table = EquivalenceTable::load(&path).expect("table should load");
        assert_eq!(table.len(), 1);
        assert_eq!(table.note_for(HTSEQ, OLD), Some("read counting"));
    }
}
