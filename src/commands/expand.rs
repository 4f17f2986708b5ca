use std::fs;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::catalog::load_snapshot;
use crate::cli::{ExpandArgs, JudgmentSource};
use crate::expansion::{EquivalenceJudgment, EquivalenceTable, ExpansionKind, ExpansionProposal};
use crate::store::{GoldStore, RevisionLog, StoreOutcome};
use crate::util::print_json_pretty;

pub fn run(args: ExpandArgs) -> Result<()> {
    let mut store = GoldStore::load(&args.gold)?;
    let catalog = load_snapshot(&args.catalog)?;
    let table = args
        .equivalence_table
        .as_deref()
        .map(EquivalenceTable::load)
        .transpose()?;
    if table.as_ref().is_some_and(EquivalenceTable::is_empty) {
        warn!("equivalence table has no pairs; table judgments will be rejected");
    }

    let log = match &args.revision_log {
        Some(path) => RevisionLog::new(path.clone()),
        None => RevisionLog::for_gold(&args.gold),
    };
    if let Some(head) = log.head()? {
        if head.digest != store.digest() {
            warn!(
                log = %log.path().display(),
                recorded = %head.digest,
                current = %store.digest(),
                "gold file differs from the last recorded revision"
            );
        }
        store.resume_from(head.revision);
        info!(revision = store.revision(), "continuing recorded revisions");
    }

    let proposal = proposal_from_args(&args);
    info!(
        item_id = %args.item_id,
        candidate = %proposal.candidate,
        judgment = args.judgment.as_str(),
        kind = ?proposal.kind,
        "expansion requested"
    );
    if let Some(item) = store.get(&args.item_id) {
        debug!(item_id = %item.id, tools = ?item.tools, "current gold tools");
    }

    match store.propose(&args.item_id, &proposal, &catalog, table.as_ref())? {
        StoreOutcome::Committed(revision) => {
            let previous = fs::read(&args.gold)
                .with_context(|| format!("failed to read gold file: {}", args.gold.display()))?;
            store.save(&args.gold)?;
            // the gold file and the log move together; undo the save if the log write fails
            if let Err(err) = log.append(&revision) {
                fs::write(&args.gold, &previous).with_context(|| {
                    format!(
                        "failed to restore {} after revision {} could not be logged",
                        args.gold.display(),
                        revision.revision
                    )
                })?;
                return Err(err.context(format!(
                    "revision {} was not recorded; gold file left unchanged",
                    revision.revision
                )));
            }
            info!(
                item_id = %revision.diff.item_id,
                revision = revision.revision,
                digest = %revision.digest,
                path = %args.gold.display(),
                "expansion committed"
            );
            print_json_pretty(&json!({
                "status": "accepted",
                "revision": revision,
            }))
        }
        StoreOutcome::Rejected(reason) => {
            warn!(
                item_id = %args.item_id,
                candidate = %proposal.candidate,
                reason = reason.code(),
                "expansion rejected"
            );
            print_json_pretty(&json!({
                "status": "rejected",
                "item_id": args.item_id,
                "candidate": proposal.candidate,
                "reason": reason.code(),
            }))
        }
    }
}

fn proposal_from_args(args: &ExpandArgs) -> ExpansionProposal {
    let judgment = match args.judgment {
        JudgmentSource::Human => EquivalenceJudgment::HumanJudgment {
            reviewer: args.reviewer.clone(),
            same_intent: !args.intent_mismatch,
            note: args.note.clone(),
        },
        JudgmentSource::Table => EquivalenceJudgment::PrevettedTable,
    };
    let kind = if args.version_drift {
        ExpansionKind::VersionDrift
    } else {
        ExpansionKind::Alternative
    };

    ExpansionProposal {
        candidate: args.candidate.trim().to_string(),
        judgment,
        kind,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::util::read_jsonl;

    const FEATURECOUNTS_OLD: &str =
        "toolshed.g2.bx.psu.edu/repos/iuc/featurecounts/featurecounts/1.6.4+galaxy1";
    const FEATURECOUNTS_NEW: &str =
        "toolshed.g2.bx.psu.edu/repos/iuc/featurecounts/featurecounts/2.0.3+galaxy2";
    const HTSEQ: &str = "toolshed.g2.bx.psu.edu/repos/lparsons/htseq_count/htseq_count/2.0.5+galaxy0";

    struct Fixture {
        _dir: tempfile::TempDir,
        gold: PathBuf,
        catalog: PathBuf,
        table: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let gold = dir.path().join("v1_items.jsonl");
        fs::write(
            &gold,
            format!(
                "{{\"id\":\"rna-1\",\"tutorial_id\":\"transcriptomics/ref-based\",\"query\":\"Count reads per gene.\",\"tools\":[\"{FEATURECOUNTS_OLD}\"]}}\n"
            ),
        )
        .expect("gold fixture should be written");

        let catalog = dir.path().join("tools.jsonl");
        fs::write(
            &catalog,
            format!("{{\"tool_id\":\"{FEATURECOUNTS_NEW}\"}}\n{{\"tool_id\":\"{HTSEQ}\"}}\n"),
        )
        .expect("catalog fixture should be written");

        let table = dir.path().join("equivalence.jsonl");
        fs::write(
            &table,
            format!(
                "{{\"tool_id\":\"{FEATURECOUNTS_OLD}\",\"equivalent\":[\"{HTSEQ}\"],\"note\":\"both count reads per feature\"}}\n"
            ),
        )
        .expect("table fixture should be written");

        Fixture {
            _dir: dir,
            gold,
            catalog,
            table,
        }
    }

    fn args(fixture: &Fixture, candidate: &str) -> ExpandArgs {
        ExpandArgs {
            gold: fixture.gold.clone(),
            catalog: fixture.catalog.clone(),
            item_id: "rna-1".to_string(),
            candidate: candidate.to_string(),
            judgment: JudgmentSource::Human,
            reviewer: "curator".to_string(),
            note: "same counting step".to_string(),
            intent_mismatch: false,
            equivalence_table: None,
            version_drift: false,
            revision_log: None,
        }
    }

    fn revision_lines(gold: &Path) -> usize {
        let log = RevisionLog::for_gold(gold);
        if !log.path().exists() {
            return 0;
        }
        read_jsonl(log.path()).expect("revision log should read").len()
    }

    #[test]
    fn drift_replacement_rewrites_gold_and_logs_revision() {
        let fixture = fixture();
        let mut drift = args(&fixture, FEATURECOUNTS_NEW);
        drift.version_drift = true;

        run(drift).expect("drift proposal should run");

        let store = GoldStore::load(&fixture.gold).expect("gold should reload");
        let item = store.get("rna-1").expect("item should exist");
        assert_eq!(item.tools, vec![FEATURECOUNTS_NEW, FEATURECOUNTS_OLD]);
        assert_eq!(item.tutorial_id.as_deref(), Some("transcriptomics/ref-based"));

        let head = RevisionLog::for_gold(&fixture.gold)
            .head()
            .expect("log should read")
            .expect("log should have a head");
        assert_eq!(head.revision, 1);
        assert_eq!(head.digest, store.digest());
    }

    #[test]
    fn revisions_continue_numbering_across_runs() {
        let fixture = fixture();
        let mut drift = args(&fixture, FEATURECOUNTS_NEW);
        drift.version_drift = true;
        run(drift).expect("first proposal should run");

        let mut vetted = args(&fixture, HTSEQ);
        vetted.judgment = JudgmentSource::Table;
        vetted.equivalence_table = Some(fixture.table.clone());
        run(vetted).expect("second proposal should run");

        let head = RevisionLog::for_gold(&fixture.gold)
            .head()
            .expect("log should read")
            .expect("log should have a head");
        assert_eq!(head.revision, 2);
        assert_eq!(revision_lines(&fixture.gold), 2);

        let store = GoldStore::load(&fixture.gold).expect("gold should reload");
        assert_eq!(
            store.get("rna-1").expect("item should exist").tools,
            vec![FEATURECOUNTS_NEW, FEATURECOUNTS_OLD, HTSEQ]
        );
    }

    #[test]
    fn rejection_leaves_gold_file_untouched() {
        let fixture = fixture();
        let before = fs::read(&fixture.gold).expect("gold should read");

        run(args(&fixture, "toolshed.g2.bx.psu.edu/repos/iuc/missing/missing/1.0"))
            .expect("rejection is not an error");
        let mut mismatch = args(&fixture, HTSEQ);
        mismatch.intent_mismatch = true;
        run(mismatch).expect("rejection is not an error");

        assert_eq!(fs::read(&fixture.gold).expect("gold should read"), before);
        assert_eq!(revision_lines(&fixture.gold), 0);
    }

    #[test]
    fn failed_revision_append_restores_the_gold_file() {
        let fixture = fixture();
        let before = fs::read(&fixture.gold).expect("gold should read");

        let mut drift = args(&fixture, FEATURECOUNTS_NEW);
        drift.version_drift = true;
        // a log path below a regular file cannot be created
        drift.revision_log = Some(fixture.gold.join("revisions.jsonl"));

        let err = run(drift).expect_err("unwritable log should fail the commit");
        assert!(err.to_string().contains("was not recorded"));
        assert_eq!(fs::read(&fixture.gold).expect("gold should read"), before);
    }

    #[test]
    fn unknown_item_id_is_an_error() {
        let fixture = fixture();
        let mut unknown = args(&fixture, HTSEQ);
        unknown.item_id = "nope".to_string();
        assert!(run(unknown).is_err());
    }

    #[test]
    fn human_flags_map_to_a_judgment() {
        let fixture = fixture();
        let mut raw = args(&fixture, &format!("  {HTSEQ} "));
        raw.intent_mismatch = true;

        let proposal = proposal_from_args(&raw);
        assert_eq!(proposal.candidate, HTSEQ);
        assert_eq!(proposal.kind, ExpansionKind::Alternative);
        assert_eq!(
            proposal.judgment,
            EquivalenceJudgment::HumanJudgment {
                reviewer: "curator".to_string(),
                same_intent: false,
                note: "same counting step".to_string(),
            }
        );
    }
}
