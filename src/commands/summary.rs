use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::cli::SummaryArgs;
use crate::expansion::is_expanded;
use crate::model::BenchmarkItem;
use crate::store::GoldStore;
use crate::util::{now_utc_string, print_json_pretty, write_json_pretty};

const UNCATEGORIZED_TOPIC: &str = "uncategorized";
const UNASSIGNED_TUTORIAL: &str = "unassigned";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolFrequency {
    pub tool_id: String,
    pub queries: usize,
}

#[derive(Debug, Serialize)]
pub struct BenchmarkSummary {
    pub generated_at: String,
    pub source: String,
    pub store_digest: String,
    pub total_queries: usize,
    pub tutorials: usize,
    pub counts_per_tutorial: BTreeMap<String, usize>,
    pub tools_per_topic: BTreeMap<String, BTreeSet<String>>,
    pub tool_frequencies: Vec<ToolFrequency>,
    pub expanded_items: usize,
}

pub fn run(args: SummaryArgs) -> Result<()> {
    let store = GoldStore::load(&args.gold)?;
    let summary = summarize(store.items(), &args.gold, store.digest());

    info!(
        queries = summary.total_queries,
        tutorials = summary.tutorials,
        topics = summary.tools_per_topic.len(),
        distinct_tools = summary.tool_frequencies.len(),
        expanded = summary.expanded_items,
        "summary completed"
    );

    match &args.output {
        Some(path) => {
            write_json_pretty(path, &summary)?;
            info!(path = %path.display(), "wrote benchmark summary");
            Ok(())
        }
        None => print_json_pretty(&summary),
    }
}

pub fn summarize(items: &[BenchmarkItem], source: &Path, digest: &str) -> BenchmarkSummary {
    let mut counts_per_tutorial: BTreeMap<String, usize> = BTreeMap::new();
    let mut tools_per_topic: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut tool_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut expanded_items = 0;

    for item in items {
        let tutorial = item
            .tutorial_id
            .as_deref()
            .filter(|tutorial| !tutorial.trim().is_empty())
            .unwrap_or(UNASSIGNED_TUTORIAL);
        *counts_per_tutorial.entry(tutorial.to_string()).or_insert(0) += 1;

        let topic = item.topic().unwrap_or(UNCATEGORIZED_TOPIC);
        let distinct = item
            .tools
            .iter()
            .map(|tool| tool.trim())
            .filter(|tool| !tool.is_empty())
            .collect::<BTreeSet<&str>>();
        for tool in distinct {
            tools_per_topic
                .entry(topic.to_string())
                .or_default()
                .insert(tool.to_string());
            *tool_counts.entry(tool.to_string()).or_insert(0) += 1;
        }

        if is_expanded(&item.metadata) {
            expanded_items += 1;
        }
    }

    let mut tool_frequencies = tool_counts
        .into_iter()
        .map(|(tool_id, queries)| ToolFrequency { tool_id, queries })
        .collect::<Vec<ToolFrequency>>();
    // BTreeMap order already breaks ties by id; the sort is stable
    tool_frequencies.sort_by(|left, right| right.queries.cmp(&left.queries));

    BenchmarkSummary {
        generated_at: now_utc_string(),
        source: source.display().to_string(),
        store_digest: digest.to_string(),
        total_queries: items.len(),
        tutorials: counts_per_tutorial.len(),
        counts_per_tutorial,
        tools_per_topic,
        tool_frequencies,
        expanded_items,
    }
}
