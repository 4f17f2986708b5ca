use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "toolbench",
    version,
    about = "Tool-recommendation benchmark curation and retrieval evaluation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Evaluate(EvaluateArgs),
    Catalog(CatalogArgs),
    Expand(ExpandArgs),
    Validate(ValidateArgs),
    Predict(PredictArgs),
    Summary(SummaryArgs),
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    #[arg(long, default_value = "data/benchmark/v1_items.jsonl")]
    pub gold: PathBuf,

    #[arg(long)]
    pub predictions: PathBuf,

    #[arg(long)]
    pub k: Option<String>,

    #[arg(long, default_value_t = false)]
    pub normalize_tools: bool,

    #[arg(long)]
    pub output_metrics: Option<PathBuf>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CatalogArgs {
    #[arg(long, default_value = "data/tool_catalog/usegalaxy_org_tools.jsonl")]
    pub catalog: PathBuf,

    #[arg(long, default_value = "data/tool_catalog/usegalaxy_org_index.json")]
    pub index_path: PathBuf,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum JudgmentSource {
    Human,
    Table,
}

impl JudgmentSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Table => "table",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ExpandArgs {
    #[arg(long, default_value = "data/benchmark/v1_items.jsonl")]
    pub gold: PathBuf,

    #[arg(long, default_value = "data/tool_catalog/usegalaxy_org_tools.jsonl")]
    pub catalog: PathBuf,

    #[arg(long)]
    pub item_id: String,

    #[arg(long)]
    pub candidate: String,

    #[arg(long, value_enum, default_value_t = JudgmentSource::Human)]
    pub judgment: JudgmentSource,

    #[arg(long, default_value = "")]
    pub reviewer: String,

    #[arg(long, default_value = "")]
    pub note: String,

    #[arg(long, default_value_t = false)]
    pub intent_mismatch: bool,

    #[arg(long)]
    pub equivalence_table: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub version_drift: bool,

    #[arg(long)]
    pub revision_log: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(long, default_value = "data/benchmark/v1_items.jsonl")]
    pub gold: PathBuf,

    #[arg(long, default_value = "data/tool_catalog/usegalaxy_org_tools.jsonl")]
    pub catalog: PathBuf,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum PredictAgent {
    Oracle,
    Lexical,
    Replies,
}

impl PredictAgent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Oracle => "oracle",
            Self::Lexical => "lexical",
            Self::Replies => "replies",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    #[arg(long, default_value = "data/benchmark/v1_items.jsonl")]
    pub gold: PathBuf,

    #[arg(long, default_value = "data/tool_catalog/usegalaxy_org_tools.jsonl")]
    pub catalog: PathBuf,

    #[arg(long, default_value = "tmp_stats/v1_predictions.jsonl")]
    pub output_predictions: PathBuf,

    #[arg(long, value_enum, default_value_t = PredictAgent::Lexical)]
    pub agent: PredictAgent,

    #[arg(long)]
    pub replies: Option<PathBuf>,

    #[arg(long, default_value_t = 10)]
    pub top_k: usize,

    #[arg(long, default_value_t = 50)]
    pub candidate_k: usize,

    #[arg(long)]
    pub max_queries: Option<usize>,

    #[arg(long, default_value_t = false)]
    pub skip_existing: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SummaryArgs {
    #[arg(long, default_value = "data/benchmark/v1_items.jsonl")]
    pub gold: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,
}
