use super::*;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    DuplicateTool,
    EmptyQuery,
    Url,
    DatasetFilename,
    Accession,
    TutorialMention,
    VersionDrift,
    MissingTool,
    SpellingVariant,
}

impl FindingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DuplicateTool => "duplicate_tool",
            Self::EmptyQuery => "empty_query",
            Self::Url => "url",
            Self::DatasetFilename => "dataset_filename",
            Self::Accession => "accession",
            Self::TutorialMention => "tutorial_mention",
            Self::VersionDrift => "version_drift",
            Self::MissingTool => "missing_tool",
            Self::SpellingVariant => "spelling_variant",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::DuplicateTool | Self::EmptyQuery => Severity::Error,
            Self::SpellingVariant => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub item_id: String,
    pub kind: FindingKind,
    pub severity: Severity,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,
}

impl Finding {
    pub fn new(item_id: &str, kind: FindingKind, detail: impl Into<String>) -> Self {
        Self {
            item_id: item_id.to_string(),
            kind,
            severity: kind.severity(),
            detail: detail.into(),
            tool: None,
            alternatives: Vec::new(),
        }
    }

    pub fn for_tool(mut self, tool: &str) -> Self {
        self.tool = Some(tool.to_string());
        self
    }

    pub fn with_alternatives(mut self, alternatives: Vec<String>) -> Self {
        self.alternatives = alternatives;
        self
    }
}

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub generated_at: String,
    pub gold_path: String,
    pub gold_sha256: String,
    pub store_digest: String,
    pub item_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<String>,
    pub snapshot_checked: bool,
    pub counts: BTreeMap<&'static str, usize>,
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        self.findings
            .iter()
            .any(|finding| finding.severity == Severity::Error)
    }
}

pub fn count_by_kind(findings: &[Finding]) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for finding in findings {
        *counts.entry(finding.kind.as_str()).or_insert(0) += 1;
    }
    counts
}
