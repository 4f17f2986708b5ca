use super::*;

const DATASET_EXTENSIONS: &str = "fastq|fq|fastqsanger|fasta|fa|fna|faa|bam|sam|cram|vcf|bcf|bed|bedgraph|bigwig|bw|gtf|gff|gff3|tabular|tsv|csv|txt|h5ad|h5|loom|mzml|mzxml|raw|sra|zip|tar";

pub struct HygieneRules {
    url: Regex,
    dataset_filename: Regex,
    accession: Regex,
    tutorial: Regex,
}

impl HygieneRules {
    pub fn new() -> Result<Self> {
        let url = Regex::new(r"(?i)\b(?:https?://|ftp://|www\.)\S+")
            .context("failed to compile url regex")?;
        let dataset_filename = Regex::new(&format!(
            r"(?i)\b[\w.-]+\.(?:{DATASET_EXTENSIONS})(?:\.(?:gz|bz2|zip))?\b"
        ))
        .context("failed to compile dataset filename regex")?;
        let accession = Regex::new(
            r"\b(?:SRR|ERR|DRR|SRX|ERX|SRP|ERP|SRS|GSE|GSM|GPL|PRJNA|PRJEB|PRJDB|SAMN|SAMEA)\d{4,}\b",
        )
        .context("failed to compile accession regex")?;
        let tutorial = Regex::new(r"(?i)\btutorials?\b").context("failed to compile tutorial regex")?;

        Ok(Self {
            url,
            dataset_filename,
            accession,
            tutorial,
        })
    }

    pub fn check(&self, item: &BenchmarkItem) -> Vec<Finding> {
        let query = item.query.trim();
        if query.is_empty() {
            return vec![Finding::new(&item.id, FindingKind::EmptyQuery, "query text is empty")];
        }

        let mut findings = Vec::new();
        let mut matched_spans = Vec::new();
        for found in self.url.find_iter(query) {
            matched_spans.push(found.range());
            findings.push(Finding::new(
                &item.id,
                FindingKind::Url,
                format!("query contains a URL: {}", found.as_str()),
            ));
        }
        for found in self.dataset_filename.find_iter(query) {
            // filenames inside a URL are already reported with the URL
            if matched_spans
                .iter()
                .any(|span| span.start <= found.start() && found.end() <= span.end)
            {
                continue;
            }
            findings.push(Finding::new(
                &item.id,
                FindingKind::DatasetFilename,
                format!("query names a dataset file: {}", found.as_str()),
            ));
        }
        for found in self.accession.find_iter(query) {
            findings.push(Finding::new(
                &item.id,
                FindingKind::Accession,
                format!("query contains an accession: {}", found.as_str()),
            ));
        }
        if let Some(found) = self.tutorial.find(query) {
            findings.push(Finding::new(
                &item.id,
                FindingKind::TutorialMention,
                format!("query refers to its source: {}", found.as_str()),
            ));
        }

        findings
    }
}

pub fn duplicate_tools(item: &BenchmarkItem) -> Vec<Finding> {
    let mut seen = HashSet::new();
    item.tools
        .iter()
        .filter(|tool| !seen.insert(tool.as_str()))
        .map(|tool| {
            Finding::new(&item.id, FindingKind::DuplicateTool, "tool listed more than once")
                .for_tool(tool)
        })
        .collect()
}
