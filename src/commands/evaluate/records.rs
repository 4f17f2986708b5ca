use super::*;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    InvalidJson,
    MissingId,
    MissingTools,
    MalformedPredictions,
    NonStringPrediction,
    DuplicatePredictionId,
    UnknownPredictionId,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordWarning {
    pub source: &'static str,
    pub line: usize,
    pub id: Option<String>,
    pub kind: WarningKind,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct GoldFile {
    pub queries: Vec<GoldQuery>,
    pub warnings: Vec<RecordWarning>,
}

#[derive(Debug, Default)]
pub struct PredictionFile {
    pub by_id: HashMap<String, Vec<String>>,
    pub lines: HashMap<String, usize>,
    // ids whose only record had unusable `predictions`; left out of scoring
    pub excluded: BTreeSet<String>,
    pub warnings: Vec<RecordWarning>,
}

fn record_id(value: &Value) -> Option<String> {
    value
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.trim().is_empty())
        .map(str::to_string)
}

pub fn load_gold(path: &Path) -> Result<GoldFile> {
    if !path.exists() {
        bail!("gold file not found: {}", path.display());
    }

    let mut gold = GoldFile::default();
    let mut first_lines: HashMap<String, usize> = HashMap::new();

    for line in read_jsonl(path)? {
        let value = match line.value {
            Ok(value) => value,
            Err(err) => {
                gold.warnings.push(RecordWarning {
                    source: GOLD_SOURCE,
                    line: line.line,
                    id: None,
                    kind: WarningKind::InvalidJson,
                    message: err,
                });
                continue;
            }
        };

        let Some(id) = record_id(&value) else {
            gold.warnings.push(RecordWarning {
                source: GOLD_SOURCE,
                line: line.line,
                id: None,
                kind: WarningKind::MissingId,
                message: "record has no string `id`".to_string(),
            });
            continue;
        };

        if let Some(first_line) = first_lines.get(&id) {
            return Err(DataIntegrityError::DuplicateId {
                id,
                line: line.line,
                first_line: *first_line,
            }
            .into());
        }

        let tools = match read_tools(&value) {
            ToolsField::Strings(tools) => tools,
            ToolsField::Missing => {
                gold.warnings.push(RecordWarning {
                    source: GOLD_SOURCE,
                    line: line.line,
                    id: Some(id.clone()),
                    kind: WarningKind::MissingTools,
                    message: "record has no `tools`; scored as empty gold".to_string(),
                });
                Vec::new()
            }
            ToolsField::Malformed => {
                return Err(DataIntegrityError::MalformedTools { id, line: line.line }.into());
            }
        };

        first_lines.insert(id.clone(), line.line);
        gold.queries.push(GoldQuery { id, tools });
    }

    if gold.queries.is_empty() {
        return Err(DataIntegrityError::EmptyGold {
            path: path.display().to_string(),
        }
        .into());
    }

    Ok(gold)
}

pub fn load_predictions(path: &Path) -> Result<PredictionFile> {
    if !path.exists() {
        bail!("predictions file not found: {}", path.display());
    }

    let mut file = PredictionFile::default();
    for line in read_jsonl(path)? {
        let value = match line.value {
            Ok(value) => value,
            Err(err) => {
                file.warnings.push(RecordWarning {
                    source: PREDICTIONS_SOURCE,
                    line: line.line,
                    id: None,
                    kind: WarningKind::InvalidJson,
                    message: err,
                });
                continue;
            }
        };

        let Some(id) = record_id(&value) else {
            file.warnings.push(RecordWarning {
                source: PREDICTIONS_SOURCE,
                line: line.line,
                id: None,
                kind: WarningKind::MissingId,
                message: "record has no string `id`".to_string(),
            });
            continue;
        };

        let Some(raw) = value.get("predictions").and_then(Value::as_array) else {
            file.warnings.push(RecordWarning {
                source: PREDICTIONS_SOURCE,
                line: line.line,
                id: Some(id.clone()),
                kind: WarningKind::MalformedPredictions,
                message: "`predictions` is missing or not a list".to_string(),
            });
            if !file.by_id.contains_key(&id) {
                file.excluded.insert(id);
            }
            continue;
        };

        let predictions = raw
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect::<Vec<String>>();
        if predictions.len() != raw.len() {
            file.warnings.push(RecordWarning {
                source: PREDICTIONS_SOURCE,
                line: line.line,
                id: Some(id.clone()),
                kind: WarningKind::NonStringPrediction,
                message: format!(
                    "dropped {} non-string prediction(s)",
                    raw.len() - predictions.len()
                ),
            });
        }

        file.excluded.remove(&id);
        if let Some(previous_line) = file.lines.insert(id.clone(), line.line) {
            file.warnings.push(RecordWarning {
                source: PREDICTIONS_SOURCE,
                line: line.line,
                id: Some(id.clone()),
                kind: WarningKind::DuplicatePredictionId,
                message: format!("replaces predictions from line {previous_line}"),
            });
        }
        file.by_id.insert(id, predictions);
    }

    Ok(file)
}

pub fn unknown_prediction_warnings(gold: &GoldFile, predictions: &PredictionFile) -> Vec<RecordWarning> {
    let gold_ids = gold
        .queries
        .iter()
        .map(|query| query.id.as_str())
        .collect::<HashSet<&str>>();

    let mut warnings = predictions
        .lines
        .iter()
        .filter(|(id, _)| !gold_ids.contains(id.as_str()))
        .map(|(id, line)| RecordWarning {
            source: PREDICTIONS_SOURCE,
            line: *line,
            id: Some(id.clone()),
            kind: WarningKind::UnknownPredictionId,
            message: "no gold record with this id; ignored".to_string(),
        })
        .collect::<Vec<RecordWarning>>();
    warnings.sort_by_key(|warning| warning.line);
    warnings
}
