use super::*;

#[derive(Debug, Serialize)]
pub struct EvaluationReport {
    pub generated_at: String,
    pub gold_path: String,
    pub gold_sha256: String,
    pub predictions_path: String,
    pub predictions_sha256: String,
    pub normalize_mode: &'static str,
    pub cutoffs: Vec<usize>,
    pub metrics: Value,
    pub warning_count: usize,
    pub warnings: Vec<RecordWarning>,
    pub unrecognized_identifiers: Vec<String>,
    pub excluded_ids: Vec<String>,
    pub per_query: Vec<QueryEvaluation>,
}

pub fn build_report(
    gold_path: &Path,
    predictions_path: &Path,
    cutoffs: &[usize],
    evaluation: &Evaluation,
    warnings: &[RecordWarning],
) -> Result<EvaluationReport> {
    Ok(EvaluationReport {
        generated_at: now_utc_string(),
        gold_path: gold_path.display().to_string(),
        gold_sha256: sha256_file(gold_path)?,
        predictions_path: predictions_path.display().to_string(),
        predictions_sha256: sha256_file(predictions_path)?,
        normalize_mode: evaluation.mode.as_str(),
        cutoffs: cutoffs.to_vec(),
        metrics: evaluation.metrics_json(),
        warning_count: warnings.len(),
        warnings: warnings.to_vec(),
        unrecognized_identifiers: evaluation.unrecognized_identifiers.clone(),
        excluded_ids: evaluation.excluded.clone(),
        per_query: evaluation.per_query.clone(),
    })
}

pub fn log_warnings(warnings: &[RecordWarning]) {
    for warning in warnings {
        warn!(
            source = warning.source,
            line = warning.line,
            id = %warning.id.as_deref().unwrap_or_default(),
            kind = ?warning.kind,
            message = %warning.message,
            "record skipped or repaired"
        );
    }
}
