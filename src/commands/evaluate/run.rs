use super::*;

const DEFAULT_CUTOFFS: &str = "1,3,5,10";
const CUTOFFS_ENV: &str = "TOOLBENCH_CUTOFFS";
const NORMALIZE_ENV: &str = "TOOLBENCH_NORMALIZE_TOOLS";

pub fn run(args: EvaluateArgs) -> Result<()> {
    let cutoffs = resolve_cutoffs(args.k.as_deref())?;
    let mode = resolve_normalize_mode(args.normalize_tools);

    info!(
        gold = %args.gold.display(),
        predictions = %args.predictions.display(),
        cutoffs = ?cutoffs,
        normalize = mode.as_str(),
        "evaluation requested"
    );

    let gold = load_gold(&args.gold)?;
    let predictions = load_predictions(&args.predictions)?;

    let mut warnings = gold.warnings.clone();
    warnings.extend(predictions.warnings.iter().cloned());
    warnings.extend(unknown_prediction_warnings(&gold, &predictions));
    log_warnings(&warnings);

    let evaluation = evaluate(&gold.queries, &predictions, &cutoffs, mode);
    if !evaluation.unrecognized_identifiers.is_empty() {
        info!(
            count = evaluation.unrecognized_identifiers.len(),
            "identifiers with no recognized shape were compared verbatim"
        );
    }

    let metrics = evaluation.metrics_json();
    print_json_pretty(&metrics)?;

    if let Some(path) = &args.output_metrics {
        write_json_pretty(path, &metrics)?;
        info!(path = %path.display(), "wrote metrics");
    }

    if let Some(path) = &args.report_path {
        let report = build_report(&args.gold, &args.predictions, &cutoffs, &evaluation, &warnings)?;
        write_json_pretty(path, &report)?;
        info!(path = %path.display(), "wrote evaluation report");
    }

    info!(
        queries = evaluation.query_count,
        excluded = evaluation.excluded.len(),
        predicted = predictions.by_id.len(),
        warnings = warnings.len(),
        "evaluation completed"
    );

    Ok(())
}

fn resolve_cutoffs(flag: Option<&str>) -> Result<Vec<usize>> {
    select_cutoffs(flag, std::env::var(CUTOFFS_ENV).ok().as_deref())
}

fn resolve_normalize_mode(flag: bool) -> NormalizeMode {
    select_normalize_mode(flag, std::env::var(NORMALIZE_ENV).ok().as_deref())
}

pub fn select_cutoffs(flag: Option<&str>, env: Option<&str>) -> Result<Vec<usize>> {
    let env = env.filter(|value| !value.trim().is_empty());
    parse_cutoffs(flag.or(env).unwrap_or(DEFAULT_CUTOFFS))
}

pub fn select_normalize_mode(flag: bool, env: Option<&str>) -> NormalizeMode {
    NormalizeMode::from_flag(flag || parse_flag(env).unwrap_or(false))
}

pub fn parse_cutoffs(raw: &str) -> Result<Vec<usize>> {
    let mut cutoffs = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let k = part
            .parse::<usize>()
            .with_context(|| format!("invalid cutoff `{part}` in `{raw}`"))?;
        if k == 0 {
            bail!("cutoffs must be positive, got 0 in `{raw}`");
        }
        cutoffs.push(k);
    }

    cutoffs.sort_unstable();
    cutoffs.dedup();
    if cutoffs.is_empty() {
        bail!("no cutoffs given in `{raw}`");
    }
    Ok(cutoffs)
}
