use super::*;

pub fn run(args: ValidateArgs) -> Result<()> {
    let report = build_report(&args.gold, &args.catalog)?;

    for (kind, count) in &report.counts {
        info!(check = *kind, count = *count, "validation findings");
    }
    if report.has_errors() {
        warn!(
            items = report.item_count,
            findings = report.findings.len(),
            "validation found errors"
        );
    } else {
        info!(
            items = report.item_count,
            findings = report.findings.len(),
            snapshot_checked = report.snapshot_checked,
            "validation completed"
        );
    }

    match &args.report_path {
        Some(path) => {
            write_json_pretty(path, &report)?;
            info!(path = %path.display(), "wrote validation report");
            Ok(())
        }
        None => print_json_pretty(&report),
    }
}

pub fn build_report(gold_path: &Path, catalog_path: &Path) -> Result<ValidationReport> {
    let store = GoldStore::load(gold_path)?;
    let rules = HygieneRules::new()?;

    let catalog = if catalog_path.exists() {
        Some(load_snapshot(catalog_path)?)
    } else {
        warn!(
            path = %catalog_path.display(),
            "catalog snapshot not found; skipping drift checks"
        );
        None
    };

    let mut findings = Vec::new();
    for item in store.items() {
        findings.extend(duplicate_tools(item));
        findings.extend(rules.check(item));
        if let Some(catalog) = &catalog {
            findings.extend(check_against_snapshot(item, catalog));
        }
    }

    Ok(ValidationReport {
        generated_at: now_utc_string(),
        gold_path: gold_path.display().to_string(),
        gold_sha256: sha256_file(gold_path)?,
        store_digest: store.digest().to_string(),
        item_count: store.len(),
        catalog_path: catalog.as_ref().map(|_| catalog_path.display().to_string()),
        snapshot_checked: catalog.is_some(),
        counts: count_by_kind(&findings),
        findings,
    })
}
