use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::catalog::{CatalogIndex, load_catalog, write_index};
use crate::cli::CatalogArgs;

pub fn run(args: CatalogArgs) -> Result<()> {
    let index = build_index(&args.catalog)?;
    let versioned_bases = multi_version_bases(&index);

    if args.dry_run {
        info!(
            tools = index.tool_count(),
            bases = index.base_count(),
            versioned_bases,
            source = %args.catalog.display(),
            "catalog dry-run complete"
        );
        return Ok(());
    }

    write_index(&args.index_path, &index)?;
    info!(path = %args.index_path.display(), "wrote catalog index");
    info!(
        tools = index.tool_count(),
        bases = index.base_count(),
        versioned_bases,
        "catalog completed"
    );

    Ok(())
}

pub fn build_index(catalog_path: &Path) -> Result<CatalogIndex> {
    let entries = load_catalog(catalog_path)?;
    CatalogIndex::build(&entries)
        .with_context(|| format!("failed to index catalog {}", catalog_path.display()))
}

fn multi_version_bases(index: &CatalogIndex) -> usize {
    index
        .groups()
        .values()
        .filter(|tool_ids| tool_ids.len() > 1)
        .count()
}
