use super::*;

pub fn check_against_snapshot(item: &BenchmarkItem, catalog: &CatalogIndex) -> Vec<Finding> {
    let mut findings = Vec::new();

    for (position, tool) in item.tools.iter().enumerate() {
        if catalog.exists(tool) {
            continue;
        }

        let alternatives = catalog
            .alternatives_for(tool)
            .into_iter()
            .filter(|candidate| !item.tools.iter().any(|listed| listed == candidate))
            .map(str::to_string)
            .collect::<Vec<String>>();

        let kind = if position == 0 {
            FindingKind::VersionDrift
        } else {
            FindingKind::MissingTool
        };
        let detail = match (kind, alternatives.is_empty()) {
            (FindingKind::VersionDrift, false) => {
                format!("primary tool {} is not installed; other versions are", describe(tool))
            }
            (FindingKind::VersionDrift, true) => format!(
                "primary tool {} is not installed and has no other version",
                describe(tool)
            ),
            _ => format!("accepted alternative {} is not installed", describe(tool)),
        };
        findings.push(
            Finding::new(&item.id, kind, detail)
                .for_tool(tool)
                .with_alternatives(alternatives),
        );

        if let Some(variant) = spelling_variant(tool, catalog) {
            if !item.tools.iter().any(|listed| listed == &variant) {
                findings.push(
                    Finding::new(
                        &item.id,
                        FindingKind::SpellingVariant,
                        "snapshot spells this tool differently; keep both spellings",
                    )
                    .for_tool(tool)
                    .with_alternatives(vec![variant]),
                );
            }
        }
    }

    findings
}

pub fn spelling_variant(tool: &str, catalog: &CatalogIndex) -> Option<String> {
    [tool.replace('_', " "), tool.replace(' ', "_")]
        .into_iter()
        .find(|variant| variant != tool && catalog.exists(variant))
}

fn describe(tool: &str) -> String {
    match tool_id::parse_toolshed_guid(tool) {
        Some(guid) if guid.authority == TOOLSHED_AUTHORITY => {
            format!("{}/{}/{} {}", guid.owner, guid.repo, guid.tool, guid.version)
        }
        Some(guid) => format!(
            "{}:{}/{}/{} {}",
            guid.authority, guid.owner, guid.repo, guid.tool, guid.version
        ),
        None => format!("`{tool}`"),
    }
}
