use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;

pub const TOOLSHED_AUTHORITY: &str = "toolshed.g2.bx.psu.edu";
const INTERACTIVE_PREFIX: &str = "interactive_tool_";
const INTERNAL_MARKER: &str = "__";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolIdShape {
    Guid,
    Internal,
    Interactive,
    Legacy,
    Unrecognized,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum NormalizeMode {
    #[default]
    Raw,
    Base,
}

impl NormalizeMode {
    pub fn from_flag(normalize: bool) -> Self {
        if normalize { Self::Base } else { Self::Raw }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Base => "base",
        }
    }
}

pub fn classify(tool_id: &str) -> ToolIdShape {
    if tool_id.is_empty() || tool_id.chars().any(char::is_whitespace) {
        return ToolIdShape::Unrecognized;
    }

    if let Some((prefix, last)) = tool_id.rsplit_once('/') {
        if prefix.is_empty() || last.is_empty() {
            return ToolIdShape::Unrecognized;
        }
        return ToolIdShape::Guid;
    }

    if tool_id.len() > INTERNAL_MARKER.len() * 2
        && tool_id.starts_with(INTERNAL_MARKER)
        && tool_id.ends_with(INTERNAL_MARKER)
    {
        return ToolIdShape::Internal;
    }

    if tool_id.starts_with(INTERACTIVE_PREFIX) && tool_id.len() > INTERACTIVE_PREFIX.len() {
        return ToolIdShape::Interactive;
    }

    if tool_id
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'))
    {
        return ToolIdShape::Legacy;
    }

    ToolIdShape::Unrecognized
}

pub fn base_id(tool_id: &str) -> &str {
    if classify(tool_id) != ToolIdShape::Guid {
        return tool_id;
    }
    match tool_id.rsplit_once('/') {
        Some((prefix, _)) => prefix,
        None => tool_id,
    }
}

pub fn normalize(tool_id: &str, mode: NormalizeMode) -> &str {
    match mode {
        NormalizeMode::Raw => tool_id,
        NormalizeMode::Base => base_id(tool_id),
    }
}

pub fn version_segment(tool_id: &str) -> Option<&str> {
    if classify(tool_id) != ToolIdShape::Guid {
        return None;
    }
    tool_id.rsplit_once('/').map(|(_, version)| version)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolshedGuid<'a> {
    pub authority: &'a str,
    pub owner: &'a str,
    pub repo: &'a str,
    pub tool: &'a str,
    pub version: &'a str,
}

pub fn parse_toolshed_guid(tool_id: &str) -> Option<ToolshedGuid<'_>> {
    let parts = tool_id.split('/').collect::<Vec<&str>>();
    if parts.len() != 6 || parts[1] != "repos" || parts.iter().any(|part| part.is_empty()) {
        return None;
    }

    Some(ToolshedGuid {
        authority: parts[0],
        owner: parts[2],
        repo: parts[3],
        tool: parts[4],
        version: parts[5],
    })
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum VersionPart<'a> {
    Number(u64),
    Text(&'a str),
}

fn version_parts(version: &str) -> Vec<VersionPart<'_>> {
    version
        .split(['.', '_', '+', '-'])
        .map(|part| match part.parse::<u64>() {
            Ok(number) if part.chars().all(|ch| ch.is_ascii_digit()) => VersionPart::Number(number),
            _ => VersionPart::Text(part),
        })
        .collect()
}

pub fn compare_versions(left: &str, right: &str) -> Ordering {
    version_parts(left).cmp(&version_parts(right))
}

pub fn unique_in_order<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut output = Vec::new();
    for value in values {
        let value = value.as_ref();
        if seen.insert(value.to_string()) {
            output.push(value.to_string());
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    const BWA_1: &str = "toolshed.g2.bx.psu.edu/repos/devteam/bwa/bwa_mem/0.7.17.1";

    #[test]
    fn classify_recognizes_each_shape() {
        assert_eq!(classify(BWA_1), ToolIdShape::Guid);
        assert_eq!(classify("t/a/1.0"), ToolIdShape::Guid);
        assert_eq!(classify("__FILTER_FAILED_DATASETS__"), ToolIdShape::Internal);
        assert_eq!(classify("interactive_tool_jupyter_notebook"), ToolIdShape::Interactive);
        assert_eq!(classify("Remove_beginning1"), ToolIdShape::Legacy);
        assert_eq!(classify("Remove beginning1"), ToolIdShape::Unrecognized);
        assert_eq!(classify(""), ToolIdShape::Unrecognized);
        assert_eq!(classify("dangling/"), ToolIdShape::Unrecognized);
    }

    #[test]
    fn base_mode_strips_only_guid_versions() {
        assert_eq!(
            normalize(BWA_1, NormalizeMode::Base),
            "toolshed.g2.bx.psu.edu/repos/devteam/bwa/bwa_mem"
        );
        assert_eq!(normalize("t/a/1.0", NormalizeMode::Base), "t/a");
        assert_eq!(normalize("__UNZIP_COLLECTION__", NormalizeMode::Base), "__UNZIP_COLLECTION__");
        assert_eq!(normalize("Cut1", NormalizeMode::Base), "Cut1");
        assert_eq!(normalize("Remove beginning1", NormalizeMode::Base), "Remove beginning1");
        assert_eq!(normalize("dangling/", NormalizeMode::Base), "dangling/");
    }

    #[test]
    fn raw_mode_is_identity() {
        assert_eq!(normalize(BWA_1, NormalizeMode::Raw), BWA_1);
    }

    #[test]
    fn parse_toolshed_guid_splits_full_form() {
        let guid = parse_toolshed_guid(BWA_1).expect("full guid should parse");
        assert_eq!(guid.authority, TOOLSHED_AUTHORITY);
        assert_eq!(guid.owner, "devteam");
        assert_eq!(guid.repo, "bwa");
        assert_eq!(guid.tool, "bwa_mem");
        assert_eq!(guid.version, "0.7.17.1");
        assert!(parse_toolshed_guid("t/a/1.0").is_none());
        assert_eq!(version_segment("t/a/1.0"), Some("1.0"));
        assert_eq!(version_segment("Cut1"), None);
    }

    #[test]
    fn compare_versions_orders_numerically() {
        assert_eq!(compare_versions("1.10.0", "1.9.2"), Ordering::Greater);
        assert_eq!(compare_versions("2.4+galaxy1", "2.4+galaxy0"), Ordering::Greater);
        assert_eq!(compare_versions("0.7.17.1", "0.7.17"), Ordering::Greater);
        assert_eq!(compare_versions("1.0", "1.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.0", "1.a"), Ordering::Less);
    }

    #[test]
    fn unique_in_order_keeps_first_occurrence() {
        assert_eq!(unique_in_order(["x", "y", "x", "z", "y"]), vec!["x", "y", "z"]);
    }
}
