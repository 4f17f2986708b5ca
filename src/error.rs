use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataIntegrityError {
    #[error("duplicate id `{id}` at line {line} (first seen at line {first_line})")]
    DuplicateId {
        id: String,
        line: usize,
        first_line: usize,
    },

    #[error("no benchmark items found in {path}")]
    EmptyGold { path: String },

    #[error("item `{id}` at line {line} has an empty `tools` array")]
    EmptyTools { id: String, line: usize },

    #[error("item `{id}` at line {line}: `tools` must be an array of strings")]
    MalformedTools { id: String, line: usize },

    #[error("catalog lists `{tool_id}` twice with conflicting metadata ({field} differs)")]
    DuplicateEntry { tool_id: String, field: &'static str },
}
