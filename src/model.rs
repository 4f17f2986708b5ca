use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tutorial_id: Option<String>,
    #[serde(default)]
    pub query: String,
    pub tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BenchmarkItem {
    pub fn primary_tool(&self) -> Option<&str> {
        self.tools.first().map(String::as_str)
    }

    pub fn topic(&self) -> Option<&str> {
        self.metadata
            .get("topic")
            .and_then(Value::as_str)
            .filter(|topic| !topic.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub tool_id: String,
    #[serde(default)]
    pub base_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub io: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: String,
    pub predictions: Vec<String>,
}
