use super::*;

pub struct ReplyExtractor {
    object: Regex,
}

impl ReplyExtractor {
    pub fn new() -> Result<Self> {
        let object = Regex::new(r"(?s)\{.*\}").context("failed to compile reply object regex")?;
        Ok(Self { object })
    }

    pub fn extract_predictions(&self, content: &str, top_k: usize) -> Result<Vec<String>> {
        let payload: Value = match serde_json::from_str(content) {
            Ok(payload) => payload,
            Err(err) => {
                let Some(found) = self.object.find(content) else {
                    return Err(err).context("reply contains no json object");
                };
                serde_json::from_str(found.as_str()).context("reply json object does not parse")?
            }
        };

        let Some(object) = payload.as_object() else {
            bail!("reply json is not an object");
        };
        let listed = [object.get("predictions"), object.get("tools")]
            .into_iter()
            .flatten()
            .find(|value| is_truthy(value));
        let Some(listed) = listed else {
            return Ok(Vec::new());
        };
        let Some(values) = listed.as_array() else {
            bail!("`predictions` value must be a list");
        };

        let mut output = unique_in_order(values.iter().filter_map(Value::as_str));
        output.truncate(top_k);
        Ok(output)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|number| number != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(values) => !values.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

pub fn load_replies(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        bail!("replies file not found: {}", path.display());
    }

    let mut replies = HashMap::new();
    for line in read_jsonl(path)? {
        let value = match line.value {
            Ok(value) => value,
            Err(err) => {
                warn!(line = line.line, error = %err, "skipping unparsable reply line");
                continue;
            }
        };
        let id = value.get("id").and_then(Value::as_str);
        let content = value.get("content").and_then(Value::as_str);
        match (id, content) {
            (Some(id), Some(content)) => {
                replies.insert(id.to_string(), content.to_string());
            }
            _ => warn!(line = line.line, "skipping reply line without id/content"),
        }
    }

    info!(path = %path.display(), replies = replies.len(), "loaded model replies");
    Ok(replies)
}
