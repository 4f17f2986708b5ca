use super::*;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "before", "by", "can", "data", "dataset", "do",
    "for", "from", "have", "how", "i", "in", "into", "is", "it", "need", "of", "on", "or", "run",
    "should", "that", "the", "this", "to", "tool", "use", "using", "what", "which", "with",
];

pub fn tokenize(text: &str) -> Vec<String> {
    text.to_ascii_lowercase()
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|token| token.len() >= 2)
        .filter(|token| STOPWORDS.iter().all(|stopword| stopword != token))
        .map(str::to_string)
        .collect()
}

fn tool_text(entry: &CatalogEntry) -> String {
    format!("{} {} {}", entry.tool_id, entry.name, entry.description)
}

pub struct LexicalIndex<'a> {
    tools: &'a [CatalogEntry],
    postings: HashMap<String, Vec<usize>>,
    idf: HashMap<String, f64>,
}

impl<'a> LexicalIndex<'a> {
    pub fn build(tools: &'a [CatalogEntry]) -> Self {
        let mut postings: HashMap<String, Vec<usize>> = HashMap::new();
        for (position, tool) in tools.iter().enumerate() {
            let tokens = tokenize(&tool_text(tool))
                .into_iter()
                .collect::<HashSet<String>>();
            for token in tokens {
                postings.entry(token).or_default().push(position);
            }
        }

        let tool_count = tools.len().max(1) as f64;
        let idf = postings
            .iter()
            .map(|(token, positions)| {
                let weight = 1.0 + ((tool_count + 1.0) / (positions.len() as f64 + 1.0)).ln();
                (token.clone(), weight)
            })
            .collect();

        Self {
            tools,
            postings,
            idf,
        }
    }

    pub fn select(&self, query: &str, candidate_k: usize) -> Vec<&'a CatalogEntry> {
        let mut scores: HashMap<usize, f64> = HashMap::new();
        for token in tokenize(query) {
            let Some(positions) = self.postings.get(&token) else {
                continue;
            };
            let weight = self.idf.get(&token).copied().unwrap_or(1.0);
            for position in positions {
                *scores.entry(*position).or_insert(0.0) += weight;
            }
        }

        if scores.is_empty() {
            return self.tools.iter().take(candidate_k).collect();
        }

        let mut ranked = scores.into_iter().collect::<Vec<(usize, f64)>>();
        ranked.sort_by(|left, right| right.1.total_cmp(&left.1).then(left.0.cmp(&right.0)));
        ranked
            .into_iter()
            .take(candidate_k)
            .map(|(position, _)| &self.tools[position])
            .collect()
    }
}
