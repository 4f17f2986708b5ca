use super::*;

#[derive(Debug, Clone)]
pub struct GoldQuery {
    pub id: String,
    pub tools: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CutoffScore {
    pub k: usize,
    pub hit: f64,
    pub mrr: f64,
    pub ndcg: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryEvaluation {
    pub id: String,
    pub gold_size: usize,
    pub predicted: usize,
    pub first_hit_rank: Option<usize>,
    pub scores: Vec<CutoffScore>,
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub mode: NormalizeMode,
    pub cutoffs: Vec<CutoffScore>,
    pub query_count: usize,
    pub excluded: Vec<String>,
    pub per_query: Vec<QueryEvaluation>,
    pub unrecognized_identifiers: Vec<String>,
}

impl Evaluation {
    pub fn metrics_json(&self) -> Value {
        let mut output = Map::new();
        for score in &self.cutoffs {
            output.insert(
                score.k.to_string(),
                json!({
                    "hit": score.hit,
                    "mrr": score.mrr,
                    "ndcg": score.ndcg,
                }),
            );
        }
        output.insert("count".to_string(), json!({ "queries": self.query_count }));
        Value::Object(output)
    }
}

pub fn evaluate(
    gold: &[GoldQuery],
    predictions: &PredictionFile,
    cutoffs: &[usize],
    mode: NormalizeMode,
) -> Evaluation {
    let mut totals = vec![(0.0_f64, 0.0_f64, 0.0_f64); cutoffs.len()];
    let mut per_query = Vec::with_capacity(gold.len());
    let mut excluded = Vec::new();
    let mut unrecognized = BTreeSet::new();

    for query in gold {
        if predictions.excluded.contains(&query.id) {
            excluded.push(query.id.clone());
            continue;
        }

        let gold_set = query
            .tools
            .iter()
            .inspect(|tool| note_unrecognized(tool, &mut unrecognized))
            .map(|tool| tool_id::normalize(tool, mode).to_string())
            .collect::<HashSet<String>>();

        let ranked = predictions
            .by_id
            .get(&query.id)
            .map(|raw| {
                unique_in_order(
                    raw.iter()
                        .inspect(|tool| note_unrecognized(tool, &mut unrecognized))
                        .map(|tool| tool_id::normalize(tool, mode)),
                )
            })
            .unwrap_or_default();

        let scores = score_query(&ranked, &gold_set, cutoffs);
        for (total, score) in totals.iter_mut().zip(&scores) {
            total.0 += score.hit;
            total.1 += score.mrr;
            total.2 += score.ndcg;
        }

        per_query.push(QueryEvaluation {
            id: query.id.clone(),
            gold_size: gold_set.len(),
            predicted: ranked.len(),
            first_hit_rank: first_hit_rank(&ranked, &gold_set),
            scores,
        });
    }

    let query_count = per_query.len();
    let cutoff_scores = cutoffs
        .iter()
        .zip(totals)
        .map(|(k, (hit, mrr, ndcg))| CutoffScore {
            k: *k,
            hit: mean_of(hit, query_count),
            mrr: mean_of(mrr, query_count),
            ndcg: mean_of(ndcg, query_count),
        })
        .collect();

    Evaluation {
        mode,
        cutoffs: cutoff_scores,
        query_count,
        excluded,
        per_query,
        unrecognized_identifiers: unrecognized.into_iter().collect(),
    }
}

fn note_unrecognized(tool: &str, unrecognized: &mut BTreeSet<String>) {
    if tool_id::classify(tool) == ToolIdShape::Unrecognized {
        unrecognized.insert(tool.to_string());
    }
}

fn mean_of(total: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    total / count as f64
}

// `ranked` must already be normalized and de-duplicated
pub fn score_query(ranked: &[String], gold: &HashSet<String>, cutoffs: &[usize]) -> Vec<CutoffScore> {
    cutoffs
        .iter()
        .map(|k| CutoffScore {
            k: *k,
            hit: hit_at_k(ranked, gold, *k),
            mrr: reciprocal_rank_at_k(ranked, gold, *k),
            ndcg: ndcg_at_k(ranked, gold, *k),
        })
        .collect()
}

fn first_hit_rank(ranked: &[String], gold: &HashSet<String>) -> Option<usize> {
    ranked
        .iter()
        .position(|tool| gold.contains(tool))
        .map(|index| index + 1)
}

pub fn hit_at_k(ranked: &[String], gold: &HashSet<String>, k: usize) -> f64 {
    if gold.is_empty() {
        return 0.0;
    }
    if ranked.iter().take(k).any(|tool| gold.contains(tool)) {
        1.0
    } else {
        0.0
    }
}

pub fn reciprocal_rank_at_k(ranked: &[String], gold: &HashSet<String>, k: usize) -> f64 {
    if gold.is_empty() {
        return 0.0;
    }

    for (index, tool) in ranked.iter().take(k).enumerate() {
        if gold.contains(tool) {
            return 1.0 / (index as f64 + 1.0);
        }
    }
    0.0
}

pub fn ndcg_at_k(ranked: &[String], gold: &HashSet<String>, k: usize) -> f64 {
    if gold.is_empty() || k == 0 {
        return 0.0;
    }

    let mut dcg = 0.0;
    for (index, tool) in ranked.iter().take(k).enumerate() {
        if gold.contains(tool) {
            let rank = index + 1;
            dcg += 1.0 / ((rank as f64 + 1.0).log2());
        }
    }

    let ideal_hits = gold.len().min(k);
    let mut idcg = 0.0;
    for rank in 1..=ideal_hits {
        idcg += 1.0 / ((rank as f64 + 1.0).log2());
    }
    if idcg <= 0.0 {
        return 0.0;
    }

    dcg / idcg
}
