use super::*;

enum Predictor<'a> {
    Oracle,
    Lexical(LexicalIndex<'a>),
    Replies {
        extractor: ReplyExtractor,
        replies: HashMap<String, String>,
    },
}

impl Predictor<'_> {
    fn predict(&self, item: &BenchmarkItem, top_k: usize, candidate_k: usize) -> Option<Vec<String>> {
        match self {
            Self::Oracle => Some(item.tools.clone()),
            Self::Lexical(index) => Some(
                index
                    .select(item.query.trim(), candidate_k)
                    .into_iter()
                    .map(|entry| entry.tool_id.clone())
                    .take(top_k)
                    .collect(),
            ),
            Self::Replies { extractor, replies } => {
                let Some(content) = replies.get(&item.id) else {
                    debug!(id = %item.id, "no recorded reply");
                    return None;
                };
                match extractor.extract_predictions(content, top_k) {
                    Ok(predictions) => Some(predictions),
                    Err(err) => {
                        warn!(id = %item.id, error = %err, "reply could not be parsed");
                        None
                    }
                }
            }
        }
    }
}

pub fn run(args: PredictArgs) -> Result<()> {
    let store = GoldStore::load(&args.gold)?;

    let catalog = match args.agent {
        PredictAgent::Lexical => load_catalog(&args.catalog)?,
        _ => Vec::new(),
    };
    let predictor = match args.agent {
        PredictAgent::Oracle => Predictor::Oracle,
        PredictAgent::Lexical => Predictor::Lexical(LexicalIndex::build(&catalog)),
        PredictAgent::Replies => {
            let path = args
                .replies
                .as_deref()
                .context("--replies is required for the replies agent")?;
            Predictor::Replies {
                extractor: ReplyExtractor::new()?,
                replies: load_replies(path)?,
            }
        }
    };

    let mut existing = if args.skip_existing {
        existing_ids(&args.output_predictions)?
    } else {
        HashSet::new()
    };
    let max_queries = args.max_queries.filter(|max| *max > 0);

    info!(
        agent = args.agent.as_str(),
        items = store.len(),
        existing = existing.len(),
        output = %args.output_predictions.display(),
        "prediction run requested"
    );

    let mut processed = 0usize;
    let mut skipped = 0usize;
    for item in store.items() {
        if args.skip_existing && existing.contains(&item.id) {
            skipped += 1;
            continue;
        }
        if max_queries.is_some_and(|max| processed >= max) {
            break;
        }

        let Some(predictions) = predictor.predict(item, args.top_k, args.candidate_k) else {
            skipped += 1;
            continue;
        };
        let mut predictions = unique_in_order(predictions);
        predictions.truncate(args.top_k);

        append_jsonl(
            &args.output_predictions,
            &PredictionRecord {
                id: item.id.clone(),
                predictions,
            },
        )?;
        existing.insert(item.id.clone());
        processed += 1;
        debug!(id = %item.id, processed, "wrote predictions");
    }

    info!(processed, skipped, "prediction run completed");
    Ok(())
}

pub fn existing_ids(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }

    Ok(read_jsonl(path)?
        .into_iter()
        .filter_map(|line| line.value.ok())
        .filter_map(|value| value.get("id").and_then(Value::as_str).map(str::to_string))
        .collect())
}
