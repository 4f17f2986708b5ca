use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::catalog::load_catalog;
use crate::cli::{PredictAgent, PredictArgs};
use crate::model::{BenchmarkItem, CatalogEntry, PredictionRecord};
use crate::store::GoldStore;
use crate::tool_id::unique_in_order;
use crate::util::{append_jsonl, read_jsonl};

mod extract;
mod lexical;
mod run;

use self::extract::*;
use self::lexical::*;

pub(crate) use self::run::run;
