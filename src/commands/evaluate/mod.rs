use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use crate::cli::EvaluateArgs;
use crate::error::DataIntegrityError;
use crate::store::{ToolsField, read_tools};
use crate::tool_id::{self, NormalizeMode, ToolIdShape, unique_in_order};
use crate::util::{
    now_utc_string, parse_flag, print_json_pretty, read_jsonl, sha256_file, write_json_pretty,
};

const GOLD_SOURCE: &str = "gold";
const PREDICTIONS_SOURCE: &str = "predictions";

mod metrics;
mod records;
mod report;
mod run;

use self::metrics::*;
use self::records::*;
use self::report::*;

pub(crate) use self::run::run;
