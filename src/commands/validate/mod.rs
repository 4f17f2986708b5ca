use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{CatalogIndex, load_snapshot};
use crate::cli::ValidateArgs;
use crate::model::BenchmarkItem;
use crate::store::GoldStore;
use crate::tool_id::{self, TOOLSHED_AUTHORITY};
use crate::util::{now_utc_string, print_json_pretty, sha256_file, write_json_pretty};

mod findings;
mod hygiene;
mod run;
mod snapshot;

use self::findings::*;
use self::hygiene::*;
use self::snapshot::*;

pub(crate) use self::run::run;
