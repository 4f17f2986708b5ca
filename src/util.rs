use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_directory(parent),
        _ => Ok(()),
    }
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];

    loop {
        let count = file
            .read(&mut buf)
            .with_context(|| format!("failed to read file for hashing: {}", path.display()))?;
        if count == 0 {
            break;
        }
        hasher.update(&buf[..count]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

pub fn sha256_bytes(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;

    let data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;

    let mut file = File::create(path)
        .with_context(|| format!("failed to create json file: {}", path.display()))?;
    file.write_all(&data)
        .with_context(|| format!("failed to write json file: {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("failed to finalize json file: {}", path.display()))?;

    Ok(())
}

pub fn print_json_pretty<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render json")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}").context("failed to write json to stdout")?;
    Ok(())
}

#[derive(Debug)]
pub struct JsonlLine {
    pub line: usize,
    pub value: std::result::Result<Value, String>,
}

pub fn read_jsonl(path: &Path) -> Result<Vec<JsonlLine>> {
    let file =
        File::open(path).with_context(|| format!("failed to open jsonl: {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut lines = Vec::new();
    for (index, raw) in reader.lines().enumerate() {
        let raw = raw.with_context(|| {
            format!("failed to read line {} of {}", index + 1, path.display())
        })?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        lines.push(JsonlLine {
            line: index + 1,
            value: serde_json::from_str(trimmed).map_err(|err| err.to_string()),
        });
    }

    Ok(lines)
}

pub fn write_jsonl<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    ensure_parent(path)?;

    let mut file = File::create(path)
        .with_context(|| format!("failed to create jsonl file: {}", path.display()))?;
    for record in records {
        let line = serde_json::to_string(record)
            .with_context(|| format!("failed to serialize record for {}", path.display()))?;
        writeln!(file, "{line}")
            .with_context(|| format!("failed to write jsonl file: {}", path.display()))?;
    }

    Ok(())
}

pub fn append_jsonl<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    ensure_parent(path)?;

    let line = serde_json::to_string(record)
        .with_context(|| format!("failed to serialize record for {}", path.display()))?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open jsonl for append: {}", path.display()))?;
    writeln!(file, "{line}")
        .with_context(|| format!("failed to append to {}", path.display()))?;

    Ok(())
}

pub fn parse_flag(value: Option<&str>) -> Option<bool> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    Some(matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    ))
}
