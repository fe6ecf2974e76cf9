use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One form-field question record from the library feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub export_name: String,
    pub key: String,
    pub question: String,
    #[serde(default)]
    pub context: String,
    #[serde(default, alias = "fieldTitle")]
    pub field_title: String,
}

/// Load corpus records from a `.jsonl` file (one record per line) or a JSON
/// array file.
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<QuestionRecord>> {
    let path = path.as_ref();
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    if ext == "jsonl" {
        load_jsonl(path)
    } else {
        load_json(path)
    }
}

fn load_jsonl(path: &Path) -> Result<Vec<QuestionRecord>> {
    let f = File::open(path).with_context(|| format!("open corpus {}", path.display()))?;
    let reader = BufReader::new(f);
    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: QuestionRecord = serde_json::from_str(&line)
            .with_context(|| format!("corpus record at {}:{}", path.display(), line_no + 1))?;
        records.push(record);
    }
    Ok(records)
}

fn load_json(path: &Path) -> Result<Vec<QuestionRecord>> {
    let f = File::open(path).with_context(|| format!("open corpus {}", path.display()))?;
    let reader = BufReader::new(f);
    let records: Vec<QuestionRecord> = serde_json::from_reader(reader)
        .with_context(|| format!("parse corpus {}", path.display()))?;
    Ok(records)
}
