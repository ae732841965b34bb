//! Run summary files and their CSV roll-up.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ledger::{LedgerSummary, TradeLedger};
use crate::types::Trade;

pub const CSV_COLUMNS: [&str; 7] = [
    "file",
    "timestamp",
    "count_open",
    "count_closed",
    "total_realized",
    "total_fees",
    "net",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// UTC, `%Y%m%dT%H%M%SZ`
    pub timestamp: String,
    pub config_path: Option<String>,
    pub summary: LedgerSummary,
    pub trades: Vec<Trade>,
}

impl RunReport {
    pub fn new(at: DateTime<Utc>, config_path: Option<String>, ledger: &TradeLedger) -> Self {
        Self {
            timestamp: at.format("%Y%m%dT%H%M%SZ").to_string(),
            config_path,
            summary: ledger.summary(),
            trades: ledger.trades().to_vec(),
        }
    }

    pub fn file_name(&self) -> String {
        format!("summary_{}.json", self.timestamp)
    }

    pub fn write_to(&self, dir: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        let path = dir.join(self.file_name());
        let s = serde_json::to_string_pretty(self)?;
        fs::write(&path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }
}

/// One CSV row. Cells stay empty when a summary file lacks the field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SummaryRow {
    pub file: String,
    pub cells: Vec<String>,
}

fn cell(v: Option<&Value>) -> String {
    match v {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

impl SummaryRow {
    pub fn from_json(file: &str, doc: &Value) -> Self {
        let summary = doc.get("summary");
        let mut cells = vec![file.to_string(), cell(doc.get("timestamp"))];
        for key in &CSV_COLUMNS[2..] {
            cells.push(cell(summary.and_then(|s| s.get(*key))));
        }
        Self {
            file: file.to_string(),
            cells,
        }
    }
}

/// Read every `summary_*.json` in `dir`, sorted by file name.
pub fn collect_rows(dir: impl AsRef<Path>) -> anyhow::Result<Vec<SummaryRow>> {
    let dir = dir.as_ref();
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let path = entry.with_context(|| format!("read entry in {}", dir.display()))?.path();
        let is_summary = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("summary_") && n.ends_with(".json"));
        if is_summary {
            files.push(path);
        }
    }
    files.sort();

    let mut rows = Vec::with_capacity(files.len());
    for path in files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let text = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        let doc: Value =
            serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
        rows.push(SummaryRow::from_json(&name, &doc));
    }
    Ok(rows)
}

/// Header plus one record per row.
pub fn write_csv<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[SummaryRow]) -> anyhow::Result<()> {
    wtr.write_record(CSV_COLUMNS)?;
    for row in rows {
        wtr.write_record(&row.cells)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `<dir>/summaries.csv` from the summary files in `dir`.
pub fn aggregate_dir(dir: impl AsRef<Path>) -> anyhow::Result<(PathBuf, usize)> {
    let dir = dir.as_ref();
    let rows = collect_rows(dir)?;
    let out = dir.join("summaries.csv");
    let mut wtr = csv::Writer::from_path(&out).with_context(|| format!("create {}", out.display()))?;
    write_csv(&mut wtr, &rows).with_context(|| format!("write {}", out.display()))?;
    Ok((out, rows.len()))
}
