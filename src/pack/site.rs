//! Aggregate outputs over the whole record set.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Number, Value};

use crate::record::PageRecord;
use crate::value::{is_present, to_text};

pub const PAGE_DELIMITER: &str = "---PAGE---";
pub const SITE_MD: &str = "site.md";
pub const SITE_JSONL: &str = "site.jsonl";
pub const SUMMARY_MD: &str = "summary.md";

/// Aggregate document: header, optional summary, one block per record in
/// input order.
pub fn render_site(records: &[PageRecord], summary: Option<&Value>, generated_at: DateTime<Utc>) -> String {
    let mut lines: Vec<String> = vec![
        "# Site Content Pack".to_string(),
        format!("_Generated: {}_", generated_at.to_rfc3339_opts(SecondsFormat::Micros, true)),
        String::new(),
    ];

    if let Some(summary) = summary {
        let field = |key: &str| summary.get(key).filter(|v| is_present(v)).map(to_text);
        lines.push("## Site Summary".to_string());
        lines.push(format!("- Pages: {}", field("pages").unwrap_or_else(|| records.len().to_string())));
        lines.push(format!("- Avg Quality: {}", field("avg_quality").unwrap_or_else(|| "?".to_string())));
        lines.push(format!("- Notes: {}", field("notes").unwrap_or_default()));
        lines.push(String::new());
    }

    for r in records {
        lines.push(
            [
                PAGE_DELIMITER.to_string(),
                format!("## [{}]({})", r.title, r.url),
                format!(
                    "**Type:** {}  |  **Quality:** {}  |  **SEO:** {}",
                    r.page_type,
                    score(&r.scores.quality),
                    score(&r.scores.seo)
                ),
                String::new(),
                r.raw_markdown.clone(),
                String::new(),
            ]
            .join("\n"),
        );
    }

    lines.join("\n")
}

fn score(n: &Option<Number>) -> String {
    n.as_ref().map(|n| n.to_string()).unwrap_or_else(|| "-".into())
}

pub fn write_site(
    dir: &Path,
    records: &[PageRecord],
    summary: Option<&Value>,
    generated_at: DateTime<Utc>,
) -> Result<PathBuf> {
    let path = dir.join(SITE_MD);
    std::fs::write(&path, render_site(records, summary, generated_at))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Pretty-printed copy of the site summary.
pub fn write_summary(dir: &Path, summary: &Value) -> Result<PathBuf> {
    let path = dir.join(SUMMARY_MD);
    std::fs::write(&path, serde_json::to_string_pretty(summary)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// One full record per line, input order.
pub fn write_jsonl(dir: &Path, records: &[PageRecord]) -> Result<PathBuf> {
    let path = dir.join(SITE_JSONL);
    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for r in records {
        serde_json::to_writer(&mut out, r)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(path)
}

pub fn read_jsonl(path: &Path) -> Result<Vec<PageRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut records = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let rec = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid record", path.display(), i + 1))?;
        records.push(rec);
    }
    Ok(records)
}

// ── Tests ──
