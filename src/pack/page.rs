//! Per-page documents: YAML front-matter followed by the page body.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Number, Value};
use tracing::warn;

use crate::loader;
use crate::markdown::title_case;
use crate::record::{PageRecord, Scores, Section};

const SOURCE_HEADING: &str = "## Source Content";
const SECTIONS_HEADING: &str = "## Suggested Sections";
/// Closes the source markdown so the sections list can be found again.
const SOURCE_END: &str = "<!-- end of source content -->";

/// Allow-listed subset of the record that goes into front-matter.
#[derive(Debug, Serialize)]
struct FrontMatter<'a> {
    id: &'a str,
    url: &'a str,
    title: &'a str,
    page_type: &'a str,
    scores: &'a Scores,
    images: &'a [Value],
    links: &'a [Value],
    structure: &'a [Value],
    word_count: &'a Option<Number>,
    reading_time_minutes: &'a Option<Number>,
    recommendations: &'a [String],
}

impl<'a> From<&'a PageRecord> for FrontMatter<'a> {
    fn from(rec: &'a PageRecord) -> Self {
        Self {
            id: &rec.id,
            url: &rec.url,
            title: &rec.title,
            page_type: &rec.page_type,
            scores: &rec.scores,
            images: &rec.images,
            links: &rec.links,
            structure: &rec.structure,
            word_count: &rec.word_count,
            reading_time_minutes: &rec.reading_time_minutes,
            recommendations: &rec.recommendations,
        }
    }
}

pub fn render(rec: &PageRecord) -> Result<String> {
    let front = serde_yaml::to_string(&FrontMatter::from(rec))
        .with_context(|| format!("Failed to serialize front-matter for {}", rec.id))?;

    let mut body: Vec<String> = vec![
        SOURCE_HEADING.to_string(),
        rec.raw_markdown.clone(),
        String::new(),
        SOURCE_END.to_string(),
    ];
    if rec.sections.is_empty() {
        body.push(String::new());
    } else {
        body.push(SECTIONS_HEADING.to_string());
        for s in &rec.sections {
            body.push(format!("### {}\n{}\n", title_case(&s.label), s.text));
        }
    }

    Ok(format!("---\n{}---\n\n{}", front, body.join("\n")))
}

/// Write `<id>.md` into `dir`, replacing any previous version.
pub fn write(dir: &Path, rec: &PageRecord) -> Result<PathBuf> {
    let path = dir.join(format!("{}.md", rec.id));
    std::fs::write(&path, render(rec)?).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// A packaged page read back from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct PageDocument {
    pub front: Value,
    pub body: String,
}

impl PageDocument {
    /// Split off a leading `---` front-matter block. Unparsable front-matter
    /// is logged and treated as empty.
    pub fn parse(text: &str) -> Self {
        if let Some(rest) = text.strip_prefix("---") {
            if let Some(end) = rest.find("\n---") {
                let front = match loader::parse_yaml(&rest[..end]) {
                    Ok(v @ Value::Object(_)) => v,
                    Ok(_) => loader::empty(),
                    Err(e) => {
                        warn!("Ignoring malformed front-matter: {}", e);
                        loader::empty()
                    }
                };
                let body = rest[end + 4..].trim_start_matches('\n').to_string();
                return Self { front, body };
            }
        }
        Self {
            front: loader::empty(),
            body: text.to_string(),
        }
    }

    pub fn front_str(&self, key: &str) -> Option<&str> {
        self.front.get(key).and_then(Value::as_str).filter(|s| !s.trim().is_empty())
    }

    pub fn front_value(&self, key: &str) -> Option<&Value> {
        self.front.get(key).filter(|v| !v.is_null())
    }

    /// Source markdown and suggested sections recovered from the body. A body
    /// not laid out by [`render`] is returned whole with no sections.
    ///
    /// Only the text after the end-of-source marker is read as sections, so a
    /// "Suggested Sections" heading inside the page's own markdown stays part
    /// of the markdown.
    pub fn split_body(&self) -> (String, Vec<Section>) {
        let Some(rest) = self.body.strip_prefix(SOURCE_HEADING) else {
            return (self.body.clone(), Vec::new());
        };
        let rest = rest.strip_prefix('\n').unwrap_or(rest);

        let sections_start = format!("{}\n", SECTIONS_HEADING);
        let split = rest.rmatch_indices(SOURCE_END).find_map(|(idx, _)| {
            let before = rest[..idx].strip_suffix('\n')?;
            let tail = match &rest[idx + SOURCE_END.len()..] {
                "" => "",
                t => t.strip_prefix('\n')?,
            };
            if tail.trim().is_empty() {
                Some((before, ""))
            } else {
                tail.strip_prefix(&sections_start).map(|list| (before, list))
            }
        });

        match split {
            Some((md, list)) => (md.trim_end().to_string(), parse_sections(list)),
            None => (rest.trim_end().to_string(), Vec::new()),
        }
    }
}

fn parse_sections(text: &str) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    for line in text.lines() {
        if let Some(label) = line.strip_prefix("### ") {
            sections.push(Section::new(label.trim(), ""));
        } else if let Some(current) = sections.last_mut() {
            if !current.text.is_empty() {
                current.text.push('\n');
            }
            current.text.push_str(line);
        }
    }
    for s in &mut sections {
        s.text = s.text.trim_end().to_string();
    }
    sections
}

// ── Tests ──
