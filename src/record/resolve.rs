//! Per-field precedence chains.
//!
//! Each record field is resolved by walking an ordered list of candidate
//! sources; the first one yielding a present value wins. Field-specific
//! defaults are applied by the caller when the whole chain comes up empty.

use serde_json::Value;

use crate::loader::ArtifactKind::{self, Analysis, Classification, Metadata, Metrics};
use crate::markdown;
use crate::value::is_present;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    /// A top-level key of one artifact.
    Field(ArtifactKind, &'static str),
    /// First `#`/`##` heading of the page body.
    MarkdownHeading,
    /// The page id itself.
    PageId,
}

/// Everything a chain may consult for one page.
#[derive(Debug, Clone, Copy)]
pub struct Sources<'a> {
    pub page_id: &'a str,
    pub markdown: &'a str,
    pub metadata: &'a Value,
    pub analysis: &'a Value,
    pub metrics: &'a Value,
    pub classification: &'a Value,
    pub sections: &'a Value,
}

impl<'a> Sources<'a> {
    pub fn artifact(&self, kind: ArtifactKind) -> &'a Value {
        match kind {
            Metadata => self.metadata,
            Analysis => self.analysis,
            Metrics => self.metrics,
            Classification => self.classification,
            ArtifactKind::Sections => self.sections,
        }
    }

    fn candidate(&self, candidate: Candidate) -> Option<Value> {
        match candidate {
            Candidate::Field(kind, key) => self.artifact(kind).get(key).cloned(),
            Candidate::MarkdownHeading => markdown::guess_title(self.markdown).map(Value::String),
            Candidate::PageId => Some(Value::String(self.page_id.to_string())),
        }
    }
}

/// Walk `chain` in order and return the first present value.
pub fn resolve(chain: &[Candidate], sources: &Sources) -> Option<Value> {
    chain
        .iter()
        .filter_map(|c| sources.candidate(*c))
        .find(is_present)
}

pub const URL: &[Candidate] = &[Candidate::Field(Metadata, "url"), Candidate::Field(Analysis, "url")];

pub const TITLE: &[Candidate] = &[
    Candidate::Field(Metadata, "title"),
    Candidate::Field(Analysis, "title"),
    Candidate::MarkdownHeading,
    Candidate::PageId,
];

pub const PAGE_TYPE: &[Candidate] = &[
    Candidate::Field(Classification, "page_type"),
    Candidate::Field(Analysis, "page_type"),
];

pub const QUALITY: &[Candidate] = &[
    Candidate::Field(Metrics, "quality"),
    Candidate::Field(Analysis, "quality_score"),
];

pub const READABILITY: &[Candidate] = &[
    Candidate::Field(Metrics, "readability"),
    Candidate::Field(Analysis, "readability"),
];

pub const SEO: &[Candidate] = &[Candidate::Field(Metrics, "seo"), Candidate::Field(Analysis, "seo_score")];

pub const FLESCH: &[Candidate] = &[
    Candidate::Field(Metrics, "flesch"),
    Candidate::Field(Analysis, "flesch_score"),
];

pub const IMAGES: &[Candidate] = &[Candidate::Field(Metadata, "images")];
pub const LINKS: &[Candidate] = &[Candidate::Field(Metadata, "links")];
pub const WORD_COUNT: &[Candidate] = &[Candidate::Field(Metadata, "word_count")];
pub const READING_TIME: &[Candidate] = &[Candidate::Field(Metadata, "reading_time_minutes")];
pub const RECOMMENDATIONS: &[Candidate] = &[Candidate::Field(Analysis, "recommendations")];
pub const RELATED_PAGES: &[Candidate] = &[Candidate::Field(Analysis, "related_pages")];

// ── Tests ──
