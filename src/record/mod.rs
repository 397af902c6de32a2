pub mod build;
pub mod resolve;
pub mod sections;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

pub use build::build_record;

/// Canonical, fully populated representation of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: String,
    pub url: String,
    pub title: String,
    pub page_type: String,
    pub scores: Scores,
    pub readability: Readability,
    pub structure: Vec<Value>,
    pub images: Vec<Value>,
    pub links: Vec<Value>,
    pub word_count: Option<Number>,
    pub reading_time_minutes: Option<Number>,
    pub sections: Vec<Section>,
    pub raw_markdown: String,
    pub recommendations: Vec<String>,
    pub related_pages: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub quality: Option<Number>,
    pub readability: Option<Number>,
    pub seo: Option<Number>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Readability {
    pub flesch: Option<Number>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub label: String,
    pub text: String,
}

impl Section {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}
