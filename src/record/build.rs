use std::path::Path;

use serde_json::Value;
use tracing::warn;

use super::resolve::{self, Candidate, Sources};
use super::sections::{self, SectionsInput};
use super::{PageRecord, Readability, Scores};
use crate::discover::AnalysisPaths;
use crate::loader;
use crate::markdown;
use crate::value::{as_number, into_sequence, to_text};

const DEFAULT_PAGE_TYPE: &str = "other";

/// Parsed artifacts for one page. Absent kinds are empty mappings.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifacts {
    pub metadata: Value,
    pub analysis: Value,
    pub metrics: Value,
    pub classification: Value,
    pub sections: Value,
}

impl Default for Artifacts {
    fn default() -> Self {
        Self {
            metadata: loader::empty(),
            analysis: loader::empty(),
            metrics: loader::empty(),
            classification: loader::empty(),
            sections: loader::empty(),
        }
    }
}

impl Artifacts {
    pub fn load(metadata: Option<&Path>, paths: &AnalysisPaths) -> Self {
        Self {
            metadata: loader::load_json_or_empty(metadata),
            analysis: loader::load_json_or_empty(paths.analysis.as_deref()),
            metrics: loader::load_json_or_empty(paths.metrics.as_deref()),
            classification: loader::load_json_or_empty(paths.classification.as_deref()),
            sections: loader::load_json_or_empty(paths.sections.as_deref()),
        }
    }
}

/// Read a page's markdown and artifacts from disk and build its record.
/// An unreadable markdown file yields an empty body rather than an error.
pub fn build_record(
    page_id: &str,
    markdown_path: &Path,
    metadata_path: Option<&Path>,
    analysis: &AnalysisPaths,
) -> PageRecord {
    let body = match loader::load_markdown(markdown_path) {
        Ok(md) => md,
        Err(e) => {
            warn!(page = page_id, "Unreadable page body: {}", e);
            String::new()
        }
    };
    let artifacts = Artifacts::load(metadata_path, analysis);
    build_from_artifacts(page_id, &body, &artifacts)
}

/// Pure record construction from already-loaded inputs.
pub fn build_from_artifacts(page_id: &str, markdown_body: &str, artifacts: &Artifacts) -> PageRecord {
    let raw_markdown = markdown::clean(markdown_body);
    let src = Sources {
        page_id,
        markdown: &raw_markdown,
        metadata: &artifacts.metadata,
        analysis: &artifacts.analysis,
        metrics: &artifacts.metrics,
        classification: &artifacts.classification,
        sections: &artifacts.sections,
    };

    let text = |chain: &[Candidate]| resolve::resolve(chain, &src).map(|v| to_text(&v));
    let number = |chain: &[Candidate]| resolve::resolve(chain, &src).as_ref().and_then(as_number);
    let sequence = |chain: &[Candidate]| resolve::resolve(chain, &src).map(into_sequence).unwrap_or_default();

    let input = SectionsInput::from_artifact(&artifacts.sections);
    let (sections, structure) = sections::resolve(&input, &artifacts.analysis);

    PageRecord {
        id: page_id.to_string(),
        url: text(resolve::URL).unwrap_or_default(),
        title: text(resolve::TITLE).unwrap_or_else(|| page_id.to_string()),
        page_type: text(resolve::PAGE_TYPE).unwrap_or_else(|| DEFAULT_PAGE_TYPE.to_string()),
        scores: Scores {
            quality: number(resolve::QUALITY),
            readability: number(resolve::READABILITY),
            seo: number(resolve::SEO),
        },
        readability: Readability {
            flesch: number(resolve::FLESCH),
        },
        structure,
        images: sequence(resolve::IMAGES),
        links: sequence(resolve::LINKS),
        word_count: number(resolve::WORD_COUNT),
        reading_time_minutes: number(resolve::READING_TIME),
        sections,
        recommendations: recommendations(resolve::resolve(resolve::RECOMMENDATIONS, &src)),
        related_pages: sequence(resolve::RELATED_PAGES),
        raw_markdown,
    }
}

/// Mapping entries become `"key: value"`; sequence items are stringified.
fn recommendations(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Object(map)) => map.iter().map(|(k, v)| format!("{}: {}", k, to_text(v))).collect(),
        Some(Value::Array(items)) => items.iter().map(to_text).collect(),
        Some(Value::String(s)) => vec![s],
        _ => Vec::new(),
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Section;
    use serde_json::{json, Number};

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
    }

    #[test]
    fn markdown_only_page_is_fully_defaulted() {
        let rec = build_from_artifacts("home", "# Welcome\n\nHello there.", &Artifacts::default());
        assert_eq!(rec.id, "home");
        assert_eq!(rec.title, "Welcome");
        assert_eq!(rec.url, "");
        assert_eq!(rec.page_type, "other");
        assert_eq!(rec.scores, Scores::default());
        assert_eq!(rec.readability, Readability::default());
        assert!(rec.sections.is_empty());
        assert!(rec.structure.is_empty());
        assert!(rec.images.is_empty());
        assert!(rec.links.is_empty());
        assert!(rec.recommendations.is_empty());
        assert!(rec.related_pages.is_empty());
        assert_eq!(rec.word_count, None);
        assert_eq!(rec.raw_markdown, "# Welcome\n\nHello there.");

        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["scores"], json!({"quality": null, "readability": null, "seo": null}));
    }

    #[test]
    fn title_falls_back_to_page_id() {
        let rec = build_from_artifacts("contact", "Call us today.", &Artifacts::default());
        assert_eq!(rec.title, "contact");
    }

    #[test]
    fn recommendations_mapping_becomes_lines() {
        let artifacts = Artifacts {
            analysis: json!({"recommendations": {"seo": "add alt text", "ux": "shorter forms"}}),
            ..Artifacts::default()
        };
        let rec = build_from_artifacts("p", "", &artifacts);
        assert_eq!(rec.recommendations, vec!["seo: add alt text", "ux: shorter forms"]);
    }

    #[test]
    fn recommendations_sequence_passes_through() {
        let artifacts = Artifacts {
            analysis: json!({"recommendations": ["one", "two"]}),
            ..Artifacts::default()
        };
        let rec = build_from_artifacts("p", "", &artifacts);
        assert_eq!(rec.recommendations, vec!["one", "two"]);
    }

    #[test]
    fn keyed_sections_artifact() {
        let artifacts = Artifacts {
            sections: json!({"sections": [{"name": "intro", "content": "Hi"}]}),
            ..Artifacts::default()
        };
        let rec = build_from_artifacts("p", "", &artifacts);
        assert_eq!(rec.sections, vec![Section::new("intro", "Hi")]);
    }

    #[test]
    fn full_artifact_set_from_fixtures() {
        let artifacts = Artifacts {
            metadata: serde_json::from_str(&fixture("services_metadata.json")).unwrap(),
            analysis: serde_json::from_str(&fixture("services_analysis.json")).unwrap(),
            metrics: serde_json::from_str(&fixture("services_metrics.json")).unwrap(),
            classification: serde_json::from_str(&fixture("services_classification.json")).unwrap(),
            sections: serde_json::from_str(&fixture("services_sections.json")).unwrap(),
        };
        let rec = build_from_artifacts("services", &fixture("services.md"), &artifacts);

        assert_eq!(rec.url, "https://example.com/services");
        assert_eq!(rec.title, "Our Services");
        assert_eq!(rec.page_type, "service");
        assert_eq!(rec.scores.quality, Some(Number::from(82)));
        assert_eq!(rec.scores.seo, Some(Number::from(74)));
        assert_eq!(rec.scores.readability, Some(Number::from(68)));
        assert_eq!(rec.readability.flesch, serde_json::from_str("58.3").ok());
        assert_eq!(rec.word_count, Some(Number::from(412)));
        assert_eq!(rec.images.len(), 2);
        assert_eq!(rec.links.len(), 1);
        assert_eq!(rec.structure, vec![json!({"h1": 1, "h2": 3})]);
        assert_eq!(
            rec.sections,
            vec![
                Section::new("hero", "Repairs that last."),
                Section::new("section", "Same-day service in most areas."),
            ]
        );
        assert_eq!(rec.related_pages, vec![json!("contact"), json!("pricing")]);
        assert!(!rec.raw_markdown.contains("\n\n\n"));
    }

    #[test]
    fn rebuilding_is_byte_identical() {
        let artifacts = Artifacts {
            metadata: json!({"title": "T", "images": [{"src": "a.png"}]}),
            analysis: json!({"recommendations": {"b": 1, "a": 2}, "sections": ["x"]}),
            ..Artifacts::default()
        };
        let a = serde_json::to_string(&build_from_artifacts("p", "body\n\n\n\ntext", &artifacts)).unwrap();
        let b = serde_json::to_string(&build_from_artifacts("p", "body\n\n\n\ntext", &artifacts)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_files_on_disk_still_build() {
        let dir = tempfile::tempdir().unwrap();
        let md = dir.path().join("home.md");
        std::fs::write(&md, "# Welcome\n").unwrap();
        let bad = dir.path().join("home_analysis.json");
        std::fs::write(&bad, "{{{").unwrap();

        let paths = AnalysisPaths {
            analysis: Some(bad),
            metrics: Some(dir.path().join("home_metrics.json")),
            ..AnalysisPaths::default()
        };
        let rec = build_record("home", &md, None, &paths);
        assert_eq!(rec.title, "Welcome");
        assert_eq!(rec.page_type, "other");

        let rec = build_record("gone", &dir.path().join("gone.md"), None, &AnalysisPaths::default());
        assert_eq!(rec.title, "gone");
        assert_eq!(rec.raw_markdown, "");
    }
}
