use serde_json::Value;

use super::Section;
use crate::value::{into_sequence, is_present, to_text};

const DEFAULT_LABEL: &str = "section";
const LABEL_KEYS: &[&str] = &["label", "name", "type"];
const TEXT_KEYS: &[&str] = &["text", "content"];

/// Shape of a `sections`-kind artifact, decided once after loading.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionsInput {
    /// The artifact is itself the list of sections.
    Sequence(Vec<Value>),
    /// The artifact is a mapping that may carry its own lists.
    Keyed {
        sections: Option<Value>,
        structure: Option<Value>,
    },
}

impl SectionsInput {
    pub fn from_artifact(artifact: &Value) -> Self {
        match artifact {
            Value::Array(items) => SectionsInput::Sequence(items.clone()),
            Value::Object(map) => SectionsInput::Keyed {
                sections: map.get("sections").filter(|v| is_present(v)).cloned(),
                structure: map.get("structure").filter(|v| is_present(v)).cloned(),
            },
            _ => SectionsInput::Keyed {
                sections: None,
                structure: None,
            },
        }
    }
}

/// Resolved `(sections, structure)` for a page. Whatever the sections
/// artifact does not supply comes from the analysis artifact.
pub fn resolve(input: &SectionsInput, analysis: &Value) -> (Vec<Section>, Vec<Value>) {
    let from_analysis = |key: &str| analysis.get(key).filter(|v| is_present(v)).cloned();

    let (items, structure) = match input {
        SectionsInput::Sequence(items) => (Some(Value::Array(items.clone())), from_analysis("structure")),
        SectionsInput::Keyed { sections, structure } => (
            sections.clone().or_else(|| from_analysis("sections")),
            structure.clone().or_else(|| from_analysis("structure")),
        ),
    };

    let items = items.map(into_sequence).unwrap_or_default();
    let structure = structure.map(into_sequence).unwrap_or_default();
    (normalize(&items), structure)
}

/// Normalize mixed section entries to `{label, text}`. Mappings are read
/// through the accepted key aliases, bare strings get the default label,
/// anything else is dropped.
pub fn normalize(items: &[Value]) -> Vec<Section> {
    items.iter().filter_map(normalize_item).collect()
}

fn normalize_item(item: &Value) -> Option<Section> {
    match item {
        Value::Object(map) => {
            let first = |keys: &[&str]| {
                keys.iter()
                    .filter_map(|k| map.get(*k))
                    .find(|v| is_present(v))
                    .map(to_text)
            };
            let label = first(LABEL_KEYS).unwrap_or_else(|| DEFAULT_LABEL.to_string());
            let text = first(TEXT_KEYS).unwrap_or_default();
            Some(Section::new(label, text))
        }
        Value::String(s) => Some(Section::new(DEFAULT_LABEL, s.clone())),
        _ => None,
    }
}

// ── Tests ──
