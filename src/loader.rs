use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid json in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid yaml in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl LoadError {
    pub fn is_missing(&self) -> bool {
        matches!(self, LoadError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// The independently produced JSON artifacts that can describe a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Metadata,
    Analysis,
    Metrics,
    Classification,
    Sections,
}

impl ArtifactKind {
    pub const ANALYSIS_KINDS: [ArtifactKind; 4] = [
        ArtifactKind::Analysis,
        ArtifactKind::Metrics,
        ArtifactKind::Classification,
        ArtifactKind::Sections,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            ArtifactKind::Metadata => "_metadata.json",
            ArtifactKind::Analysis => "_analysis.json",
            ArtifactKind::Metrics => "_metrics.json",
            ArtifactKind::Classification => "_classification.json",
            ArtifactKind::Sections => "_sections.json",
        }
    }

    /// Split `<id>_<kind>.json` into page id and kind.
    pub fn split_file_name(name: &str) -> Option<(&str, ArtifactKind)> {
        [ArtifactKind::Metadata]
            .into_iter()
            .chain(Self::ANALYSIS_KINDS)
            .find_map(|kind| {
                name.strip_suffix(kind.suffix())
                    .filter(|id| !id.is_empty())
                    .map(|id| (id, kind))
            })
    }
}

fn read(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_json(path: &Path) -> Result<Value, LoadError> {
    let text = read(path)?;
    serde_json::from_str(&text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_yaml(path: &Path) -> Result<Value, LoadError> {
    let text = read(path)?;
    parse_yaml(&text).map_err(|source| LoadError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

/// An empty YAML document parses as an empty mapping.
pub fn parse_yaml(text: &str) -> Result<Value, serde_yaml::Error> {
    if text.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_yaml::from_str(text)
}

pub fn load_markdown(path: &Path) -> Result<String, LoadError> {
    read(path)
}

/// Soft-failure policy for artifacts: anything that cannot be read or parsed
/// becomes an empty mapping. Absence is silent, malformed input is logged.
pub fn or_empty(result: Result<Value, LoadError>) -> Value {
    match result {
        Ok(value) => value,
        Err(e) if e.is_missing() => {
            debug!("{}", e);
            empty()
        }
        Err(e) => {
            warn!("Skipping artifact: {}", e);
            empty()
        }
    }
}

/// Load an optional JSON artifact, falling back to an empty mapping.
pub fn load_json_or_empty(path: Option<&Path>) -> Value {
    match path {
        Some(p) => or_empty(load_json(p)),
        None => empty(),
    }
}

pub fn empty() -> Value {
    Value::Object(Map::new())
}

// ── Tests ──
