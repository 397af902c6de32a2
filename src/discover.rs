use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::loader::ArtifactKind;

const SUMMARY_FILE: &str = "summary.json";

/// Analysis artifact paths for one page; any subset may be present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisPaths {
    pub analysis: Option<PathBuf>,
    pub metrics: Option<PathBuf>,
    pub classification: Option<PathBuf>,
    pub sections: Option<PathBuf>,
}

impl AnalysisPaths {
    fn set(&mut self, kind: ArtifactKind, path: PathBuf) {
        match kind {
            ArtifactKind::Analysis => self.analysis = Some(path),
            ArtifactKind::Metrics => self.metrics = Some(path),
            ArtifactKind::Classification => self.classification = Some(path),
            ArtifactKind::Sections => self.sections = Some(path),
            ArtifactKind::Metadata => {}
        }
    }
}

/// Everything the packager needs to build one page record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSource {
    pub id: String,
    pub markdown: PathBuf,
    pub metadata: Option<PathBuf>,
    pub analysis: AnalysisPaths,
}

#[derive(Debug, Default)]
pub struct Corpus {
    pub pages: Vec<PageSource>,
    pub summary: Option<PathBuf>,
}

/// Page id: the file name without its final extension.
pub fn page_id(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.rsplit_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => name,
    }
}

/// Discover pages under `extracted_dir` and their artifacts under
/// `analysis_dir`. Pages keep walk order; when two markdown files share an
/// id the first one found wins.
pub fn discover(extracted_dir: &Path, analysis_dir: &Path) -> Result<Corpus> {
    if !extracted_dir.is_dir() {
        bail!("Extracted directory {} not found", extracted_dir.display());
    }
    let extracted = collect_files(extracted_dir);

    let mut metadata: HashMap<String, PathBuf> = HashMap::new();
    let mut markdown = Vec::new();
    for path in extracted {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some((id, ArtifactKind::Metadata)) = ArtifactKind::split_file_name(name) {
            metadata.entry(id.to_string()).or_insert_with(|| path.clone());
        } else if name.ends_with(".md") {
            markdown.push(path);
        }
    }

    let analysis_files = if analysis_dir.is_dir() {
        collect_files(analysis_dir)
    } else {
        Vec::new()
    };

    let mut analysis: HashMap<String, AnalysisPaths> = HashMap::new();
    let mut nested_summary = None;
    for path in analysis_files {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name == SUMMARY_FILE {
            nested_summary.get_or_insert(path);
            continue;
        }
        match ArtifactKind::split_file_name(name) {
            Some((_, ArtifactKind::Metadata)) | None => {}
            Some((id, kind)) => analysis.entry(id.to_string()).or_default().set(kind, path),
        }
    }

    let root_summary = analysis_dir.join(SUMMARY_FILE);
    let summary = if root_summary.is_file() {
        Some(root_summary)
    } else {
        nested_summary
    };

    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    let mut pages: Vec<PageSource> = Vec::with_capacity(markdown.len());
    for md in markdown {
        let id = page_id(&md);
        if let Some(first) = seen.get(&id) {
            warn!(page = %id, "Duplicate page id: keeping {}, ignoring {}", first.display(), md.display());
            continue;
        }
        seen.insert(id.clone(), md.clone());
        pages.push(PageSource {
            metadata: metadata.get(&id).cloned(),
            analysis: analysis.get(&id).cloned().unwrap_or_default(),
            markdown: md,
            id,
        });
    }

    info!(
        "Discovered {} pages ({} with metadata, {} with analysis)",
        pages.len(),
        pages.iter().filter(|p| p.metadata.is_some()).count(),
        pages.iter().filter(|p| p.analysis != AnalysisPaths::default()).count(),
    );

    Ok(Corpus { pages, summary })
}

/// Depth-first walk; within a directory, files come before subdirectories
/// and both are visited in name order. Directory symlinks are not followed.
/// Unreadable entries are logged and skipped.
fn collect_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by(|a, b| {
            a.file_type()
                .is_dir()
                .cmp(&b.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn page_id_strips_final_extension() {
        assert_eq!(page_id(Path::new("a/b/home.md")), "home");
        assert_eq!(page_id(Path::new("services.v2.md")), "services.v2");
        assert_eq!(page_id(Path::new("README")), "README");
    }

    #[test]
    fn joins_artifacts_by_page_id() {
        let root = tempfile::tempdir().unwrap();
        let extracted = root.path().join("extracted");
        let analysis = root.path().join("analysis");

        touch(&extracted.join("site/home.md"), "# Home");
        touch(&extracted.join("site/home_metadata.json"), "{}");
        touch(&extracted.join("about.md"), "# About");
        touch(&analysis.join("home_analysis.json"), "{}");
        touch(&analysis.join("deep/home_sections.json"), "[]");
        touch(&analysis.join("about_metrics.json"), "{}");
        touch(&analysis.join("deep/summary.json"), "{}");

        let corpus = discover(&extracted, &analysis).unwrap();
        let ids: Vec<&str> = corpus.pages.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["about", "home"]);

        let home = &corpus.pages[1];
        assert_eq!(home.metadata, Some(extracted.join("site/home_metadata.json")));
        assert_eq!(home.analysis.analysis, Some(analysis.join("home_analysis.json")));
        assert_eq!(home.analysis.sections, Some(analysis.join("deep/home_sections.json")));
        assert_eq!(home.analysis.metrics, None);

        let about = &corpus.pages[0];
        assert_eq!(about.metadata, None);
        assert_eq!(about.analysis.metrics, Some(analysis.join("about_metrics.json")));

        assert_eq!(corpus.summary, Some(analysis.join("deep/summary.json")));
    }

    #[test]
    fn root_summary_wins_and_missing_analysis_dir_is_fine() {
        let root = tempfile::tempdir().unwrap();
        let extracted = root.path().join("extracted");
        touch(&extracted.join("home.md"), "# Home");

        let corpus = discover(&extracted, &root.path().join("nope")).unwrap();
        assert_eq!(corpus.pages.len(), 1);
        assert_eq!(corpus.summary, None);

        let analysis = root.path().join("analysis");
        touch(&analysis.join("summary.json"), "{}");
        touch(&analysis.join("a/summary.json"), "{}");
        let corpus = discover(&extracted, &analysis).unwrap();
        assert_eq!(corpus.summary, Some(analysis.join("summary.json")));
    }

    #[test]
    fn duplicate_ids_keep_first_page() {
        let root = tempfile::tempdir().unwrap();
        let extracted = root.path().join("extracted");
        touch(&extracted.join("a/home.md"), "# First");
        touch(&extracted.join("b/home.md"), "# Second");
        touch(&extracted.join("b/contact.md"), "# Contact");

        let corpus = discover(&extracted, &root.path().join("analysis")).unwrap();
        let found: Vec<(&str, PathBuf)> = corpus
            .pages
            .iter()
            .map(|p| (p.id.as_str(), p.markdown.clone()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("home", extracted.join("a/home.md")),
                ("contact", extracted.join("b/contact.md")),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn directory_symlinks_are_not_followed() {
        let root = tempfile::tempdir().unwrap();
        let extracted = root.path().join("extracted");
        let analysis = root.path().join("analysis");
        touch(&extracted.join("home.md"), "# Home");
        touch(&analysis.join("home_metrics.json"), "{}");
        std::os::unix::fs::symlink(&extracted, extracted.join("loop")).unwrap();
        std::os::unix::fs::symlink(&analysis, analysis.join("loop")).unwrap();

        let corpus = discover(&extracted, &analysis).unwrap();
        assert_eq!(corpus.pages.len(), 1);
        assert_eq!(corpus.pages[0].analysis.metrics, Some(analysis.join("home_metrics.json")));
    }

    #[test]
    fn missing_extracted_dir_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let err = discover(&root.path().join("nope"), root.path()).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
