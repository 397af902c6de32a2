pub mod page;
pub mod site;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::discover::{self, Corpus};
use crate::loader;
use crate::record::{build_record, PageRecord};

pub struct PackStats {
    pub pages: usize,
    pub with_sections: usize,
    pub pages_dir: PathBuf,
    pub out_dir: PathBuf,
}

impl PackStats {
    pub fn print(&self) {
        println!(
            "Wrote {} pages ({} with suggested sections) -> {}",
            self.pages,
            self.with_sections,
            self.pages_dir.display()
        );
        println!(
            "Wrote {} and {} -> {}",
            site::SITE_MD,
            site::SITE_JSONL,
            self.out_dir.display()
        );
    }
}

/// Discover inputs, build one record per page and write every output form.
/// Pages are built and written one at a time, in discovery order.
pub fn run(extracted_dir: &Path, analysis_dir: &Path, out_dir: &Path) -> Result<PackStats> {
    let Corpus { pages, summary } = discover::discover(extracted_dir, analysis_dir)?;
    if pages.is_empty() {
        bail!("No pages found under {}", extracted_dir.display());
    }

    let pages_dir = out_dir.join("pages");
    std::fs::create_dir_all(&pages_dir)
        .with_context(|| format!("Failed to create {}", pages_dir.display()))?;

    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut records: Vec<PageRecord> = Vec::with_capacity(pages.len());
    for src in &pages {
        pb.set_message(src.id.clone());
        let rec = build_record(&src.id, &src.markdown, src.metadata.as_deref(), &src.analysis);
        page::write(&pages_dir, &rec)?;
        records.push(rec);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let summary = summary.map(|p| loader::or_empty(loader::load_json(&p)));
    site::write_site(out_dir, &records, summary.as_ref(), Utc::now())?;
    site::write_jsonl(out_dir, &records)?;
    if let Some(summary) = &summary {
        site::write_summary(out_dir, summary)?;
    }
    info!("Packaged {} pages into {}", records.len(), out_dir.display());

    Ok(PackStats {
        pages: records.len(),
        with_sections: records.iter().filter(|r| !r.sections.is_empty()).count(),
        pages_dir,
        out_dir: out_dir.to_path_buf(),
    })
}

// ── Tests ──
