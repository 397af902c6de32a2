//! Prompt rendering and the external text-generation step.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{info, warn};

use crate::discover::page_id;
use crate::pack::page::PageDocument;
use crate::template::{self, Context as TemplateContext};

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io error talking to generator: {0}")]
    Io(#[from] std::io::Error),

    #[error("generator exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

/// Opaque `generate(system, user) -> text` call.
pub trait Generator {
    fn generate(&self, system: &str, user: &str) -> impl Future<Output = Result<String, GenerateError>>;
}

/// Runs `ollama run <model>` with the combined prompt on stdin.
pub struct Ollama {
    program: String,
    model: String,
}

impl Ollama {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            program: "ollama".to_string(),
            model: model.into(),
        }
    }
}

pub fn compose_prompt(system: &str, user: &str) -> String {
    format!("<<SYS>>\n{}\n<</SYS>>\n\n{}", system, user)
}

impl Generator for Ollama {
    async fn generate(&self, system: &str, user: &str) -> Result<String, GenerateError> {
        let mut child = Command::new(&self.program)
            .arg("run")
            .arg(&self.model)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| GenerateError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let prompt = compose_prompt(system, user);
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(prompt.as_bytes()).await?;
                stdin.shutdown().await?;
            }
            Ok::<_, std::io::Error>(())
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(GenerateError::Failed {
                status: output.status.to_string(),
                stderr,
            });
        }
        fed?;
        if stderr.to_lowercase().contains("error") {
            warn!(model = %self.model, "Generator stderr: {}", stderr);
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// System and user templates read once per run.
#[derive(Debug, Clone)]
pub struct Prompts {
    pub system: String,
    pub user: String,
}

impl Prompts {
    pub fn load(system: &Path, user: &Path) -> Result<Self> {
        let read = |p: &Path| std::fs::read_to_string(p).with_context(|| format!("Failed to read template {}", p.display()));
        Ok(Self {
            system: read(system)?,
            user: read(user)?,
        })
    }

    /// Rendered `(system, user)` prompts for one packaged page.
    pub fn render(&self, constants: &TemplateContext, page: &TemplateContext) -> (String, String) {
        let mut ctx = constants.clone();
        ctx.extend(page.iter().map(|(k, v)| (k.clone(), v.clone())));
        (template::render(&self.system, constants), template::render(&self.user, &ctx))
    }
}

/// Template context for a packaged page document.
pub fn page_context(stem: &str, doc: &PageDocument) -> TemplateContext {
    let (raw_markdown, sections) = doc.split_body();
    let text = |key: &str, default: &str| json!(doc.front_str(key).unwrap_or(default));
    let value = |key: &str, default: Value| doc.front_value(key).cloned().unwrap_or(default);

    let mut ctx = TemplateContext::new();
    ctx.insert("id".into(), text("id", stem));
    ctx.insert("url".into(), text("url", ""));
    ctx.insert("title".into(), text("title", stem));
    ctx.insert("page_type".into(), text("page_type", "other"));
    ctx.insert("scores".into(), value("scores", json!({})));
    ctx.insert("structure".into(), value("structure", json!([])));
    ctx.insert("images".into(), value("images", json!([])));
    ctx.insert("links".into(), value("links", json!([])));
    ctx.insert("recommendations".into(), value("recommendations", json!([])));
    ctx.insert("raw_markdown".into(), Value::String(raw_markdown));
    ctx.insert("sections".into(), serde_json::to_value(sections).unwrap_or_else(|_| json!([])));
    ctx
}

/// Packaged page documents, sorted by file name.
pub fn list_pages(pages_dir: &Path) -> Result<Vec<PathBuf>> {
    if !pages_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(pages_dir)
        .with_context(|| format!("Failed to list {}", pages_dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "md"))
        .collect();
    files.sort();
    Ok(files)
}

/// Read one packaged page and render its prompts.
pub fn render_page(path: &Path, prompts: &Prompts, constants: &TemplateContext) -> Result<(String, String)> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let doc = PageDocument::parse(&text);
    let ctx = page_context(&page_id(path), &doc);
    Ok(prompts.render(constants, &ctx))
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct GenerateStats {
    pub generated: usize,
    pub empty: usize,
    pub skipped: usize,
}

impl GenerateStats {
    pub fn print(&self, out_dir: &Path) {
        println!(
            "Generated {} pages ({} empty, {} skipped) -> {}",
            self.generated,
            self.empty,
            self.skipped,
            out_dir.display()
        );
    }
}

/// Render prompts for every packaged page and write the generator's output
/// to `<out_dir>/<id>.md`. One page at a time; a failed or empty generation
/// still writes the (empty) file and moves on.
pub async fn run<G: Generator>(
    generator: &G,
    pages_dir: &Path,
    out_dir: &Path,
    prompts: &Prompts,
    constants: &TemplateContext,
    limit: Option<usize>,
) -> Result<GenerateStats> {
    let mut pages = list_pages(pages_dir)?;
    if pages.is_empty() {
        bail!("No pages found in {}. Run `sitepack package` first.", pages_dir.display());
    }
    if let Some(n) = limit {
        pages.truncate(n);
    }
    std::fs::create_dir_all(out_dir).with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let mut stats = GenerateStats::default();
    for path in &pages {
        let id = page_id(path);
        pb.set_message(id.clone());

        let (system, user) = match render_page(path, prompts, constants) {
            Ok(p) => p,
            Err(e) => {
                warn!(page = %id, "Skipping page: {:#}", e);
                stats.skipped += 1;
                pb.inc(1);
                continue;
            }
        };

        let output = match generator.generate(&system, &user).await {
            Ok(text) => text,
            Err(e) => {
                warn!(page = %id, "Generation failed: {}", e);
                String::new()
            }
        };
        if output.is_empty() {
            warn!(page = %id, "Generator returned no text");
            stats.empty += 1;
        } else {
            stats.generated += 1;
        }

        let target = out_dir.join(format!("{}.md", id));
        std::fs::write(&target, &output).with_context(|| format!("Failed to write {}", target.display()))?;
        pb.println(format!("Generated {}.md", id));
        pb.inc(1);
    }
    pb.finish_and_clear();
    info!("Generation finished: {} ok, {} empty", stats.generated, stats.empty);

    Ok(stats)
}

// ── Tests ──
