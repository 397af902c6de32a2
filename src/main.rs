mod discover;
mod generate;
mod loader;
mod markdown;
mod pack;
mod record;
mod settings;
mod template;
mod value;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use settings::{Settings, SiteConfig};

#[derive(Parser)]
#[command(name = "sitepack", about = "Package extracted site pages and generate copy from them")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge markdown and analysis artifacts into page records and write the pack
    Package {
        /// Directory holding extracted markdown and *_metadata.json files
        #[arg(long)]
        extracted: Option<PathBuf>,
        /// Directory holding per-page analysis artifacts and summary.json
        #[arg(long)]
        analysis: Option<PathBuf>,
        /// Pack output directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print the rendered prompts for one packaged page
    Render {
        /// Page id (file name of the packaged page without .md)
        #[arg(short, long)]
        page: String,
    },
    /// Generate copy for every packaged page with the configured model
    Generate {
        /// Max pages to generate (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show statistics for the last pack
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let result = match cli.command {
        Commands::Package { extracted, analysis, out } => {
            let extracted = extracted.unwrap_or_else(|| settings.extracted_dir.clone());
            let analysis = analysis.unwrap_or_else(|| settings.analysis_dir.clone());
            let out = out.unwrap_or_else(|| settings.pack_dir.clone());
            let stats = pack::run(&extracted, &analysis, &out)?;
            stats.print();
            Ok(())
        }
        Commands::Render { page } => {
            let site = SiteConfig::load(&settings.site_config)?;
            let prompts = generate::Prompts::load(&settings.system_template(), &settings.user_template())?;
            let path = settings.pages_dir().join(format!("{}.md", page));
            if !path.is_file() {
                bail!("No packaged page {}. Run 'package' first.", path.display());
            }
            let (system, user) = generate::render_page(&path, &prompts, &site.template_context())?;
            println!("=== system ===\n{}\n\n=== user ===\n{}", system, user);
            Ok(())
        }
        Commands::Generate { limit } => {
            let site = SiteConfig::load(&settings.site_config)?;
            let prompts = generate::Prompts::load(&settings.system_template(), &settings.user_template())?;
            let generator = generate::Ollama::new(site.llm.model.clone());
            let out_dir = &site.generation.output_dir;
            tracing::info!(model = %site.llm.model, stream = site.llm.stream, "Starting generation");
            let stats = generate::run(
                &generator,
                &settings.pages_dir(),
                out_dir,
                &prompts,
                &site.template_context(),
                limit,
            )
            .await?;
            stats.print(out_dir);
            Ok(())
        }
        Commands::Stats => {
            let path = settings.pack_dir.join(pack::site::SITE_JSONL);
            let records = pack::site::read_jsonl(&path)
                .with_context(|| "No pack found. Run 'package' first.")?;

            let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
            for r in &records {
                *by_type.entry(r.page_type.as_str()).or_default() += 1;
            }
            let qualities: Vec<f64> = records
                .iter()
                .filter_map(|r| r.scores.quality.as_ref().and_then(|n| n.as_f64()))
                .collect();

            println!("Pages:         {}", records.len());
            println!("With sections: {}", records.iter().filter(|r| !r.sections.is_empty()).count());
            println!("With url:      {}", records.iter().filter(|r| !r.url.is_empty()).count());
            if qualities.is_empty() {
                println!("Avg quality:   -");
            } else {
                println!("Avg quality:   {:.1}", qualities.iter().sum::<f64>() / qualities.len() as f64);
            }
            println!("\n--- Page types ---");
            for (kind, n) in &by_type {
                println!("  {:<16} {}", kind, n);
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
