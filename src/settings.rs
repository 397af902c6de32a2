use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use serde_json::Value;

use crate::loader;
use crate::template;

/// Where the pipeline reads and writes. Defaults, then an optional
/// `sitepack.{toml,yaml,json}` in the working directory, then `SITEPACK_*`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub extracted_dir: PathBuf,
    pub analysis_dir: PathBuf,
    pub pack_dir: PathBuf,
    pub prompts_dir: PathBuf,
    pub site_config: PathBuf,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default("extracted_dir", "extracted")?
            .set_default("analysis_dir", "analysis")?
            .set_default("pack_dir", "build/pack")?
            .set_default("prompts_dir", "prompts")?
            .set_default("site_config", "config/site.config.yaml")?
            .add_source(File::with_name("sitepack").required(false))
            .add_source(Environment::with_prefix("SITEPACK"))
            .build()
            .context("Failed to read settings")?;
        Ok(settings.try_deserialize()?)
    }

    pub fn pages_dir(&self) -> PathBuf {
        self.pack_dir.join("pages")
    }

    pub fn system_template(&self) -> PathBuf {
        self.prompts_dir.join("system_template.md")
    }

    pub fn user_template(&self) -> PathBuf {
        self.prompts_dir.join("page_user_template.md")
    }
}

/// Brand and contact constants plus generation options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub brand: Brand,
    pub constants: Constants,
    pub llm: Llm,
    pub generation: Generation,
    /// Extra template values, passed through as-is.
    pub placeholders: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Brand {
    pub name: String,
    pub voice: String,
    pub reading_level: String,
    pub primary_cta: String,
    pub locations_emphasis: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Constants {
    pub company_name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub service_areas: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Llm {
    pub model: String,
    pub stream: bool,
}

impl Default for Llm {
    fn default() -> Self {
        Self {
            model: "llama3".to_string(),
            stream: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Generation {
    pub output_dir: PathBuf,
}

impl Default for Generation {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("build/generated"),
        }
    }
}

impl SiteConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let value = loader::load_yaml(path)?;
        serde_json::from_value(value).with_context(|| format!("Invalid site config {}", path.display()))
    }

    /// Constants every prompt may reference.
    pub fn template_context(&self) -> template::Context {
        let mut ctx = template::Context::new();
        let mut put = |k: &str, v: &str| {
            ctx.insert(k.to_string(), Value::String(v.to_string()));
        };
        put("brand_name", &self.brand.name);
        put("brand_voice", &self.brand.voice);
        put("reading_level", &self.brand.reading_level);
        put("primary_cta", &self.brand.primary_cta);
        put("locations_emphasis", &self.brand.locations_emphasis);
        put("company_name", &self.constants.company_name);
        put("phone", &self.constants.phone);
        put("email", &self.constants.email);
        put("address", &self.constants.address);
        put("service_areas", &self.constants.service_areas.join(", "));
        for (k, v) in &self.placeholders {
            ctx.insert(k.clone(), v.clone());
        }
        ctx
    }
}

// ── Tests ──
