use crate::cli::PdfQuality;
use crate::error::{FunnError, Result};
use crate::export::TemplateSource;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Overrides the configured template path or URL
pub const TEMPLATE_ENV: &str = "FUNNSKJEMA_TEMPLATE";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path or http(s) URL of the official form template
    pub template: String,
    /// Base URL of the address and municipality lookups
    pub geo_base_url: String,
    pub lookup_timeout_seconds: u64,
    pub output_dir: PathBuf,
    pub pdf_quality: PdfQuality,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            template: "assets/funnskjema.pdf".into(),
            geo_base_url: crate::geo::kartverket::DEFAULT_BASE_URL.into(),
            lookup_timeout_seconds: 15,
            output_dir: PathBuf::from("."),
            pdf_quality: PdfQuality::Medium,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Missing file gives the defaults; a malformed one is an error
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| FunnError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("funnskjema"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Template location, the environment variable wins over the file
    pub fn template_source(&self) -> TemplateSource {
        match std::env::var(TEMPLATE_ENV) {
            Ok(value) if !value.trim().is_empty() => TemplateSource::parse(value.trim()),
            _ => TemplateSource::parse(&self.template),
        }
    }

    pub fn set_template(&mut self, template: String) -> Result<()> {
        self.template = template;
        self.save()
    }

    pub fn lookup_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.lookup_timeout_seconds.max(1))
    }
}
