//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub author: String,
    pub language: String,

    // URL
    pub url: String,
    pub root: String,
    pub permalink: String,

    // Directory
    pub source_dir: String,
    pub posts_dir: String,
    /// Résumé document, relative to the source directory
    pub resume: String,
    /// Stylesheet, relative to the source directory
    pub stylesheet: String,
    /// Glob patterns (relative to the source directory) that are never loaded
    #[serde(default)]
    pub exclude: Vec<String>,

    // Writing
    pub new_post_name: String,
    pub date_format: String,
    pub words_per_minute: usize,
    /// Treat a missing `description` as a warning
    pub require_description: bool,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Portfolio".to_string(),
            author: "John Doe".to_string(),
            language: "en".to_string(),

            url: "http://example.com".to_string(),
            root: "/".to_string(),
            permalink: ":year/:month/:day/:title/".to_string(),

            source_dir: "source".to_string(),
            posts_dir: "_posts".to_string(),
            resume: "resume.md".to_string(),
            stylesheet: "css/style.css".to_string(),
            exclude: Vec::new(),

            new_post_name: ":year-:month-:day-:title.md".to_string(),
            date_format: "YYYY-MM-DD".to_string(),
            words_per_minute: 200,
            require_description: false,

            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        // An empty _config.yml deserializes to unit, not a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Compile the `exclude` globs, skipping (and logging) invalid ones
    pub fn exclude_patterns(&self) -> Vec<glob::Pattern> {
        self.exclude
            .iter()
            .filter_map(|p| match glob::Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::warn!("Ignoring invalid exclude pattern {:?}: {}", p, e);
                    None
                }
            })
            .collect()
    }
}
