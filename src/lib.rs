//! folio: content store and stylesheet checker for a markdown portfolio site
//!
//! A site is a source directory holding a résumé, blog posts with YAML
//! front-matter, and one stylesheet. Rendering to HTML is left to an
//! external static-site generator; this crate loads, validates, lists and
//! exports the content it would consume.

pub mod check;
pub mod commands;
pub mod config;
pub mod content;
pub mod helpers;
pub mod style;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// The main site handle
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Source directory
    pub source_dir: PathBuf,
    /// Blog posts directory
    pub posts_dir: PathBuf,
    /// Résumé document
    pub resume_path: PathBuf,
    /// Stylesheet
    pub stylesheet_path: PathBuf,
}

impl Site {
    /// Create a new site from a directory, reading `_config.yml` if present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a site with an explicit configuration
    pub fn with_config(base_dir: PathBuf, config: config::SiteConfig) -> Self {
        let source_dir = base_dir.join(&config.source_dir);
        let posts_dir = source_dir.join(&config.posts_dir);
        let resume_path = source_dir.join(&config.resume);
        let stylesheet_path = source_dir.join(&config.stylesheet);

        Self {
            config,
            base_dir,
            source_dir,
            posts_dir,
            resume_path,
            stylesheet_path,
        }
    }

    /// Path of the site configuration file
    pub fn config_path(&self) -> PathBuf {
        self.base_dir.join("_config.yml")
    }

    /// Display form of a path, relative to the base directory
    pub fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.base_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Full URL for a site path (`url` + `root` + path)
    pub fn full_url(&self, path: &str) -> String {
        format!(
            "{}/{}{}",
            self.config.url.trim_end_matches('/'),
            self.config.root.trim_start_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Check the site and collect diagnostics
    pub fn check(&self) -> Result<check::Report> {
        check::run(self)
    }

    /// Load the content store
    pub fn load(&self) -> Result<content::ContentStore> {
        content::ContentStore::load(self)
    }
}
