//! Document model: a résumé or a blog post

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

use super::frontmatter::{FrontMatter, FrontMatterError};
use super::markdown;
use crate::helpers::parse_date;

/// Reasons a file cannot become a [`Document`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("no front-matter block")]
    MissingFrontMatter,

    #[error(transparent)]
    FrontMatter(#[from] FrontMatterError),

    #[error("missing required key `{0}`")]
    MissingKey(&'static str),

    #[error("`{0}` must not be empty")]
    EmptyValue(&'static str),

    #[error("`{key}` is not a valid date: {value:?}")]
    InvalidDate { key: &'static str, value: String },

    #[error("`modified` ({modified}) is earlier than `date` ({date})")]
    ModifiedBeforeDate { date: NaiveDate, modified: NaiveDate },

    #[error("tag #{index} is empty")]
    EmptyTag { index: usize },
}

impl DocumentError {
    /// Line in the source file the error points at, if known
    pub fn line(&self) -> Option<usize> {
        match self {
            DocumentError::FrontMatter(e) => e.line(),
            _ => None,
        }
    }
}

/// What a document is used for on the site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Post,
    Resume,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Post => f.write_str("post"),
            DocumentKind::Resume => f.write_str("resume"),
        }
    }
}

/// A validated content document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub kind: DocumentKind,

    /// Source file path, relative to the source directory
    pub source: String,

    /// `YYYY-MM-DD-<title>`, unique within a store
    pub slug: String,

    pub title: String,

    /// Publication date
    pub date: NaiveDate,

    /// Last edit, never earlier than `date`
    pub modified: Option<NaiveDate>,

    pub tags: BTreeSet<String>,

    pub description: Option<String>,

    /// Header image asset reference
    pub image: Option<String>,

    pub image_caption: Option<String>,

    /// Custom front-matter fields
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub extra: IndexMap<String, serde_yaml::Value>,

    /// Raw markdown body
    pub body: String,
}

impl Document {
    /// Parse a document from the full text of its source file
    pub fn parse(
        kind: DocumentKind,
        source: impl Into<String>,
        text: &str,
    ) -> Result<Self, DocumentError> {
        let (fm, body) = FrontMatter::parse(text)?.ok_or(DocumentError::MissingFrontMatter)?;
        Self::from_front_matter(kind, source, fm, body)
    }

    /// Build a document from already-split front-matter and body
    pub fn from_front_matter(
        kind: DocumentKind,
        source: impl Into<String>,
        fm: FrontMatter,
        body: &str,
    ) -> Result<Self, DocumentError> {
        let title = fm.title.ok_or(DocumentError::MissingKey("title"))?;
        if title.trim().is_empty() {
            return Err(DocumentError::EmptyValue("title"));
        }

        let raw_date = fm.date.ok_or(DocumentError::MissingKey("date"))?;
        let date = parse_date(&raw_date).ok_or_else(|| DocumentError::InvalidDate {
            key: "date",
            value: raw_date.clone(),
        })?;

        let modified = match fm.modified {
            Some(raw) => {
                let modified = parse_date(&raw).ok_or_else(|| DocumentError::InvalidDate {
                    key: "modified",
                    value: raw.clone(),
                })?;
                if modified < date {
                    return Err(DocumentError::ModifiedBeforeDate { date, modified });
                }
                Some(modified)
            }
            None => None,
        };

        if let Some(index) = fm.tags.iter().position(|t| t.trim().is_empty()) {
            return Err(DocumentError::EmptyTag { index: index + 1 });
        }

        Ok(Self {
            kind,
            source: source.into(),
            slug: make_slug(&date, &title),
            title,
            date,
            modified,
            tags: fm.tags.into_iter().collect(),
            description: fm.description,
            image: fm.image,
            image_caption: fm.image_caption,
            extra: fm.extra,
            body: body.to_string(),
        })
    }

    /// Front-matter that parses back to this document
    pub fn front_matter(&self) -> FrontMatter {
        FrontMatter {
            title: Some(self.title.clone()),
            date: Some(self.date.format("%Y-%m-%d").to_string()),
            modified: self.modified.map(|d| d.format("%Y-%m-%d").to_string()),
            tags: self.tags.iter().cloned().collect(),
            description: self.description.clone(),
            image: self.image.clone(),
            image_caption: self.image_caption.clone(),
            extra: self.extra.clone(),
        }
    }

    /// Serialize front-matter and body back to a markdown source file
    pub fn to_markdown(&self) -> Result<String, FrontMatterError> {
        let block = self.front_matter().to_block()?;
        Ok(format!("{}\n{}", block, self.body))
    }

    /// Date the document last changed
    pub fn last_modified(&self) -> NaiveDate {
        self.modified.unwrap_or(self.date)
    }

    /// URL path (without root) for this document
    ///
    /// Posts expand the permalink pattern; the résumé lives at its source path.
    pub fn path(&self, pattern: &str) -> String {
        match self.kind {
            DocumentKind::Post => {
                let title = slug::slugify(&self.title);
                pattern
                    .replace(":year", &self.date.format("%Y").to_string())
                    .replace(":month", &self.date.format("%m").to_string())
                    .replace(":day", &self.date.format("%d").to_string())
                    .replace(":i_month", &self.date.format("%-m").to_string())
                    .replace(":i_day", &self.date.format("%-d").to_string())
                    .replace(":title", &title)
                    .replace(":slug", &self.slug)
                    .trim_start_matches('/')
                    .to_string()
            }
            DocumentKind::Resume => {
                let without_ext = self
                    .source
                    .trim_end_matches(".md")
                    .trim_end_matches(".markdown");
                if without_ext == "index" || without_ext.ends_with("/index") {
                    without_ext.trim_end_matches("index").to_string()
                } else {
                    format!("{}/", without_ext)
                }
            }
        }
    }

    /// Short plain-text summary: the `<!-- more -->` excerpt, else the first paragraph
    pub fn excerpt(&self) -> Option<String> {
        match markdown::split_excerpt(&self.body) {
            Some(excerpt) => Some(markdown::plain_text(excerpt).replace('\n', " ")),
            None => markdown::first_paragraph(&self.body),
        }
    }

    /// Words of prose in the body
    pub fn word_count(&self) -> usize {
        markdown::word_count(&self.body)
    }

    /// Estimated reading time, at least one minute
    pub fn reading_minutes(&self, words_per_minute: usize) -> usize {
        let wpm = words_per_minute.max(1);
        self.word_count().div_ceil(wpm).max(1)
    }
}

/// Build the `YYYY-MM-DD-<title>` identifier for a document
pub fn make_slug(date: &NaiveDate, title: &str) -> String {
    let title = slug::slugify(title);
    let date = date.format("%Y-%m-%d");
    if title.is_empty() {
        date.to_string()
    } else {
        format!("{}-{}", date, title)
    }
}

/// Check if a file is a markdown file
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "markdown")
        .unwrap_or(false)
}
