//! Content store - loads the résumé and posts from the source directory

use anyhow::Result;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

use super::document::is_markdown_file;
use super::{lint, Document, DocumentError, DocumentKind, FrontMatter};
use crate::check::Diagnostic;
use crate::Site;

/// Lookup failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("no document with slug `{0}`")]
    NotFound(String),
}

/// All documents of a site, keyed by slug
///
/// Posts come first, newest to oldest, followed by the résumé.
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    documents: IndexMap<String, Document>,
    diagnostics: Vec<Diagnostic>,
}

impl ContentStore {
    /// Load every document of a site
    ///
    /// Files that fail to parse are skipped and reported as error diagnostics.
    pub fn load(site: &Site) -> Result<Self> {
        let mut documents = Vec::new();
        let mut diagnostics = Vec::new();
        let excludes = site.config.exclude_patterns();

        if site.posts_dir.exists() {
            for entry in WalkDir::new(&site.posts_dir)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = entry.path();
                if !path.is_file() || !is_markdown_file(path) {
                    continue;
                }

                let source = source_path(site, path);
                if excludes.iter().any(|p| p.matches(&source)) {
                    tracing::debug!("Excluded {:?}", path);
                    continue;
                }

                if let Some(doc) = load_file(site, path, DocumentKind::Post, &mut diagnostics) {
                    documents.push(doc);
                }
            }
        } else {
            tracing::debug!("No posts directory at {:?}", site.posts_dir);
        }

        if site.resume_path.is_file() {
            if let Some(doc) = load_file(
                site,
                &site.resume_path,
                DocumentKind::Resume,
                &mut diagnostics,
            ) {
                documents.push(doc);
            }
        }

        let mut store = Self::from_documents(documents);
        // Documents only know their path inside the source directory
        for diagnostic in &mut store.diagnostics {
            diagnostic.file = site.relative(&site.source_dir.join(&diagnostic.file));
        }
        diagnostics.append(&mut store.diagnostics);
        store.diagnostics = diagnostics;

        Ok(store)
    }

    /// Build a store from parsed documents
    ///
    /// A document whose slug is already taken is dropped with an error diagnostic.
    pub fn from_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        let mut documents: Vec<_> = documents.into_iter().collect();
        // Newest first; the résumé after all posts
        documents.sort_by(|a, b| {
            (a.kind == DocumentKind::Resume)
                .cmp(&(b.kind == DocumentKind::Resume))
                .then(b.date.cmp(&a.date))
                .then(a.slug.cmp(&b.slug))
                .then(a.source.cmp(&b.source))
        });

        let mut diagnostics = lint::collection(&documents);
        let mut map: IndexMap<String, Document> = IndexMap::new();

        for doc in documents {
            if let Some(existing) = map.get(&doc.slug) {
                tracing::warn!("Duplicate slug {} in {}", doc.slug, doc.source);
                diagnostics.push(Diagnostic::error(
                    doc.source.as_str(),
                    None,
                    format!(
                        "slug `{}` is already used by {}",
                        doc.slug, existing.source
                    ),
                ));
                continue;
            }
            map.insert(doc.slug.clone(), doc);
        }

        Self {
            documents: map,
            diagnostics,
        }
    }

    /// Look up a document by slug
    pub fn get(&self, slug: &str) -> Result<&Document, StoreError> {
        self.documents
            .get(slug)
            .ok_or_else(|| StoreError::NotFound(slug.to_string()))
    }

    /// All documents, posts first (newest to oldest)
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    /// Blog posts, newest first
    pub fn posts(&self) -> impl Iterator<Item = &Document> {
        self.documents
            .values()
            .filter(|d| d.kind == DocumentKind::Post)
    }

    /// The résumé, if the site has one
    pub fn resume(&self) -> Option<&Document> {
        self.documents
            .values()
            .find(|d| d.kind == DocumentKind::Resume)
    }

    /// Tag -> number of documents carrying it
    pub fn tags(&self) -> BTreeMap<&str, usize> {
        let mut tags = BTreeMap::new();
        for doc in self.documents.values() {
            for tag in &doc.tags {
                *tags.entry(tag.as_str()).or_insert(0) += 1;
            }
        }
        tags
    }

    /// Posts carrying a tag, newest first
    pub fn tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Document> {
        self.posts().filter(move |d| d.tags.contains(tag))
    }

    /// The post published just after this one
    pub fn prev(&self, slug: &str) -> Option<&Document> {
        let posts: Vec<_> = self.posts().collect();
        let pos = posts.iter().position(|p| p.slug == slug)?;
        pos.checked_sub(1).map(|i| posts[i])
    }

    /// The post published just before this one
    pub fn next(&self, slug: &str) -> Option<&Document> {
        let posts: Vec<_> = self.posts().collect();
        let pos = posts.iter().position(|p| p.slug == slug)?;
        posts.get(pos + 1).copied()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Problems found while loading
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Source path relative to the source directory, with forward slashes
fn source_path(site: &Site, path: &Path) -> String {
    path.strip_prefix(&site.source_dir)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Read and validate one file, recording what goes wrong
fn load_file(
    site: &Site,
    path: &Path,
    kind: DocumentKind,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<Document> {
    let file = site.relative(path);

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Failed to read {:?}: {}", path, e);
            diagnostics.push(Diagnostic::error(file, None, e.to_string()));
            return None;
        }
    };

    let parsed = FrontMatter::parse(&text)
        .map_err(DocumentError::from)
        .and_then(|fm| fm.ok_or(DocumentError::MissingFrontMatter));
    let result = parsed.and_then(|(fm, body)| {
        diagnostics.extend(lint::front_matter(&file, &fm, &site.config));
        Document::from_front_matter(kind, source_path(site, path), fm, body)
    });

    match result {
        Ok(doc) => {
            tracing::debug!("Loaded {} {}", kind, doc.slug);
            Some(doc)
        }
        Err(e) => {
            tracing::warn!("Failed to load {} {:?}: {}", kind, path, e);
            diagnostics.push(Diagnostic::error(file, e.line(), e.to_string()));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Severity;
    use crate::config::SiteConfig;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn post(title: &str, date: &str, tags: &str) -> String {
        format!(
            "---\ntitle: {}\ndate: {}\ntags: [{}]\n---\n\nBody of {}.\n",
            title, date, tags, title
        )
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let posts = dir.path().join("source/_posts");
        write(&posts.join("one.md"), &post("One", "2024-01-01", "cpp"));
        write(&posts.join("two.md"), &post("Two", "2024-02-01", "cpp, gpu"));
        write(&posts.join("nested/three.markdown"), &post("Three", "2024-03-01", "jit"));
        write(&posts.join("notes.txt"), "not markdown");
        write(
            &dir.path().join("source/resume.md"),
            "---\ntitle: Résumé\ndate: 2022-05-01\nmodified: 2024-06-01\n---\n## Experience\n",
        );
        dir
    }

    #[test]
    fn test_load_site() {
        let dir = fixture();
        let site = Site::new(dir.path()).unwrap();
        let store = ContentStore::load(&site).unwrap();

        assert_eq!(store.len(), 4);
        assert!(store.diagnostics().is_empty(), "{:?}", store.diagnostics());

        let titles: Vec<_> = store.posts().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["Three", "Two", "One"]);

        let resume = store.resume().unwrap();
        assert_eq!(resume.source, "resume.md");
        assert_eq!(resume.kind, DocumentKind::Resume);

        let three = store.get("2024-03-01-three").unwrap();
        assert_eq!(three.source, "_posts/nested/three.markdown");
        assert_eq!(three.body, "Body of Three.\n");
    }

    #[test]
    fn test_get_missing() {
        let store = ContentStore::default();
        assert_eq!(
            store.get("nope").unwrap_err(),
            StoreError::NotFound("nope".to_string())
        );
    }

    #[test]
    fn test_tags_and_navigation() {
        let dir = fixture();
        let store = ContentStore::load(&Site::new(dir.path()).unwrap()).unwrap();

        let tags = store.tags();
        assert_eq!(tags.get("cpp"), Some(&2));
        assert_eq!(tags.get("gpu"), Some(&1));

        let cpp: Vec<_> = store.tagged("cpp").map(|d| d.title.as_str()).collect();
        assert_eq!(cpp, vec!["Two", "One"]);

        assert_eq!(store.prev("2024-02-01-two").unwrap().title, "Three");
        assert_eq!(store.next("2024-02-01-two").unwrap().title, "One");
        assert!(store.prev("2024-03-01-three").is_none());
        assert!(store.next("2024-01-01-one").is_none());
    }

    #[test]
    fn test_bad_files_become_diagnostics() {
        let dir = fixture();
        let posts = dir.path().join("source/_posts");
        write(&posts.join("no-date.md"), "---\ntitle: No date\n---\nBody\n");
        write(&posts.join("plain.md"), "Just prose.\n");
        write(
            &posts.join("backwards.md"),
            "---\ntitle: Backwards\ndate: 2024-05-02\nmodified: 2024-05-01\n---\n",
        );

        let store = ContentStore::load(&Site::new(dir.path()).unwrap()).unwrap();
        assert_eq!(store.len(), 4);

        let errors: Vec<_> = store
            .diagnostics()
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| d.file.as_str())
            .collect();
        assert_eq!(
            errors,
            vec![
                "source/_posts/backwards.md",
                "source/_posts/no-date.md",
                "source/_posts/plain.md",
            ]
        );
    }

    #[test]
    fn test_duplicate_slug() {
        let dir = fixture();
        write(
            &dir.path().join("source/_posts/one-again.md"),
            &post("One", "2024-01-01", ""),
        );

        let store = ContentStore::load(&Site::new(dir.path()).unwrap()).unwrap();
        assert_eq!(store.len(), 4);
        let dup: Vec<_> = store
            .diagnostics()
            .iter()
            .filter(|d| d.message.contains("already used"))
            .collect();
        assert_eq!(dup.len(), 1);
        assert_eq!(dup[0].file, "source/_posts/one.md");
        assert!(dup[0].message.contains("_posts/one-again.md"));
    }

    #[test]
    fn test_exclude_patterns() {
        let dir = fixture();
        let config = SiteConfig {
            exclude: vec!["_posts/nested/**".to_string()],
            ..Default::default()
        };
        let site = Site::with_config(dir.path().to_path_buf(), config);
        let store = ContentStore::load(&site).unwrap();
        assert!(store.get("2024-03-01-three").is_err());
        assert_eq!(store.posts().count(), 2);
    }

    #[test]
    fn test_lint_warnings_are_collected() {
        let dir = fixture();
        write(
            &dir.path().join("source/_posts/caption.md"),
            "---\ntitle: Caption\ndate: 2023-01-01\nimage_caption: no image\ntags: [CPP]\n---\n",
        );

        let store = ContentStore::load(&Site::new(dir.path()).unwrap()).unwrap();
        let warnings: Vec<_> = store
            .diagnostics()
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .collect();
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|d| d.file.starts_with("source/_posts/")));
    }
}
