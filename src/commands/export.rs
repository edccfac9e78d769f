//! Export the content store as JSON for the site generator

use anyhow::Result;
use serde::Serialize;
use std::fs;
use std::path::Path;

use super::show::permalink;
use crate::content::{ContentStore, Document};
use crate::Site;

#[derive(Debug, Serialize)]
struct SiteExport<'a> {
    title: &'a str,
    author: &'a str,
    url: &'a str,
    language: &'a str,
    resume: Option<DocumentExport<'a>>,
    posts: Vec<DocumentExport<'a>>,
    tags: Vec<TagExport<'a>>,
}

#[derive(Debug, Serialize)]
struct DocumentExport<'a> {
    #[serde(flatten)]
    document: &'a Document,
    path: String,
    permalink: String,
    excerpt: Option<String>,
    reading_minutes: usize,
}

#[derive(Debug, Serialize)]
struct TagExport<'a> {
    name: &'a str,
    slug: String,
    count: usize,
    posts: Vec<&'a str>,
}

/// Serialize the store to pretty JSON
pub fn to_json(site: &Site, store: &ContentStore) -> Result<String> {
    let tags = store
        .tags()
        .into_iter()
        .map(|(name, count)| TagExport {
            name,
            slug: slug::slugify(name),
            count,
            posts: store.tagged(name).map(|d| d.slug.as_str()).collect(),
        })
        .collect();

    let export = SiteExport {
        title: &site.config.title,
        author: &site.config.author,
        url: &site.config.url,
        language: &site.config.language,
        resume: store.resume().map(|doc| document(site, doc)),
        posts: store.posts().map(|doc| document(site, doc)).collect(),
        tags,
    };

    Ok(serde_json::to_string_pretty(&export)?)
}

fn document<'a>(site: &Site, doc: &'a Document) -> DocumentExport<'a> {
    DocumentExport {
        document: doc,
        path: doc.path(&site.config.permalink),
        permalink: permalink(site, doc),
        excerpt: doc.excerpt(),
        reading_minutes: doc.reading_minutes(site.config.words_per_minute),
    }
}

/// Load the site and write the export to `output`, or stdout
pub fn run(site: &Site, output: Option<&Path>) -> Result<()> {
    let store = site.load()?;
    if !store.diagnostics().is_empty() {
        tracing::warn!(
            "{} problems while loading content; run `folio check` for details",
            store.diagnostics().len()
        );
    }

    let json = to_json(site, &store)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, json)?;
            tracing::info!("Exported {} documents to {:?}", store.len(), path);
        }
        None => println!("{}", json),
    }

    Ok(())
}
