//! Print one document

use anyhow::Result;

use crate::content::{markdown, Document};
use crate::helpers::full_date;
use crate::Site;

/// Print a document's front-matter and body, looked up by slug
pub fn run(site: &Site, slug: &str) -> Result<()> {
    let store = site.load()?;
    let doc = store.get(slug)?;

    println!("# {} ({})", doc.title, doc.kind);
    println!("# source: {}", doc.source);
    println!("# url: {}", permalink(site, doc));
    println!(
        "# published {}, {} words, {} min read",
        full_date(&doc.date),
        doc.word_count(),
        doc.reading_minutes(site.config.words_per_minute)
    );
    let sections: Vec<_> = markdown::headings(&doc.body)
        .into_iter()
        .filter(|(level, _)| *level <= 2)
        .map(|(_, text)| text)
        .collect();
    if !sections.is_empty() {
        println!("# sections: {}", sections.join(" | "));
    }
    println!();
    print!("{}", doc.to_markdown()?);

    Ok(())
}

/// Full URL of a document under the site's permalink scheme
pub fn permalink(site: &Site, doc: &Document) -> String {
    site.full_url(&doc.path(&site.config.permalink))
}
