//! Content checks that warn but do not reject a document

use std::collections::{BTreeMap, HashSet};

use super::{Document, FrontMatter};
use crate::check::Diagnostic;
use crate::config::SiteConfig;

/// Keys that are easy to misspell, and what was probably meant
const NEAR_MISSES: &[(&str, &str)] = &[
    ("tag", "tags"),
    ("Tags", "tags"),
    ("Title", "title"),
    ("Date", "date"),
    ("update", "modified"),
    ("last_modified", "modified"),
    ("desc", "description"),
    ("summary", "description"),
    ("caption", "image_caption"),
    ("imageCaption", "image_caption"),
    ("img", "image"),
];

/// Warnings about a single front-matter block
pub fn front_matter(file: &str, fm: &FrontMatter, config: &SiteConfig) -> Vec<Diagnostic> {
    let mut found = Vec::new();

    let mut seen = HashSet::new();
    for tag in &fm.tags {
        if !seen.insert(tag.as_str()) {
            found.push(Diagnostic::warning(
                file,
                None,
                format!("tag `{}` is listed more than once", tag),
            ));
        }
        if !tag.is_empty() && tag.trim() != tag {
            found.push(Diagnostic::warning(
                file,
                None,
                format!("tag {:?} has leading or trailing whitespace", tag),
            ));
        }
    }

    if fm.image_caption.is_some() && fm.image.is_none() {
        found.push(Diagnostic::warning(
            file,
            None,
            "`image_caption` is set but there is no `image`",
        ));
    }

    if config.require_description
        && fm
            .description
            .as_deref()
            .map_or(true, |d| d.trim().is_empty())
    {
        found.push(Diagnostic::warning(file, None, "missing `description`"));
    }

    for key in fm.extra.keys() {
        if let Some((_, meant)) = NEAR_MISSES.iter().find(|(miss, _)| *miss == key.as_str()) {
            found.push(Diagnostic::warning(
                file,
                None,
                format!("unrecognized key `{}`; did you mean `{}`?", key, meant),
            ));
        }
    }

    found
}

/// Warnings that need the whole collection: tags spelled with different case
pub fn collection<'a>(documents: impl IntoIterator<Item = &'a Document>) -> Vec<Diagnostic> {
    // lowercase tag -> spelling -> first source using it
    let mut spellings: BTreeMap<String, BTreeMap<&str, &str>> = BTreeMap::new();
    for doc in documents {
        for tag in &doc.tags {
            spellings
                .entry(tag.to_lowercase())
                .or_default()
                .entry(tag.as_str())
                .or_insert(doc.source.as_str());
        }
    }

    let mut found = Vec::new();
    for variants in spellings.values().filter(|v| v.len() > 1) {
        let names: Vec<_> = variants.keys().map(|t| format!("`{}`", t)).collect();
        for (tag, source) in variants.iter().skip(1) {
            found.push(Diagnostic::warning(
                *source,
                None,
                format!(
                    "tag `{}` differs only in case from another tag ({})",
                    tag,
                    names.join(", ")
                ),
            ));
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::DocumentKind;

    fn fm(text: &str) -> FrontMatter {
        FrontMatter::parse(text).unwrap().unwrap().0
    }

    #[test]
    fn test_clean_front_matter() {
        let fm = fm("---\ntitle: T\ndate: 2024-01-01\ntags: [a, b]\nimage: x.png\nimage_caption: X\n---\n");
        assert!(front_matter("a.md", &fm, &SiteConfig::default()).is_empty());
    }

    #[test]
    fn test_duplicate_and_padded_tags() {
        let fm = fm("---\ntitle: T\ntags: [a, a, \" b\"]\n---\n");
        let found = front_matter("a.md", &fm, &SiteConfig::default());
        assert_eq!(found.len(), 2);
        assert!(found[0].message.contains("more than once"));
        assert!(found[1].message.contains("whitespace"));
    }

    #[test]
    fn test_caption_without_image() {
        let fm = fm("---\ntitle: T\nimage_caption: lonely\n---\n");
        let found = front_matter("a.md", &fm, &SiteConfig::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].file, "a.md");
    }

    #[test]
    fn test_required_description() {
        let config = SiteConfig {
            require_description: true,
            ..Default::default()
        };
        let fm = fm("---\ntitle: T\n---\n");
        assert_eq!(front_matter("a.md", &fm, &config).len(), 1);
    }

    #[test]
    fn test_near_miss_keys() {
        let fm = fm("---\ntitle: T\ntag: cpp\nlayout: post\n---\n");
        let found = front_matter("a.md", &fm, &SiteConfig::default());
        assert_eq!(found.len(), 1);
        assert!(found[0].message.contains("did you mean `tags`"));
    }

    #[test]
    fn test_case_variant_tags() {
        let a = Document::parse(
            DocumentKind::Post,
            "_posts/a.md",
            "---\ntitle: A\ndate: 2024-01-01\ntags: [C++, gpu]\n---\n",
        )
        .unwrap();
        let b = Document::parse(
            DocumentKind::Post,
            "_posts/b.md",
            "---\ntitle: B\ndate: 2024-01-02\ntags: [c++, gpu]\n---\n",
        )
        .unwrap();
        let found = collection([&a, &b]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].file, "_posts/b.md");
        assert!(found[0].message.contains("`C++`, `c++`"));
    }
}
