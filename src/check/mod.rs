//! Site checks: diagnostics collected from the content store and the stylesheet

mod diagnostic;

pub use diagnostic::{Diagnostic, Report, Severity};

use anyhow::Result;
use std::fs;

use crate::content::ContentStore;
use crate::style::{self, Stylesheet};
use crate::Site;

/// Load every document and the stylesheet, and collect all diagnostics
pub fn run(site: &Site) -> Result<Report> {
    let start = std::time::Instant::now();
    let mut report = Report::default();

    let store = ContentStore::load(site)?;
    tracing::info!(
        "Loaded {} posts{}",
        store.posts().count(),
        if store.resume().is_some() { " and a résumé" } else { "" }
    );
    report.extend(store.diagnostics().iter().cloned());

    let stylesheet_file = site.relative(&site.stylesheet_path);
    if site.stylesheet_path.exists() {
        match fs::read_to_string(&site.stylesheet_path) {
            Ok(css) => check_stylesheet(&css, &stylesheet_file, &mut report),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", stylesheet_file, e);
                report.push(Diagnostic::error(&stylesheet_file, None, e.to_string()));
            }
        }
    } else {
        tracing::debug!("No stylesheet at {:?}", site.stylesheet_path);
    }

    tracing::info!(
        "Checked in {:.2}s: {}",
        start.elapsed().as_secs_f64(),
        report.summary()
    );

    Ok(report)
}

fn check_stylesheet(css: &str, file: &str, report: &mut Report) {
    match Stylesheet::parse(css) {
        Ok(sheet) => {
            tracing::info!(
                "Parsed stylesheet: {} rules, {} custom properties",
                sheet.rules().len(),
                sheet.custom_properties().len()
            );
            report.extend(
                style::lint(&sheet)
                    .into_iter()
                    .map(|finding| finding.into_diagnostic(file)),
            );
        }
        Err(e) => report.push(Diagnostic::error(file, Some(e.line()), e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_clean_site() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        write(
            &source.join("_posts/a.md"),
            "---\ntitle: A\ndate: 2024-01-01\ntags: [cpp]\n---\nBody\n",
        );
        write(
            &source.join("resume.md"),
            "---\ntitle: Résumé\ndate: 2023-01-01\n---\nExperience\n",
        );
        write(
            &source.join("css/style.css"),
            ":root { --fg: #222; }\nbody { color: var(--fg); }\n",
        );

        let site = Site::new(dir.path()).unwrap();
        let report = run(&site).unwrap();
        assert!(report.is_clean(true), "{:?}", report.diagnostics());
    }

    #[test]
    fn test_reports_errors_from_both_sources() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        write(&source.join("_posts/bad.md"), "---\ntitle: Bad\n---\nBody\n");
        write(&source.join("css/style.css"), "body { color: red;\n");

        let site = Site::new(dir.path()).unwrap();
        let report = run(&site).unwrap();
        assert_eq!(report.count(Severity::Error), 2);

        let files: Vec<_> = report.diagnostics().iter().map(|d| d.file.as_str()).collect();
        assert!(files.contains(&"source/_posts/bad.md"));
        assert!(files.contains(&"source/css/style.css"));
    }

    #[test]
    fn test_stylesheet_warnings() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("source/css/style.css"),
            ":root { --accent: red; }\n:root { --accent: blue; }\na { color: var(--accent); }\n",
        );

        let site = Site::new(dir.path()).unwrap();
        let report = run(&site).unwrap();
        assert_eq!(report.count(Severity::Error), 0);
        assert_eq!(report.count(Severity::Warning), 1);
        assert!(report.is_clean(false));
        assert!(!report.is_clean(true));
    }

    #[test]
    fn test_unreadable_stylesheet_is_a_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        write(
            &source.join("_posts/a.md"),
            "---\ntitle: A\ndate: 2024-01-01\n---\nBody\n",
        );
        fs::create_dir_all(source.join("css")).unwrap();
        fs::write(source.join("css/style.css"), [0xff, 0xfe, b'a', b'{', b'}']).unwrap();

        let site = Site::new(dir.path()).unwrap();
        let report = run(&site).unwrap();
        assert_eq!(report.count(Severity::Error), 1);
        let diagnostic = &report.diagnostics()[0];
        assert_eq!(diagnostic.file, "source/css/style.css");
        assert_eq!(diagnostic.line, None);
    }
}
