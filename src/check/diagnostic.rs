//! Diagnostics and reports

use serde::Serialize;
use std::fmt;

/// How serious a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => f.write_str("info"),
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// A single finding about one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// File path, relative to the site root
    pub file: String,
    pub line: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        file: impl Into<String>,
        line: Option<usize>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    pub fn error(file: impl Into<String>, line: Option<usize>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, file, line, message)
    }

    pub fn warning(
        file: impl Into<String>,
        line: Option<usize>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Warning, file, line, message)
    }

    pub fn info(file: impl Into<String>, line: Option<usize>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, file, line, message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(
                f,
                "{}: {}:{}: {}",
                self.severity, self.file, line, self.message
            ),
            None => write!(f, "{}: {}: {}", self.severity, self.file, self.message),
        }
    }
}

/// Diagnostics gathered by a check run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    /// Diagnostics in the order they were found
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics ordered by file, then line, most severe first
    pub fn sorted(&self) -> Vec<&Diagnostic> {
        let mut sorted: Vec<_> = self.diagnostics.iter().collect();
        sorted.sort_by(|a, b| {
            a.file
                .cmp(&b.file)
                .then(a.line.unwrap_or(0).cmp(&b.line.unwrap_or(0)))
                .then(b.severity.cmp(&a.severity))
        });
        sorted
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    /// No errors; with `strict`, no warnings either
    pub fn is_clean(&self, strict: bool) -> bool {
        !self.has_errors() && !(strict && self.count(Severity::Warning) > 0)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} errors, {} warnings, {} notes",
            self.count(Severity::Error),
            self.count(Severity::Warning),
            self.count(Severity::Info)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let d = Diagnostic::error("source/_posts/a.md", Some(3), "missing required key `date`");
        assert_eq!(
            d.to_string(),
            "error: source/_posts/a.md:3: missing required key `date`"
        );
        let d = Diagnostic::info("source/css/style.css", None, "unused");
        assert_eq!(d.to_string(), "info: source/css/style.css: unused");
    }

    #[test]
    fn test_report_counts_and_strictness() {
        let mut report = Report::default();
        assert!(report.is_clean(true));

        report.push(Diagnostic::info("a", None, "note"));
        assert!(report.is_clean(true));

        report.push(Diagnostic::warning("b", Some(1), "warn"));
        assert!(report.is_clean(false));
        assert!(!report.is_clean(true));

        report.push(Diagnostic::error("a", Some(2), "err"));
        assert!(!report.is_clean(false));
        assert_eq!(report.summary(), "1 errors, 1 warnings, 1 notes");
    }

    #[test]
    fn test_sorted_by_file_and_line() {
        let mut report = Report::default();
        report.push(Diagnostic::warning("b.md", Some(1), "x"));
        report.push(Diagnostic::error("a.md", Some(9), "y"));
        report.push(Diagnostic::info("a.md", Some(2), "z"));
        let order: Vec<_> = report
            .sorted()
            .iter()
            .map(|d| (d.file.as_str(), d.line))
            .collect();
        assert_eq!(order, vec![("a.md", Some(2)), ("a.md", Some(9)), ("b.md", Some(1))]);
    }
}
