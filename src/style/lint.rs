//! Stylesheet checks

use std::collections::{HashMap, HashSet};

use super::{AtRuleBody, Declaration, Item, Stylesheet};
use crate::check::{Diagnostic, Severity};

/// A stylesheet problem, not yet tied to a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub line: usize,
    pub message: String,
}

impl Finding {
    fn new(severity: Severity, line: usize, message: String) -> Self {
        Self {
            severity,
            line,
            message,
        }
    }

    pub fn into_diagnostic(self, file: &str) -> Diagnostic {
        Diagnostic::new(self.severity, file, Some(self.line), self.message)
    }
}

/// Check a parsed stylesheet, findings in line order
pub fn lint(sheet: &Stylesheet) -> Vec<Finding> {
    let mut findings = Vec::new();
    root_redefinitions(sheet, &mut findings);
    repeated_declarations(&sheet.items, &mut findings);
    undefined_and_unused(sheet, &mut findings);
    empty_rules(sheet, &mut findings);
    findings.sort_by_key(|f| f.line);
    findings
}

/// `:root` custom properties set twice under the same at-rule context
///
/// A second definition under a different context (a dark-mode media query,
/// say) is an override and fine.
fn root_redefinitions(sheet: &Stylesheet, findings: &mut Vec<Finding>) {
    let mut seen: HashMap<(Vec<String>, &str), usize> = HashMap::new();

    for prop in sheet.custom_properties().into_iter().filter(|p| p.in_root) {
        let name = prop.declaration.name.as_str();
        let line = prop.declaration.line;
        let key = (prop.context, name);
        if let Some(first) = seen.get(&key).copied() {
            findings.push(Finding::new(
                Severity::Warning,
                line,
                format!(
                    "`{}` is redefined in `:root`{}, shadowing the definition on line {}",
                    name,
                    describe_context(&key.0),
                    first
                ),
            ));
        } else {
            seen.insert(key, line);
        }
    }
}

/// The same property twice in one block
///
/// Different values for a regular property are the usual fallback pattern
/// (`display: -webkit-box; display: flex`). Identical values are redundant,
/// and a custom property set twice only ever keeps the second value.
fn repeated_declarations(items: &[Item], findings: &mut Vec<Finding>) {
    for item in items {
        match item {
            Item::Rule(rule) => {
                // :root custom properties are covered by root_redefinitions
                check_block(&rule.declarations, rule.is_root(), findings)
            }
            Item::AtRule(at) => match &at.body {
                AtRuleBody::Declarations(declarations) => {
                    check_block(declarations, false, findings)
                }
                AtRuleBody::Rules(inner) => repeated_declarations(inner, findings),
                AtRuleBody::None => {}
            },
        }
    }
}

fn check_block(declarations: &[Declaration], in_root: bool, findings: &mut Vec<Finding>) {
    let mut seen: HashMap<&str, &Declaration> = HashMap::new();

    for d in declarations {
        if in_root && d.is_custom_property() {
            continue;
        }
        if let Some(first) = seen.get(d.name.as_str()) {
            if first.value == d.value && first.important == d.important {
                findings.push(Finding::new(
                    Severity::Warning,
                    d.line,
                    format!(
                        "`{}: {}` repeats the declaration on line {}",
                        d.name, d.value, first.line
                    ),
                ));
            } else if d.is_custom_property() {
                findings.push(Finding::new(
                    Severity::Warning,
                    d.line,
                    format!(
                        "`{}` is set twice in this block; the value from line {} is never used",
                        d.name, first.line
                    ),
                ));
            }
        }
        seen.insert(d.name.as_str(), d);
    }
}

fn undefined_and_unused(sheet: &Stylesheet, findings: &mut Vec<Finding>) {
    let props = sheet.custom_properties();
    let mut defined: HashSet<&str> = props
        .iter()
        .map(|p| p.declaration.name.as_str())
        .collect();
    defined.extend(sheet.registered_properties());

    let refs = sheet.var_references();
    let referenced: HashSet<&str> = refs.iter().map(|r| r.name.as_str()).collect();

    for r in &refs {
        if !r.has_fallback && !defined.contains(r.name.as_str()) {
            findings.push(Finding::new(
                Severity::Warning,
                r.line,
                format!(
                    "`var({})` refers to a custom property that is never defined",
                    r.name
                ),
            ));
        }
    }

    let mut reported = HashSet::new();
    for p in &props {
        let name = p.declaration.name.as_str();
        if !referenced.contains(name) && reported.insert(name) {
            findings.push(Finding::new(
                Severity::Info,
                p.declaration.line,
                format!("`{}` is defined but never used", name),
            ));
        }
    }
}

fn empty_rules(sheet: &Stylesheet, findings: &mut Vec<Finding>) {
    for scoped in sheet.rules() {
        if scoped.rule.declarations.is_empty() {
            findings.push(Finding::new(
                Severity::Info,
                scoped.rule.line,
                format!("`{}` has no declarations", scoped.rule.selector_text()),
            ));
        }
    }
}

fn describe_context(context: &[String]) -> String {
    if context.is_empty() {
        String::new()
    } else {
        format!(" inside `{}`", context.join(" > "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lint_css(css: &str) -> Vec<Finding> {
        lint(&Stylesheet::parse(css).unwrap())
    }

    #[test]
    fn test_clean_stylesheet() {
        let css = r#":root { --bg: #fff; --fg: #111; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #000; --fg: #eee; }
}
body { background: var(--bg); color: var(--fg); }
.card { display: -webkit-box; display: flex; }
a:hover, a:active { color: var(--accent, blue); }
"#;
        assert_eq!(lint_css(css), Vec::new());
    }

    #[test]
    fn test_root_shadowing_in_same_context() {
        let css = ":root {\n  --accent: red;\n}\n:root {\n  --accent: blue;\n}\na { color: var(--accent); }\n";
        let findings = lint_css(css);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[0].line, 5);
        assert!(findings[0].message.contains("line 2"));
    }

    #[test]
    fn test_root_shadowing_within_one_media_query() {
        let css = "@media print {\n  :root { --fg: #000; }\n  :root { --fg: #111; }\n}\np { color: var(--fg); }\n";
        let findings = lint_css(css);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("inside `@media print`"));
    }

    #[test]
    fn test_root_shadowing_in_one_block() {
        let css = ":root {\n  --gap: 1rem;\n  --gap: 2rem;\n}\nmain { gap: var(--gap); }\n";
        let findings = lint_css(css);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 3);
    }

    #[test]
    fn test_repeated_declarations() {
        let css = "p {\n  margin: 0;\n  margin: 0;\n  --x: 1;\n  --x: 2;\n  width: var(--x);\n}\n";
        let findings = lint_css(css);
        let lines: Vec<_> = findings.iter().map(|f| f.line).collect();
        assert_eq!(lines, vec![3, 5]);
    }

    #[test]
    fn test_undefined_and_unused() {
        let css = ":root { --unused: 1px; }\nh1 { color: var(--missing); }\n";
        let findings = lint_css(css);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].severity, Severity::Info);
        assert!(findings[0].message.contains("--unused"));
        assert_eq!(findings[1].severity, Severity::Warning);
        assert!(findings[1].message.contains("--missing"));
    }

    #[test]
    fn test_registered_property_counts_as_defined() {
        let css = "@property --angle { syntax: \"<angle>\"; inherits: false; initial-value: 0deg; }\n.spin { rotate: var(--angle); }\n";
        assert!(lint_css(css).is_empty());
    }

    #[test]
    fn test_empty_rule() {
        let findings = lint_css(".todo {}\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Info);
    }

    #[test]
    fn test_into_diagnostic() {
        let finding = lint_css(".todo {}\n").remove(0);
        let d = finding.into_diagnostic("source/css/style.css");
        assert_eq!(d.file, "source/css/style.css");
        assert_eq!(d.line, Some(1));
    }

    #[test]
    fn test_non_ascii_custom_property() {
        let css = r#":root { --fg-é: red; --größe: 2rem; }
a { color: var(--fg-é); margin: var(--größe); }
"#;
        assert_eq!(lint_css(css), Vec::new());
    }
}
