//! CSS parser: rules, declarations and at-rules, with line numbers

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Stylesheet syntax errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StyleError {
    #[error("line {line}: unterminated comment")]
    UnterminatedComment { line: usize },

    #[error("line {line}: unterminated string")]
    UnterminatedString { line: usize },

    #[error("line {line}: block is never closed")]
    UnclosedBlock { line: usize },

    #[error("line {line}: unexpected `}}`")]
    UnexpectedCloseBrace { line: usize },

    #[error("line {line}: expected `{{` after {what}")]
    MissingBlock { line: usize, what: String },

    #[error("line {line}: empty selector")]
    EmptySelector { line: usize },

    #[error("line {line}: expected `:` in declaration {text:?}")]
    MissingColon { line: usize, text: String },

    #[error("line {line}: declaration has no property name")]
    EmptyProperty { line: usize },

    #[error("line {line}: `{name}` has no value")]
    EmptyValue { line: usize, name: String },
}

impl StyleError {
    pub fn line(&self) -> usize {
        match self {
            StyleError::UnterminatedComment { line }
            | StyleError::UnterminatedString { line }
            | StyleError::UnclosedBlock { line }
            | StyleError::UnexpectedCloseBrace { line }
            | StyleError::MissingBlock { line, .. }
            | StyleError::EmptySelector { line }
            | StyleError::MissingColon { line, .. }
            | StyleError::EmptyProperty { line }
            | StyleError::EmptyValue { line, .. } => *line,
        }
    }
}

// ============================================================================
// Syntax tree
// ============================================================================

/// A parsed stylesheet, in source order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stylesheet {
    pub items: Vec<Item>,
}

/// Top-level or nested stylesheet entry
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Rule(StyleRule),
    AtRule(AtRule),
}

/// `selector, selector { declarations }`
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    pub selectors: Vec<String>,
    pub declarations: Vec<Declaration>,
    pub line: usize,
}

impl StyleRule {
    /// Whether one of the selectors is exactly `:root`
    pub fn is_root(&self) -> bool {
        self.selectors.iter().any(|s| s == ":root")
    }

    pub fn selector_text(&self) -> String {
        self.selectors.join(", ")
    }
}

/// `name: value [!important]`
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Lowercased, except custom properties which are case-sensitive
    pub name: String,
    pub value: String,
    pub important: bool,
    pub line: usize,
}

impl Declaration {
    pub fn is_custom_property(&self) -> bool {
        self.name.starts_with("--")
    }
}

/// `@name prelude;` or `@name prelude { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct AtRule {
    /// Lowercased name without the `@`
    pub name: String,
    pub prelude: String,
    pub body: AtRuleBody,
    pub line: usize,
}

impl AtRule {
    /// `@media (max-width: 600px)` style label
    pub fn label(&self) -> String {
        if self.prelude.is_empty() {
            format!("@{}", self.name)
        } else {
            format!("@{} {}", self.name, self.prelude)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AtRuleBody {
    /// Statement at-rule such as `@import` or `@charset`
    None,
    /// `@font-face`, `@page` and friends hold declarations
    Declarations(Vec<Declaration>),
    /// `@media`, `@supports`, `@keyframes` and friends hold rules
    Rules(Vec<Item>),
}

/// At-rules whose block is a declaration list rather than a rule list
const DECLARATION_AT_RULES: &[&str] = &[
    "font-face",
    "page",
    "counter-style",
    "property",
    "font-palette-values",
    "viewport",
];

// ============================================================================
// Parser
// ============================================================================

/// Recursive-descent parser over characters
pub struct Parser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Parser {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    /// Parse the whole input
    pub fn parse(mut self) -> Result<Stylesheet, StyleError> {
        let items = self.parse_items(None)?;
        Ok(Stylesheet { items })
    }

    /// Parse rules until EOF (top level) or the `}` closing a block opened on `open_line`
    fn parse_items(&mut self, open_line: Option<usize>) -> Result<Vec<Item>, StyleError> {
        let mut items = Vec::new();

        loop {
            self.skip_trivia()?;

            match self.current_char() {
                None => {
                    return match open_line {
                        Some(line) => Err(StyleError::UnclosedBlock { line }),
                        None => Ok(items),
                    };
                }
                Some('}') => {
                    if open_line.is_some() {
                        self.advance();
                        return Ok(items);
                    }
                    return Err(StyleError::UnexpectedCloseBrace { line: self.line });
                }
                // Stray semicolons between rules are harmless
                Some(';') => self.advance(),
                // HTML comment tokens are allowed at the top level of a stylesheet
                Some('<') if open_line.is_none() && self.starts_with("<!--") => self.pos += 4,
                Some('-') if open_line.is_none() && self.starts_with("-->") => self.pos += 3,
                Some('@') => items.push(Item::AtRule(self.parse_at_rule()?)),
                Some(_) => items.push(Item::Rule(self.parse_style_rule()?)),
            }
        }
    }

    fn parse_at_rule(&mut self) -> Result<AtRule, StyleError> {
        let line = self.line;
        self.advance(); // Skip @

        let mut name = String::new();
        while let Some(c) = self.current_char() {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                name.push(c.to_ascii_lowercase());
                self.advance();
            } else {
                break;
            }
        }

        let (prelude, terminator) = self.read_until(&['{', ';', '}'])?;
        let prelude = collapse_whitespace(&prelude);

        let body = match terminator {
            Some(';') => {
                self.advance();
                AtRuleBody::None
            }
            Some('{') => {
                let open_line = self.line;
                self.advance();
                if DECLARATION_AT_RULES.contains(&name.as_str()) {
                    AtRuleBody::Declarations(self.parse_declarations(open_line)?)
                } else {
                    AtRuleBody::Rules(self.parse_items(Some(open_line))?)
                }
            }
            // `@import url(x.css)` as the last thing in a block or file
            _ => AtRuleBody::None,
        };

        Ok(AtRule {
            name,
            prelude,
            body,
            line,
        })
    }

    fn parse_style_rule(&mut self) -> Result<StyleRule, StyleError> {
        let line = self.line;
        let (prelude, terminator) = self.read_until(&['{', ';', '}'])?;

        if terminator != Some('{') {
            return Err(StyleError::MissingBlock {
                line,
                what: format!("selector {:?}", collapse_whitespace(&prelude)),
            });
        }
        let open_line = self.line;
        self.advance();

        let selectors = split_top_level(&prelude, ',')
            .into_iter()
            .map(|s| collapse_whitespace(&s))
            .collect::<Vec<_>>();
        if selectors.iter().any(|s| s.is_empty()) {
            return Err(StyleError::EmptySelector { line });
        }

        let declarations = self.parse_declarations(open_line)?;

        Ok(StyleRule {
            selectors,
            declarations,
            line,
        })
    }

    /// Parse declarations up to and including the closing `}`
    fn parse_declarations(&mut self, open_line: usize) -> Result<Vec<Declaration>, StyleError> {
        let mut declarations = Vec::new();

        loop {
            self.skip_trivia()?;

            match self.current_char() {
                None => return Err(StyleError::UnclosedBlock { line: open_line }),
                Some('}') => {
                    self.advance();
                    return Ok(declarations);
                }
                Some(';') => self.advance(),
                Some(_) => declarations.push(self.parse_declaration()?),
            }
        }
    }

    fn parse_declaration(&mut self) -> Result<Declaration, StyleError> {
        let line = self.line;

        let (name, terminator) = self.read_until(&[':', ';', '{', '}'])?;
        if terminator != Some(':') {
            return Err(StyleError::MissingColon {
                line,
                text: collapse_whitespace(&name),
            });
        }
        self.advance(); // Skip :

        let name = name.trim();
        if name.is_empty() {
            return Err(StyleError::EmptyProperty { line });
        }
        let name = if name.starts_with("--") {
            name.to_string()
        } else {
            name.to_ascii_lowercase()
        };

        let (value, _) = self.read_until(&[';', '}'])?;
        let (value, important) = strip_important(value.trim());
        // `--x: ;` is a valid (guaranteed-invalid) custom property value
        if value.is_empty() && !name.starts_with("--") {
            return Err(StyleError::EmptyValue { line, name });
        }

        Ok(Declaration {
            name,
            value,
            important,
            line,
        })
    }

    /// Read text up to (not including) one of `stops` at nesting depth 0
    ///
    /// Strings are kept verbatim, comments are dropped, and stops inside
    /// `()` or `[]` don't count. Returns the stop found, or `None` at EOF.
    fn read_until(&mut self, stops: &[char]) -> Result<(String, Option<char>), StyleError> {
        let mut text = String::new();
        let mut depth = 0usize;

        while let Some(c) = self.current_char() {
            if depth == 0 && stops.contains(&c) {
                return Ok((text, Some(c)));
            }
            match c {
                '/' if self.starts_with("/*") => {
                    self.skip_comment()?;
                    text.push(' ');
                    continue;
                }
                '"' | '\'' => {
                    text.push_str(&self.read_string()?);
                    continue;
                }
                '\\' => {
                    // Escaped character, taken literally
                    text.push(c);
                    self.advance();
                    if let Some(next) = self.current_char() {
                        text.push(next);
                        self.advance();
                    }
                    continue;
                }
                '(' | '[' => depth += 1,
                ')' | ']' => depth = depth.saturating_sub(1),
                _ => {}
            }
            text.push(c);
            self.advance();
        }

        Ok((text, None))
    }

    /// Read a quoted string including its quotes
    fn read_string(&mut self) -> Result<String, StyleError> {
        let line = self.line;
        let quote = self.current_char().unwrap_or('"');
        let mut text = String::new();
        text.push(quote);
        self.advance();

        while let Some(c) = self.current_char() {
            match c {
                '\\' => {
                    text.push(c);
                    self.advance();
                    // An escaped newline continues the string
                    if let Some(next) = self.current_char() {
                        text.push(next);
                        self.advance();
                    }
                }
                '\n' => return Err(StyleError::UnterminatedString { line }),
                _ if c == quote => {
                    text.push(c);
                    self.advance();
                    return Ok(text);
                }
                _ => {
                    text.push(c);
                    self.advance();
                }
            }
        }

        Err(StyleError::UnterminatedString { line })
    }

    /// Skip whitespace and comments
    fn skip_trivia(&mut self) -> Result<(), StyleError> {
        loop {
            match self.current_char() {
                Some(c) if c.is_whitespace() => self.advance(),
                Some('/') if self.starts_with("/*") => self.skip_comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn skip_comment(&mut self) -> Result<(), StyleError> {
        let line = self.line;
        self.pos += 2; // Skip /*
        while self.current_char().is_some() {
            if self.starts_with("*/") {
                self.pos += 2;
                return Ok(());
            }
            self.advance();
        }
        Err(StyleError::UnterminatedComment { line })
    }

    fn starts_with(&self, s: &str) -> bool {
        let mut i = self.pos;
        for c in s.chars() {
            if self.chars.get(i) != Some(&c) {
                return false;
            }
            i += 1;
        }
        true
    }

    fn current_char(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Move past the current character, tracking lines
    fn advance(&mut self) {
        if self.current_char() == Some('\n') {
            self.line += 1;
        }
        self.pos += 1;
    }
}

/// Split on `sep` outside parentheses, brackets and strings
fn split_top_level(text: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in text.chars() {
        if escaped {
            escaped = false;
            current.push(c);
            continue;
        }
        match (quote, c) {
            (_, '\\') => escaped = true,
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, _) if c == sep && depth == 0 => {
                parts.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    parts.push(current);
    parts
}

/// Collapse runs of whitespace outside strings into single spaces
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::new();
    let mut quote: Option<char> = None;
    let mut pending_space = false;

    for c in text.trim().chars() {
        match quote {
            Some(q) => {
                out.push(c);
                if c == q {
                    quote = None;
                }
            }
            None if c.is_whitespace() => pending_space = true,
            None => {
                if pending_space && !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
                if c == '"' || c == '\'' {
                    quote = Some(c);
                }
                out.push(c);
            }
        }
    }
    out
}

/// Split a trailing `!important` off a declaration value
fn strip_important(value: &str) -> (String, bool) {
    if let Some(bang) = value.rfind('!') {
        let flag = value[bang + 1..].trim();
        if flag.eq_ignore_ascii_case("important") {
            return (collapse_whitespace(&value[..bang]), true);
        }
    }
    (collapse_whitespace(value), false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(css: &str) -> Stylesheet {
        Parser::new(css).parse().unwrap()
    }

    fn rule(item: &Item) -> &StyleRule {
        match item {
            Item::Rule(rule) => rule,
            other => panic!("expected a style rule, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rules_and_declarations() {
        let sheet = parse(
            "/* site */\n:root {\n  --fg: #222;\n  --font: \"Fira Sans\", sans-serif;\n}\n\nh1, h2 > a:hover {\n  COLOR: var(--fg) !important;\n  margin: 0 auto\n}\n",
        );
        assert_eq!(sheet.items.len(), 2);

        let root = rule(&sheet.items[0]);
        assert!(root.is_root());
        assert_eq!(root.line, 2);
        assert_eq!(root.declarations[0].name, "--fg");
        assert_eq!(root.declarations[0].line, 3);
        assert_eq!(root.declarations[1].value, "\"Fira Sans\", sans-serif");

        let headings = rule(&sheet.items[1]);
        assert_eq!(headings.selectors, vec!["h1", "h2 > a:hover"]);
        assert_eq!(headings.declarations[0].name, "color");
        assert_eq!(headings.declarations[0].value, "var(--fg)");
        assert!(headings.declarations[0].important);
        assert_eq!(headings.declarations[1].value, "0 auto");
        assert_eq!(headings.declarations[1].line, 9);
    }

    #[test]
    fn test_parse_at_rules() {
        let sheet = parse(
            "@charset \"utf-8\";\n@import url(\"fonts.css\");\n@media (max-width: 600px) {\n  body { font-size: 14px; }\n  @supports (display: grid) { .grid { display: grid; } }\n}\n@font-face { font-family: Mono; src: url(mono.woff2); }\n@keyframes spin { from { transform: rotate(0); } to { transform: rotate(1turn); } }\n",
        );
        assert_eq!(sheet.items.len(), 5);

        let Item::AtRule(media) = &sheet.items[2] else {
            panic!("expected @media");
        };
        assert_eq!(media.name, "media");
        assert_eq!(media.label(), "@media (max-width: 600px)");
        let AtRuleBody::Rules(inner) = &media.body else {
            panic!("expected nested rules");
        };
        assert_eq!(inner.len(), 2);

        let Item::AtRule(font) = &sheet.items[3] else {
            panic!("expected @font-face");
        };
        assert!(matches!(&font.body, AtRuleBody::Declarations(d) if d.len() == 2));

        let Item::AtRule(spin) = &sheet.items[4] else {
            panic!("expected @keyframes");
        };
        assert!(matches!(&spin.body, AtRuleBody::Rules(r) if r.len() == 2));
    }

    #[test]
    fn test_braces_and_semicolons_inside_strings_and_urls() {
        let sheet = parse(
            "a[title=\"x{y}\"]::after { content: \"; }\"; background: url(data:image/png;base64,AAA=); }",
        );
        let a = rule(&sheet.items[0]);
        assert_eq!(a.selectors, vec!["a[title=\"x{y}\"]::after"]);
        assert_eq!(a.declarations[0].value, "\"; }\"");
        assert_eq!(a.declarations[1].value, "url(data:image/png;base64,AAA=)");
    }

    #[test]
    fn test_selector_list_with_functional_pseudo_classes() {
        let sheet = parse(":is(nav, footer) a,\n  button:not(.primary, .ghost) { color: red }");
        let r = rule(&sheet.items[0]);
        assert_eq!(
            r.selectors,
            vec![":is(nav, footer) a", "button:not(.primary, .ghost)"]
        );
    }

    #[test]
    fn test_comments_everywhere() {
        let sheet = parse("a /* link */ { /* c */ color /* x */ : red /* y */; }");
        let a = rule(&sheet.items[0]);
        assert_eq!(a.selectors, vec!["a"]);
        assert_eq!(a.declarations[0].name, "color");
        assert_eq!(a.declarations[0].value, "red");
    }

    #[test]
    fn test_empty_custom_property_value_is_allowed() {
        let sheet = parse(":root { --unset: ; }");
        assert_eq!(rule(&sheet.items[0]).declarations[0].value, "");
    }

    #[test]
    fn test_errors() {
        let err = |css: &str| Parser::new(css).parse().unwrap_err();

        assert_eq!(
            err("a { color: red;\n"),
            StyleError::UnclosedBlock { line: 1 }
        );
        assert_eq!(
            err("a { color: red; }\n}"),
            StyleError::UnexpectedCloseBrace { line: 2 }
        );
        assert_eq!(
            err("/* open\n\na {}"),
            StyleError::UnterminatedComment { line: 1 }
        );
        assert_eq!(
            err("a { content: \"oops\n }"),
            StyleError::UnterminatedString { line: 1 }
        );
        assert_eq!(
            err("a {\n  color red;\n}"),
            StyleError::MissingColon {
                line: 2,
                text: "color red".to_string()
            }
        );
        assert_eq!(err("a { : red }"), StyleError::EmptyProperty { line: 1 });
        assert_eq!(
            err("a { color: ; }"),
            StyleError::EmptyValue {
                line: 1,
                name: "color".to_string()
            }
        );
        assert_eq!(err("a, , b { }"), StyleError::EmptySelector { line: 1 });
        assert!(matches!(err("a b c"), StyleError::MissingBlock { line: 1, .. }));
        assert!(matches!(
            err("@media screen {\n a { color: red; }\n"),
            StyleError::UnclosedBlock { line: 1 }
        ));
    }

    #[test]
    fn test_html_comment_tokens_at_top_level() {
        let sheet = parse("<!--\na { color: red }\n-->");
        assert_eq!(sheet.items.len(), 1);
    }
}
