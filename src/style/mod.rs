//! Stylesheet model and checks
//!
//! The site ships one CSS3 stylesheet. Cascade and specificity are the
//! browser's business; this module parses the source into rules so that it
//! can be listed and checked for mistakes such as accidental custom-property
//! shadowing in `:root`.

mod lint;
mod parser;

pub use lint::{lint, Finding};
pub use parser::{
    AtRule, AtRuleBody, Declaration, Item, Parser, StyleError, StyleRule, Stylesheet,
};

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref VAR_REF: Regex = Regex::new(r"var\(\s*(--[^\s,)]+)\s*(,)?").unwrap();
}

/// A style rule together with the at-rules enclosing it
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedRule<'a> {
    /// Enclosing at-rule labels, outermost first (`["@media (max-width: 600px)"]`)
    pub context: Vec<String>,
    pub rule: &'a StyleRule,
}

/// One `--name: value` definition
#[derive(Debug, Clone, PartialEq)]
pub struct CustomProperty<'a> {
    pub context: Vec<String>,
    pub selector: String,
    pub in_root: bool,
    pub declaration: &'a Declaration,
}

/// One `var(--name)` use
#[derive(Debug, Clone, PartialEq)]
pub struct VarReference {
    pub name: String,
    pub has_fallback: bool,
    pub line: usize,
}

impl Stylesheet {
    /// Parse CSS source
    pub fn parse(css: &str) -> Result<Self, StyleError> {
        Parser::new(css).parse()
    }

    /// Every style rule in source order, including those nested in at-rules
    pub fn rules(&self) -> Vec<ScopedRule<'_>> {
        let mut rules = Vec::new();
        collect_rules(&self.items, &mut Vec::new(), &mut rules);
        rules
    }

    /// Every custom property definition in source order
    pub fn custom_properties(&self) -> Vec<CustomProperty<'_>> {
        self.rules()
            .into_iter()
            .flat_map(|ScopedRule { context, rule }| {
                rule.declarations
                    .iter()
                    .filter(|d| d.is_custom_property())
                    .map(move |declaration| CustomProperty {
                        context: context.clone(),
                        selector: rule.selector_text(),
                        in_root: rule.is_root(),
                        declaration,
                    })
            })
            .collect()
    }

    /// Names registered with `@property`
    pub fn registered_properties(&self) -> Vec<&str> {
        let mut names = Vec::new();
        visit_at_rules(&self.items, &mut |at| {
            if at.name == "property" {
                names.push(at.prelude.as_str());
            }
        });
        names
    }

    /// Distinct `@media` conditions, in order of first appearance
    pub fn breakpoints(&self) -> Vec<&str> {
        let mut breakpoints: Vec<&str> = Vec::new();
        visit_at_rules(&self.items, &mut |at| {
            if at.name == "media" && !breakpoints.contains(&at.prelude.as_str()) {
                breakpoints.push(at.prelude.as_str());
            }
        });
        breakpoints
    }

    /// Every `var()` reference in declaration values
    pub fn var_references(&self) -> Vec<VarReference> {
        let mut refs = Vec::new();
        let mut scan = |declarations: &[Declaration]| {
            for d in declarations {
                for cap in VAR_REF.captures_iter(&d.value) {
                    refs.push(VarReference {
                        name: cap[1].to_string(),
                        has_fallback: cap.get(2).is_some(),
                        line: d.line,
                    });
                }
            }
        };
        visit_declaration_blocks(&self.items, &mut scan);
        refs
    }
}

fn collect_rules<'a>(items: &'a [Item], context: &mut Vec<String>, out: &mut Vec<ScopedRule<'a>>) {
    for item in items {
        match item {
            Item::Rule(rule) => out.push(ScopedRule {
                context: context.clone(),
                rule,
            }),
            Item::AtRule(at) => {
                if let AtRuleBody::Rules(inner) = &at.body {
                    context.push(at.label());
                    collect_rules(inner, context, out);
                    context.pop();
                }
            }
        }
    }
}

fn visit_at_rules<'a>(items: &'a [Item], f: &mut dyn FnMut(&'a AtRule)) {
    for item in items {
        if let Item::AtRule(at) = item {
            f(at);
            if let AtRuleBody::Rules(inner) = &at.body {
                visit_at_rules(inner, f);
            }
        }
    }
}

fn visit_declaration_blocks(items: &[Item], f: &mut dyn FnMut(&[Declaration])) {
    for item in items {
        match item {
            Item::Rule(rule) => f(&rule.declarations),
            Item::AtRule(at) => match &at.body {
                AtRuleBody::Declarations(declarations) => f(declarations),
                AtRuleBody::Rules(inner) => visit_declaration_blocks(inner, f),
                AtRuleBody::None => {}
            },
        }
    }
}
