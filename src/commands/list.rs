//! List site content

use anyhow::{Context, Result};
use std::fs;

use crate::helpers::format_date;
use crate::style::Stylesheet;
use crate::Site;

/// List site content by type
pub fn run(site: &Site, content_type: &str) -> Result<()> {
    match content_type {
        "post" | "posts" => {
            let store = site.load()?;
            println!("Posts ({}):", store.posts().count());
            for post in store.posts() {
                println!(
                    "  {} - {} [{}]",
                    format_date(&post.date, &site.config.date_format),
                    post.title,
                    post.slug
                );
            }
        }
        "resume" => {
            let store = site.load()?;
            match store.resume() {
                Some(resume) => println!(
                    "{} [{}] updated {}",
                    resume.title,
                    resume.source,
                    format_date(&resume.last_modified(), &site.config.date_format)
                ),
                None => println!("No résumé at {}", site.relative(&site.resume_path)),
            }
        }
        "tag" | "tags" => {
            let store = site.load()?;
            let mut tags: Vec<_> = store.tags().into_iter().collect();
            tags.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
            println!("Tags ({}):", tags.len());
            for (tag, count) in tags {
                println!("  {} ({})", tag, count);
            }
        }
        "rule" | "rules" => {
            let sheet = load_stylesheet(site)?;
            let rules = sheet.rules();
            println!("Rules ({}):", rules.len());
            for scoped in rules {
                let indent = "  ".repeat(scoped.context.len() + 1);
                if let Some(context) = scoped.context.last() {
                    println!(
                        "{}{} {{{}}} ({})",
                        indent,
                        scoped.rule.selector_text(),
                        scoped.rule.declarations.len(),
                        context
                    );
                } else {
                    println!(
                        "{}{} {{{}}}",
                        indent,
                        scoped.rule.selector_text(),
                        scoped.rule.declarations.len()
                    );
                }
            }
        }
        "var" | "vars" => {
            let sheet = load_stylesheet(site)?;
            let props = sheet.custom_properties();
            println!("Custom properties ({}):", props.len());
            for prop in props {
                let scope = match prop.context.last() {
                    Some(context) => format!("{} {}", prop.selector, context),
                    None => prop.selector.clone(),
                };
                println!(
                    "  {}: {} [{}] line {}",
                    prop.declaration.name, prop.declaration.value, scope, prop.declaration.line
                );
            }
        }
        "breakpoint" | "breakpoints" => {
            let sheet = load_stylesheet(site)?;
            let breakpoints = sheet.breakpoints();
            println!("Media queries ({}):", breakpoints.len());
            for condition in breakpoints {
                println!("  @media {}", condition);
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, resume, tag, rule, var, breakpoint",
                content_type
            );
        }
    }

    Ok(())
}

fn load_stylesheet(site: &Site) -> Result<Stylesheet> {
    let css = fs::read_to_string(&site.stylesheet_path)
        .with_context(|| format!("Failed to read {:?}", site.stylesheet_path))?;
    Ok(Stylesheet::parse(&css)?)
}
