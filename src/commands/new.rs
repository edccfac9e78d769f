//! Create a new post

use anyhow::Result;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

use crate::content::FrontMatter;
use crate::Site;

/// Create a post under the posts directory and return its path
pub fn create_post(
    site: &Site,
    title: &str,
    tags: &[String],
    date: Option<NaiveDate>,
) -> Result<PathBuf> {
    if title.trim().is_empty() {
        anyhow::bail!("Title must not be empty");
    }
    if let Some(tag) = tags.iter().find(|t| t.trim().is_empty()) {
        anyhow::bail!("Invalid tag {:?}", tag);
    }

    let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
    let slug = slug::slugify(title);

    let filename = site
        .config
        .new_post_name
        .replace(":title", &slug)
        .replace(":year", &date.format("%Y").to_string())
        .replace(":month", &date.format("%m").to_string())
        .replace(":day", &date.format("%d").to_string())
        .replace(":i_month", &date.format("%-m").to_string())
        .replace(":i_day", &date.format("%-d").to_string());

    fs::create_dir_all(&site.posts_dir)?;
    let file_path = site.posts_dir.join(filename);

    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    let fm = FrontMatter {
        title: Some(title.to_string()),
        date: Some(date.format("%Y-%m-%d").to_string()),
        tags: tags.to_vec(),
        description: Some(String::new()),
        ..Default::default()
    };
    let content = format!("{}\n", fm.to_block()?);

    fs::write(&file_path, content)?;
    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}
