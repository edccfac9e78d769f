//! Front-matter parsing and serialization

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors raised while splitting or decoding a front-matter block
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrontMatterError {
    #[error("front-matter opened with `---` on line 1 is never closed")]
    Unterminated,

    #[error("invalid YAML front-matter: {message}")]
    Yaml { line: Option<usize>, message: String },

    #[error("invalid JSON front-matter at line {line}: {message}")]
    Json { line: usize, message: String },

    #[error("failed to serialize front-matter: {0}")]
    Serialize(String),
}

impl FrontMatterError {
    /// Line in the source file the error points at, if known
    pub fn line(&self) -> Option<usize> {
        match self {
            FrontMatterError::Unterminated => Some(1),
            FrontMatterError::Yaml { line, .. } => *line,
            FrontMatterError::Json { line, .. } => Some(*line),
            FrontMatterError::Serialize(_) => None,
        }
    }
}

/// Custom deserializer that handles both a single string and a list of strings
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value])
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<Option<String>>()? {
                // `- ` with nothing after it is a null entry; keep it visible as ""
                vec.push(item.unwrap_or_default());
            }
            Ok(vec)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// Front-matter data from a résumé or post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(alias = "updated", skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(deserialize_with = "string_or_vec", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_caption: Option<String>,

    /// Additional custom fields, in source order
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl FrontMatter {
    /// Split front-matter from content
    ///
    /// Returns `None` when the content has no front-matter block, otherwise
    /// the decoded front-matter and the remaining body.
    pub fn parse(content: &str) -> Result<Option<(Self, &str)>, FrontMatterError> {
        let content = content.trim_start();

        // YAML front-matter (---)
        if content.starts_with("---") {
            return Self::parse_yaml(content);
        }

        // JSON front-matter (;;; or {"key":)
        if content.starts_with(";;;") || content.starts_with('{') {
            return Self::parse_json(content);
        }

        Ok(None)
    }

    fn parse_yaml(content: &str) -> Result<Option<(Self, &str)>, FrontMatterError> {
        // Keep the newline after the opening ---, so an empty block still ends at "\n---"
        let rest = &content[3..];

        let Some(end_pos) = rest.find("\n---") else {
            if looks_like_yaml(rest) {
                return Err(FrontMatterError::Unterminated);
            }
            // A lone thematic break
            return Ok(None);
        };

        let yaml_content = &rest[..end_pos];
        let remaining = &rest[end_pos + 4..]; // Skip \n---
        let remaining = remaining.trim_start_matches(['\n', '\r']);

        if yaml_content.trim().is_empty() {
            return Ok(Some((FrontMatter::default(), remaining)));
        }

        // `---` is also a markdown thematic break; only key: value content counts
        if !looks_like_yaml(yaml_content) {
            return Ok(None);
        }

        match serde_yaml::from_str::<FrontMatter>(yaml_content) {
            Ok(fm) => Ok(Some((fm, remaining))),
            // The block starts on the delimiter line, so YAML lines are file lines
            Err(e) => Err(FrontMatterError::Yaml {
                line: e.location().map(|loc| loc.line()),
                message: strip_location(&e.to_string()),
            }),
        }
    }

    fn parse_json(content: &str) -> Result<Option<(Self, &str)>, FrontMatterError> {
        // JSON front-matter ends with ;;;
        if let Some(rest) = content.strip_prefix(";;;") {
            if let Some(end_pos) = rest.find(";;;") {
                let json_content = &rest[..end_pos];
                let remaining = &rest[end_pos + 3..];
                let remaining = remaining.trim_start_matches(['\n', '\r']);
                let fm = Self::from_json(json_content)?;
                return Ok(Some((fm, remaining)));
            }
            return Err(FrontMatterError::Unterminated);
        }

        // A bare JSON object at the start of the file
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        for (i, c) in content.char_indices() {
            if in_string {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match c {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let end_pos = i + 1;
                        let fm = Self::from_json(&content[..end_pos])?;
                        let remaining = content[end_pos..].trim_start_matches(['\n', '\r']);
                        return Ok(Some((fm, remaining)));
                    }
                }
                _ => {}
            }
        }

        // Unbalanced braces: this is prose, not front-matter
        Ok(None)
    }

    fn from_json(json: &str) -> Result<Self, FrontMatterError> {
        serde_json::from_str(json).map_err(|e| FrontMatterError::Json {
            line: e.line(),
            message: strip_location(&e.to_string()),
        })
    }

    /// Serialize to a `---` delimited YAML block, ending with a newline
    pub fn to_block(&self) -> Result<String, FrontMatterError> {
        let yaml =
            serde_yaml::to_string(self).map_err(|e| FrontMatterError::Serialize(e.to_string()))?;
        Ok(format!("---\n{}---\n", yaml))
    }

    /// Keys present in this front-matter, in serialization order
    pub fn keys(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        let known = [
            ("title", self.title.is_some()),
            ("date", self.date.is_some()),
            ("modified", self.modified.is_some()),
            ("tags", !self.tags.is_empty()),
            ("description", self.description.is_some()),
            ("image", self.image.is_some()),
            ("image_caption", self.image_caption.is_some()),
        ];
        for (key, present) in known {
            if present {
                keys.push(key);
            }
        }
        keys.extend(self.extra.keys().map(String::as_str));
        keys
    }
}

/// Whether a block has at least one `key: value` line
fn looks_like_yaml(block: &str) -> bool {
    block.lines().any(|line| {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return false;
        }
        // Note: "- item" alone is also a markdown list, so it doesn't count
        let Some(colon_pos) = trimmed.find(':') else {
            return false;
        };
        let key = unquote(&trimmed[..colon_pos]);
        let is_valid_key = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            && !matches!(key, "http" | "https" | "ftp" | "mailto");
        if !is_valid_key {
            return false;
        }
        let after_colon = &trimmed[colon_pos + 1..];
        after_colon.is_empty() || after_colon.starts_with(' ')
    })
}

fn unquote(key: &str) -> &str {
    ['"', '\'']
        .into_iter()
        .find_map(|q| key.strip_prefix(q).and_then(|k| k.strip_suffix(q)))
        .unwrap_or(key)
}

/// Drop the " at line X column Y" suffix serde errors append; we report lines ourselves
fn strip_location(message: &str) -> String {
    match message.find(" at line ") {
        Some(pos) => message[..pos].to_string(),
        None => message.to_string(),
    }
}
