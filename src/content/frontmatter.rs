//! Front-matter parsing

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Front-matter data from a post or page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    /// Reference to the parent post (collection- or site-relative path)
    pub parent: Option<String>,
}

impl FrontMatter {
    /// Split a document into front-matter and body.
    ///
    /// Content without a YAML block (or with one that fails to parse) yields
    /// default front-matter and the untouched content.
    pub fn parse(content: &str) -> (Self, &str) {
        let content = content.trim_start_matches('\u{feff}');
        let trimmed = content.trim_start();

        if !trimmed.starts_with("---") {
            return (FrontMatter::default(), content);
        }

        let rest = trimmed[3..].trim_start_matches(['\n', '\r']);
        let Some(end_pos) = rest.find("\n---") else {
            return (FrontMatter::default(), content);
        };

        let yaml_content = &rest[..end_pos];
        let remaining = &rest[end_pos + 4..];
        // Drop the rest of the closing fence line
        let remaining = match remaining.find('\n') {
            Some(pos) if remaining[..pos].trim().is_empty() => &remaining[pos + 1..],
            None if remaining.trim().is_empty() => "",
            _ => remaining,
        };

        if yaml_content.trim().is_empty() {
            return (FrontMatter::default(), remaining);
        }

        if !looks_like_yaml(yaml_content) {
            // A thematic break, not front-matter
            return (FrontMatter::default(), content);
        }

        match serde_yaml::from_str::<FrontMatter>(yaml_content) {
            Ok(fm) => (fm, remaining),
            Err(e) => {
                tracing::warn!("Failed to parse YAML front-matter, ignoring it: {}", e);
                (FrontMatter::default(), remaining)
            }
        }
    }

    /// Parse `created_at` into a DateTime
    pub fn parse_created(&self) -> Option<DateTime<Local>> {
        self.created_at.as_deref().and_then(parse_date_string)
    }

    /// Parse `updated_at` into a DateTime
    pub fn parse_updated(&self) -> Option<DateTime<Local>> {
        self.updated_at.as_deref().and_then(parse_date_string)
    }
}

/// At least one `key: value` line with a plain identifier key
fn looks_like_yaml(block: &str) -> bool {
    block.lines().any(|line| {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return false;
        }
        let Some(colon_pos) = trimmed.find(':') else {
            return false;
        };
        let key = &trimmed[..colon_pos];
        let is_valid_key = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            && !matches!(key, "http" | "https" | "ftp");
        let after = &trimmed[colon_pos + 1..];
        is_valid_key && (after.is_empty() || after.starts_with(' '))
    })
}

/// Parse a timestamp in the formats authors and the CMS write
pub fn parse_date_string(s: &str) -> Option<DateTime<Local>> {
    let s = s.trim().trim_matches(['"', '\'']);

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local));
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Local.from_local_datetime(&dt).earliest();
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            let dt = d.and_hms_opt(0, 0, 0)?;
            return Local.from_local_datetime(&dt).earliest();
        }
    }

    None
}
