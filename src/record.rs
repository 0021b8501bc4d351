//! The assembled patent record and its derived fields.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::extract::claims::ClaimSet;
use crate::site::Platform;

static YEAR_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})\b").expect("static regex"));
static GRANT_KIND: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bB[12]\b").expect("static regex"));
static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex"));

const EARLIEST_YEAR: u16 = 1800;
const LATEST_YEAR: u16 = 2099;

const STOP_WORDS: [&str; 12] = [
    "and", "or", "the", "a", "an", "of", "for", "in", "on", "with", "by", "to",
];

/// Legal status, reduced to the three values downstream consumers care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatentStatus {
    Granted,
    Pending,
    Unknown,
}

impl PatentStatus {
    /// Map free-form status text onto the vocabulary. "pending" wins over grant phrases.
    #[must_use]
    pub fn from_text(text: Option<&str>) -> Self {
        let Some(text) = text else {
            return PatentStatus::Unknown;
        };
        let lower = text.to_lowercase();
        if lower.contains("pending") {
            PatentStatus::Pending
        } else if ["granted", "active", "in force", "patented"]
            .iter()
            .any(|w| lower.contains(w))
            || GRANT_KIND.is_match(text)
        {
            PatentStatus::Granted
        } else {
            PatentStatus::Unknown
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PatentStatus::Granted => "granted",
            PatentStatus::Pending => "pending",
            PatentStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PatentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Four-digit year, or unknown. Serialized as `"2016"` / `"unknown"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Year {
    Known(u16),
    Unknown,
}

impl Year {
    /// First plausible year token in `text`.
    #[must_use]
    pub fn find(text: &str) -> Option<u16> {
        YEAR_TOKEN
            .captures_iter(text)
            .filter_map(|c| c.get(1)?.as_str().parse::<u16>().ok())
            .find(|y| (EARLIEST_YEAR..=LATEST_YEAR).contains(y))
    }

    /// Year from the year field text, falling back to the title.
    #[must_use]
    pub fn from_fields(year_text: Option<&str>, title: Option<&str>) -> Self {
        year_text
            .and_then(Year::find)
            .or_else(|| title.and_then(Year::find))
            .map_or(Year::Unknown, Year::Known)
    }

    #[must_use]
    pub fn known(self) -> Option<u16> {
        match self {
            Year::Known(y) => Some(y),
            Year::Unknown => None,
        }
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Year::Known(y) => write!(f, "{y}"),
            Year::Unknown => f.write_str("unknown"),
        }
    }
}

impl From<Year> for String {
    fn from(year: Year) -> Self {
        year.to_string()
    }
}

impl TryFrom<String> for Year {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == "unknown" {
            return Ok(Year::Unknown);
        }
        match value.parse::<u16>() {
            Ok(y) if (EARLIEST_YEAR..=LATEST_YEAR).contains(&y) => Ok(Year::Known(y)),
            _ => Err(format!("not a plausible year: {value}")),
        }
    }
}

/// Normalized, capped field values ready for assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFields {
    pub title: Option<String>,
    pub status: Option<String>,
    pub year: Option<String>,
    pub abstract_text: Option<String>,
    pub description: Option<String>,
    pub full_text: Option<String>,
}

/// One extracted patent. Immutable once assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatentRecord {
    pub url: String,
    pub platform: String,
    pub title: Option<String>,
    pub status: PatentStatus,
    pub year: Year,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub description: Option<String>,
    pub claims: ClaimSet,
    pub full_text: Option<String>,
    pub slug: String,
}

impl PatentRecord {
    /// Claims in `"n. text"` form, as rendered in exports.
    #[must_use]
    pub fn claims_text(&self) -> String {
        self.claims.to_text()
    }
}

/// Build a record. Fails only when neither a title nor page text was recovered.
pub fn assemble(
    url: &str,
    platform: Platform,
    fields: RecordFields,
    claims: ClaimSet,
) -> Result<PatentRecord, PipelineError> {
    let RecordFields {
        title,
        status,
        year,
        abstract_text,
        description,
        full_text,
    } = fields;

    if title.is_none() && full_text.is_none() {
        return Err(PipelineError::EmptyDocument {
            url: url.to_string(),
        });
    }

    let status = PatentStatus::from_text(status.as_deref());
    let year = Year::from_fields(year.as_deref(), title.as_deref());
    let slug = build_slug(status, year, title.as_deref());

    Ok(PatentRecord {
        url: url.to_string(),
        platform: platform.name().to_string(),
        title,
        status,
        year,
        abstract_text,
        description,
        claims,
        full_text,
        slug,
    })
}

/// `status_year_three_title_words`, lower-case and filesystem safe.
#[must_use]
pub fn build_slug(status: PatentStatus, year: Year, title: Option<&str>) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(5);
    if status != PatentStatus::Unknown {
        parts.push(status.as_str().to_string());
    }
    if let Some(y) = year.known() {
        parts.push(y.to_string());
    }

    let title = title.unwrap_or_default().to_lowercase();
    let words: Vec<&str> = title
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        .take(3)
        .collect();

    if words.is_empty() {
        parts.push("patent".to_string());
    } else {
        parts.extend(words.into_iter().map(str::to_string));
    }

    let joined = parts.join("_");
    let slug = NON_ALNUM.replace_all(&joined, "_");
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "patent".to_string()
    } else {
        slug.to_string()
    }
}
