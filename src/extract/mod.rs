//! Field resolution over platform selector chains.
//!
//! Metadata fields (title, status, year) resolve against the raw document
//! because they usually live in `<head>` or bibliographic blocks that the
//! cleaner would strip. Text-bearing fields resolve against the
//! [`CleanedDocument`] only.

pub mod claims;

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use once_cell::sync::Lazy;

use crate::content::clean::{clean_document, CleanedDocument};
use crate::content::normalize::collapse_whitespace;
use crate::site::{CompiledProbe, PlatformProfile, SelectorCandidate};

static DESCRIPTION_HEADINGS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h2, h3, p").expect("static selector"));

/// Logical fields of a patent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    Title,
    Status,
    Year,
    Abstract,
    Description,
    Claims,
    FullText,
}

impl FieldName {
    pub const ALL: [FieldName; 7] = [
        FieldName::Title,
        FieldName::Status,
        FieldName::Year,
        FieldName::Abstract,
        FieldName::Description,
        FieldName::Claims,
        FieldName::FullText,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::Title => "title",
            FieldName::Status => "status",
            FieldName::Year => "year",
            FieldName::Abstract => "abstract",
            FieldName::Description => "description",
            FieldName::Claims => "claims",
            FieldName::FullText => "full_text",
        }
    }

    /// Metadata fields are resolved against raw markup.
    #[must_use]
    pub fn is_metadata(&self) -> bool {
        matches!(self, FieldName::Title | FieldName::Status | FieldName::Year)
    }
}

/// A resolved (or absent) field plus the selector rank that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedField {
    pub name: FieldName,
    pub value: Option<String>,
    /// Zero-based position in the candidate chain; `0` is the primary selector.
    pub rank: Option<usize>,
    pub selector: Option<&'static str>,
}

impl ExtractedField {
    fn absent(name: FieldName) -> Self {
        Self {
            name,
            value: None,
            rank: None,
            selector: None,
        }
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.rank.is_some_and(|r| r > 0)
    }
}

/// A fetched page parsed twice: raw for metadata, cleaned for body text.
pub struct Page {
    raw: Html,
    cleaned: CleanedDocument,
}

impl Page {
    /// Parse and clean a page. Cleaning happens exactly once, here.
    #[must_use]
    pub fn parse(html: &str, profile: &PlatformProfile) -> Self {
        let raw = Html::parse_document(html);
        let cleaned = clean_document(Html::parse_document(html), profile);
        Self { raw, cleaned }
    }

    #[must_use]
    pub fn raw(&self) -> &Html {
        &self.raw
    }

    #[must_use]
    pub fn cleaned(&self) -> &CleanedDocument {
        &self.cleaned
    }

    fn scope(&self, field: FieldName) -> &Html {
        if field.is_metadata() {
            &self.raw
        } else {
            self.cleaned.document()
        }
    }
}

/// Resolve one field by walking the profile's candidate chain.
///
/// The first candidate with enough non-whitespace content wins. Exhausting
/// the chain yields an absent field, never an error.
#[must_use]
pub fn resolve_field(page: &Page, profile: &PlatformProfile, field: FieldName) -> ExtractedField {
    let candidates = profile.candidates(field);
    let doc = page.scope(field);

    if let Some((rank, _, value)) = first_match(doc, candidates) {
        let selector = candidates[rank].css;
        if rank > 0 {
            tracing::debug!(
                field = field.as_str(),
                rank,
                selector,
                "Resolved via fallback selector"
            );
        }
        return ExtractedField {
            name: field,
            value: Some(value),
            rank: Some(rank),
            selector: Some(selector),
        };
    }

    if field == FieldName::Description {
        if let Some(value) = description_after_heading(doc) {
            tracing::debug!(field = field.as_str(), "Resolved via section heading");
            return ExtractedField {
                name: field,
                value: Some(value),
                rank: Some(candidates.len()),
                selector: Some("heading"),
            };
        }
    }

    tracing::debug!(field = field.as_str(), "No candidate matched");
    ExtractedField::absent(field)
}

/// First candidate yielding usable content: `(rank, element, value)`.
pub(crate) fn first_match<'a>(
    doc: &'a Html,
    candidates: &[SelectorCandidate],
) -> Option<(usize, ElementRef<'a>, String)> {
    for (rank, candidate) in candidates.iter().enumerate() {
        for element in doc.root_element().select(&candidate.selector) {
            if let Some(value) = probe(element, candidate) {
                return Some((rank, element, value));
            }
        }
    }
    None
}

fn probe(element: ElementRef<'_>, candidate: &SelectorCandidate) -> Option<String> {
    let value = match &candidate.probe {
        CompiledProbe::Text => collapse_whitespace(&element_text(element)),
        CompiledProbe::Attr(name) => collapse_whitespace(element.value().attr(name)?),
        CompiledProbe::Matching(pattern) => element
            .text()
            .map(str::trim)
            .find(|t| pattern.is_match(t))
            .map(collapse_whitespace)?,
    };

    (!value.is_empty()).then_some(value)
}

/// Descendant text with a space between text nodes so block boundaries survive.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

/// Text of the first paragraph following an `h2`/`h3` that names the description.
fn description_after_heading(doc: &Html) -> Option<String> {
    let mut seen_heading = false;
    for element in doc.root_element().select(&DESCRIPTION_HEADINGS) {
        let name = element.value().name();
        if name == "p" {
            if seen_heading {
                let text = collapse_whitespace(&element_text(element));
                if !text.is_empty() {
                    return Some(text);
                }
            }
        } else if element_text(element).to_lowercase().contains("description") {
            seen_heading = true;
        }
    }
    None
}
