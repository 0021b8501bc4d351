//! Claim extraction with source ordinals preserved.
//!
//! Claims are read in document order. Each item keeps the number it was
//! published with: claims `1, 2, 4` stay `1, 2, 4`. Only items carrying no
//! number at all get `previous + 1`.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use super::first_match;
use crate::content::clean::CleanedDocument;
use crate::content::normalize::{collapse_whitespace, normalize};
use crate::extract::FieldName;
use crate::site::PlatformProfile;

static LEADING_NUMERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{1,4})\s*[.):]\s*").expect("static regex"));

static SECTION_FLOW: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3, h4, li, p").expect("static selector"));

const MIN_CLAIM_CHARS: usize = 6;

const STOP_MARKERS: [&str; 8] = [
    "similar documents",
    "related patents",
    "prior art",
    "cited by",
    "also published",
    "back to top",
    "references cited",
    "examiner signature",
];

const OTHER_SECTIONS: [&str; 6] = [
    "abstract",
    "description",
    "figure",
    "inventor",
    "applicant",
    "references",
];

/// One claim as published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimItem {
    pub ordinal: u32,
    pub text: String,
}

/// Claims in source order. Never renumbered, reordered or deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet {
    items: Vec<ClaimItem>,
}

impl ClaimSet {
    #[must_use]
    pub fn new(items: Vec<ClaimItem>) -> Self {
        Self { items }
    }

    #[must_use]
    pub fn items(&self) -> &[ClaimItem] {
        &self.items
    }

    #[must_use]
    pub fn ordinals(&self) -> Vec<u32> {
        self.items.iter().map(|c| c.ordinal).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `"1. text"` blocks separated by blank lines.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.items
            .iter()
            .map(|c| format!("{}. {}", c.ordinal, c.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Fit the serialized claims into `max_chars`.
    ///
    /// Whole claims are kept while they fit; the first claim that overflows is
    /// word-truncated to the remaining budget and everything after it dropped.
    #[must_use]
    pub fn capped(&self, max_chars: usize) -> (ClaimSet, bool) {
        let mut kept = Vec::with_capacity(self.items.len());
        let mut used = 0usize;

        for (i, claim) in self.items.iter().enumerate() {
            let separator = if i == 0 { 0 } else { 2 };
            let label = format!("{}. ", claim.ordinal).chars().count();
            let full = separator + label + claim.text.chars().count();

            if used + full <= max_chars {
                used += full;
                kept.push(claim.clone());
                continue;
            }

            let budget = max_chars.saturating_sub(used + separator + label);
            let partial = normalize(&claim.text, budget);
            if !partial.text.is_empty() {
                kept.push(ClaimItem {
                    ordinal: claim.ordinal,
                    text: partial.text,
                });
            }
            return (ClaimSet::new(kept), true);
        }

        (ClaimSet::new(kept), false)
    }
}

/// Extract the ordered claim set from a cleaned document.
///
/// An unresolvable claims container yields an empty set.
#[must_use]
pub fn assemble_claims(doc: &CleanedDocument, profile: &PlatformProfile) -> ClaimSet {
    locate_claims(doc, profile).0
}

/// Claims plus the selector rank of the container that produced them.
pub(crate) fn locate_claims(
    doc: &CleanedDocument,
    profile: &PlatformProfile,
) -> (ClaimSet, Option<usize>) {
    let candidates = profile.candidates(FieldName::Claims);
    let html = doc.document();

    if let Some((rank, container, _)) = first_match(html, candidates) {
        let claims = claims_in_container(container, profile);
        tracing::debug!(
            rank,
            selector = candidates[rank].css,
            count = claims.len(),
            "Claims container resolved"
        );
        return (claims, Some(rank));
    }

    let claims = claims_after_heading(html);
    if claims.is_empty() {
        tracing::debug!("No claims container found");
        return (claims, None);
    }
    tracing::debug!(count = claims.len(), "Claims resolved via section heading");
    (claims, Some(candidates.len()))
}

fn claims_in_container(container: ElementRef<'_>, profile: &PlatformProfile) -> ClaimSet {
    let mut items = claim_elements(container, profile.claim_items());
    if items.is_empty() {
        items = container.children().filter_map(ElementRef::wrap).collect();
    }

    let mut builder = ClaimBuilder::default();
    for &element in &items {
        let text = text_without(element, profile.claim_noise(), &items);
        builder.push(&text, element.value().attr("num"));
    }
    builder.finish()
}

/// Matches of the first item selector that matches anything, in document order.
///
/// An element inside an already-taken item is a sub-clause of it, unless it
/// carries its own `num`: then it is a claim of its own.
fn claim_elements<'a>(container: ElementRef<'a>, selectors: &[Selector]) -> Vec<ElementRef<'a>> {
    for selector in selectors {
        let mut taken = HashSet::new();
        let mut items = Vec::new();
        for element in container.select(selector) {
            let numbered = element.value().attr("num").is_some();
            let nested = element.ancestors().any(|a| taken.contains(&a.id()));
            if numbered || !nested {
                taken.insert(element.id());
                items.push(element);
            }
        }
        if !items.is_empty() {
            return items;
        }
    }
    Vec::new()
}

/// Walk the flow after a "Claims" heading until a stop marker or another section.
fn claims_after_heading(doc: &Html) -> ClaimSet {
    let mut builder = ClaimBuilder::default();
    let mut in_claims = false;

    for element in doc.root_element().select(&SECTION_FLOW) {
        let name = element.value().name();
        let text = collapse_whitespace(&super::element_text(element));
        let lower = text.to_lowercase();
        let is_heading = matches!(name, "h1" | "h2" | "h3" | "h4");

        if !in_claims {
            if is_heading && lower.contains("claim") {
                in_claims = true;
            }
            continue;
        }

        if STOP_MARKERS.iter().any(|m| lower.contains(m)) {
            break;
        }
        if is_heading {
            if OTHER_SECTIONS.iter().any(|s| lower.contains(s)) {
                break;
            }
            continue;
        }
        builder.push(&text, None);
    }

    builder.finish()
}

/// Descendant text, skipping noise elements and any other claim item nested inside.
fn text_without(element: ElementRef<'_>, noise: &[Selector], items: &[ElementRef<'_>]) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let skipped = node
            .ancestors()
            .take_while(|a| a.id() != element.id())
            .filter_map(ElementRef::wrap)
            .any(|a| {
                items.iter().any(|item| item.id() == a.id()) || noise.iter().any(|s| s.matches(&a))
            });
        if !skipped {
            out.push_str(text);
            out.push(' ');
        }
    }
    collapse_whitespace(&out)
}

#[derive(Default)]
struct ClaimBuilder {
    items: Vec<ClaimItem>,
}

impl ClaimBuilder {
    fn push(&mut self, raw: &str, num_attr: Option<&str>) {
        let text = collapse_whitespace(raw);
        let (explicit, body) = split_numeral(&text);
        let body = body.trim();
        if body.chars().count() < MIN_CLAIM_CHARS {
            return;
        }

        let ordinal = explicit
            .or_else(|| num_attr.and_then(|n| n.trim().parse::<u32>().ok()))
            .unwrap_or_else(|| self.items.last().map_or(1, |c| c.ordinal.saturating_add(1)));

        self.items.push(ClaimItem {
            ordinal,
            text: body.to_string(),
        });
    }

    fn finish(self) -> ClaimSet {
        ClaimSet::new(self.items)
    }
}

/// Split a leading `12.` / `12)` / `12:` label off claim text.
fn split_numeral(text: &str) -> (Option<u32>, &str) {
    match LEADING_NUMERAL.captures(text) {
        Some(caps) => {
            let ordinal = caps.get(1).and_then(|m| m.as_str().parse().ok());
            let rest = &text[caps.get(0).map_or(0, |m| m.end())..];
            (ordinal, rest)
        }
        None => (None, text),
    }
}
