//! Google Patents (`patents.google.com`) selector tables.
//!
//! Google serves the full record statically with schema.org `itemprop`
//! annotations; the `data-test-id` and `*-section` variants cover the
//! redesigned result pages.

use super::{CandidateSpec as C, ProfileSpec};

pub(super) fn matches(host: &str, _path: &str) -> bool {
    host == "patents.google.com"
}

pub(super) static PROFILE: ProfileSpec = ProfileSpec {
    title: &[
        C::attr(r#"meta[name="DC.title"]"#, "content"),
        C::text(r#"span[itemprop="title"]"#),
        C::text(r#"h1[itemprop="title"]"#),
        C::attr(r#"meta[property="og:title"]"#, "content"),
        C::text("h1.title"),
        C::text("h1"),
        C::text("title"),
    ],
    status: &[
        C::text(r#"[itemprop="legalStatusIfi"] [itemprop="status"]"#),
        C::text(r#"span[itemprop="status"]"#),
        C::text(r#"[data-test-id="status"]"#),
        C::matching("body", r"(?i)\b(pending|granted|published)\b"),
    ],
    year: &[
        C::attr(r#"time[itemprop="filingDate"]"#, "datetime"),
        C::text(r#"time[itemprop="filingDate"]"#),
        C::attr(r#"time[itemprop="priorityDate"]"#, "datetime"),
        C::attr(r#"meta[name="DC.date"]"#, "content"),
        C::text(r#"time[itemprop="publicationDate"]"#),
        C::matching("body", r"\d{4}-\d{2}-\d{2}"),
        C::matching("body", r"\b(19|20)\d{2}\b"),
    ],
    abstract_text: &[
        C::text(r#"section[itemprop="abstract"] div.abstract"#),
        C::text(r#"div[data-test-id="abstract"]"#),
        C::text(".abstract-section"),
        C::attr(r#"meta[name="DC.description"]"#, "content"),
        C::text(r#"[itemprop="abstract"]"#),
        C::text("div.abstract"),
    ],
    description: &[
        C::text(r#"section[itemprop="description"]"#),
        C::text(r#"div[data-test-id="description"]"#),
        C::text(".description-section"),
        C::text("div.description"),
        C::text(r#"[itemprop="description"]"#),
    ],
    claims: &[
        C::text(r#"section[itemprop="claims"]"#),
        C::text(r#"div[data-test-id="claims"]"#),
        C::text(".claims-section"),
        C::text("div.claims"),
        C::text(r#"[itemprop="claims"]"#),
    ],
    full_text: &[
        C::text("article"),
        C::text("body"),
    ],
    claim_items: &[".claim", "li", "p"],
    claim_noise: &["button", "img", ".more-less", ".google-src-text"],
    boilerplate: &[
        "script",
        "style",
        "noscript",
        "template",
        "iframe",
        "nav",
        "header",
        "footer",
        "aside",
        r#"[role="navigation"]"#,
        r#"[role="banner"]"#,
        r#"[class*="cookie"]"#,
        r#"[id*="cookie"]"#,
        r#"[class*="advert"]"#,
        r#"[id*="advert"]"#,
        r#"[class*="banner"]"#,
        "search-app-bar",
        "#footer",
        ".footer",
        ".menu",
    ],
};
