//! EPO selector tables (Espacenet and the EPO publication server).

use super::{CandidateSpec as C, ProfileSpec};

pub(super) fn matches(host: &str, _path: &str) -> bool {
    host == "espacenet.com" || host.ends_with(".espacenet.com") || host == "data.epo.org"
}

pub(super) static PROFILE: ProfileSpec = ProfileSpec {
    title: &[
        C::text(".publicationTitle"),
        C::text("#biblio-title-content"),
        C::text(r#"[data-qa="title"]"#),
        C::attr(r#"meta[name="DC.title"]"#, "content"),
        C::text("h1"),
        C::text("title"),
    ],
    status: &[
        C::text(".legalStatus"),
        C::text(r#"[data-qa="legal-status"]"#),
        C::matching("body", r"(?i)\b(pending|granted|published)\b"),
    ],
    year: &[
        C::text(".applicationDate"),
        C::text(r#"[data-qa="application-date"]"#),
        C::attr(r#"meta[name="DC.date"]"#, "content"),
        C::matching("body", r"\d{4}-\d{2}-\d{2}"),
        C::matching("body", r"\b(19|20)\d{2}\b"),
    ],
    abstract_text: &[
        C::text(".abstract"),
        C::text(r#"[id*="abstract"]"#),
        C::attr(r#"meta[name="DC.description"]"#, "content"),
    ],
    description: &[
        C::text(".description"),
        C::text(r#"[id*="description"]"#),
    ],
    claims: &[
        C::text(".claims"),
        C::text(r#"[id*="claim"]"#),
    ],
    full_text: &[
        C::text("#application-content"),
        C::text("body"),
    ],
    claim_items: &[".claim", "li", "p"],
    claim_noise: &["button", "img", ".claim-ref-toggle"],
    boilerplate: &[
        "script",
        "style",
        "noscript",
        "iframe",
        "nav",
        "header",
        "footer",
        "aside",
        r#"[role="navigation"]"#,
        r#"[class*="cookie"]"#,
        r#"[id*="cookie"]"#,
        r#"[class*="advert"]"#,
        r#"[class*="banner"]"#,
        ".epoHeader",
        ".epoFooter",
        ".menu",
    ],
};
