//! USPTO selector tables (`patents.uspto.gov`, Patent Public Search, legacy PatFT).

use super::{CandidateSpec as C, ProfileSpec};

const HOSTS: [&str; 4] = [
    "patents.uspto.gov",
    "ppubs.uspto.gov",
    "patft.uspto.gov",
    "image-ppubs.uspto.gov",
];

pub(super) fn matches(host: &str, _path: &str) -> bool {
    HOSTS.contains(&host)
}

pub(super) static PROFILE: ProfileSpec = ProfileSpec {
    title: &[
        C::text("h1.title"),
        C::text("span.title"),
        C::attr(r#"meta[name="DC.title"]"#, "content"),
        C::text(r#"font[size="+1"]"#),
        C::text("h1"),
        C::text("title"),
    ],
    status: &[
        C::text(".status"),
        C::text(r#"[data-field="status"]"#),
        C::matching("body", r"(?i)\b(pending|granted|published)\b"),
    ],
    year: &[
        C::attr(r#"meta[name="DC.date"]"#, "content"),
        C::text(".filing-date"),
        C::text(r#"[data-field="filingDate"]"#),
        C::matching("body", r"\d{4}-\d{2}-\d{2}"),
        C::matching("body", r"\b(19|20)\d{2}\b"),
    ],
    abstract_text: &[
        C::text(r#"div[role="doc-abstract"]"#),
        C::text(".abstract"),
        C::text("#abstract"),
        C::attr(r#"meta[name="DC.description"]"#, "content"),
    ],
    description: &[
        C::text(r#"div[role="doc-description"]"#),
        C::text(".description"),
        C::text("#description"),
    ],
    claims: &[
        C::text("div.claims"),
        C::text(".claims-block"),
        C::text("#claims"),
    ],
    full_text: &[
        C::text("main"),
        C::text("body"),
    ],
    claim_items: &[".claim", "li", "p"],
    claim_noise: &["button", "img", "sup.ref"],
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
        r#"[class*="advert"]"#,
        r#"[class*="banner"]"#,
        "#usptoGlobalHeader",
        "#usptoGlobalFooter",
        ".breadcrumb",
        ".menu",
    ],
};
