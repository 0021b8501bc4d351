//! Profile-driven boilerplate removal.
//!
//! Navigation bars, cookie notices, advertisement slots and footers are
//! detached from the DOM before any body text is read, so none of their
//! text can leak into abstract, description, claims or full text.

use scraper::Html;

use crate::site::PlatformProfile;

/// A document whose boilerplate nodes have already been removed.
///
/// Only [`clean_document`] constructs this type, which keeps text-field
/// resolution from ever running on uncleaned markup.
pub struct CleanedDocument(Html);

impl CleanedDocument {
    #[must_use]
    pub fn document(&self) -> &Html {
        &self.0
    }

    /// Serialized cleaned markup.
    #[must_use]
    pub fn html(&self) -> String {
        self.0.html()
    }
}

/// Remove every boilerplate node named by the profile and return the cleaned markup.
#[must_use]
pub fn clean(html: &str, profile: &PlatformProfile) -> String {
    clean_document(Html::parse_document(html), profile).html()
}

/// Detach boilerplate nodes, then reparse so the arena holds only live nodes.
#[must_use]
pub fn clean_document(mut doc: Html, profile: &PlatformProfile) -> CleanedDocument {
    let mut removed = 0usize;

    for selector in profile.boilerplate() {
        let ids: Vec<_> = doc.root_element().select(selector).map(|e| e.id()).collect();
        for id in ids {
            if let Some(mut node) = doc.tree.get_mut(id) {
                node.detach();
                removed += 1;
            }
        }
    }

    tracing::debug!(platform = profile.name(), removed, "Stripped boilerplate nodes");

    if removed == 0 {
        return CleanedDocument(doc);
    }
    CleanedDocument(Html::parse_document(&doc.html()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{Platform, PlatformResolver};

    fn profile(resolver: &PlatformResolver, platform: Platform) -> &PlatformProfile {
        resolver.profile(platform).unwrap()
    }

    #[test]
    fn strips_navigation_ads_and_footer() {
        let resolver = PlatformResolver::new().unwrap();
        let html = r#"<html><body>
            <nav><a href="/">Home</a></nav>
            <div class="cookie-banner">We use cookies</div>
            <div id="advert-top">Buy now</div>
            <main><p>Electrode assembly</p></main>
            <footer>Copyright</footer>
            <script>var tracking = 1;</script>
            </body></html>"#;

        let cleaned = clean(html, profile(&resolver, Platform::GooglePatents));
        assert!(cleaned.contains("Electrode assembly"));
        for noise in ["Home", "We use cookies", "Buy now", "Copyright", "tracking"] {
            assert!(!cleaned.contains(noise), "{noise} survived cleaning");
        }
    }

    #[test]
    fn nested_boilerplate_is_removed_once() {
        let resolver = PlatformResolver::new().unwrap();
        let html = r#"<html><body>
            <footer><nav>Links</nav><div class="menu">Menu</div></footer>
            <p>Body</p>
            </body></html>"#;

        let cleaned = clean(html, profile(&resolver, Platform::Uspto));
        assert!(cleaned.contains("Body"));
        assert!(!cleaned.contains("Links"));
        assert!(!cleaned.contains("Menu"));
    }

    #[test]
    fn cleaned_document_selects_only_live_nodes() {
        let resolver = PlatformResolver::new().unwrap();
        let p = profile(&resolver, Platform::Espacenet);
        let html = "<html><body><header><h1>Espacenet</h1></header><h1>Sensor</h1></body></html>";

        let cleaned = clean_document(Html::parse_document(html), p);
        let h1 = scraper::Selector::parse("h1").unwrap();
        let titles: Vec<String> = cleaned
            .document()
            .select(&h1)
            .map(|e| e.text().collect())
            .collect();
        assert_eq!(titles, vec!["Sensor".to_string()]);
    }

    #[test]
    fn untouched_document_is_preserved() {
        let resolver = PlatformResolver::new().unwrap();
        let html = "<html><head></head><body><p>Plain</p></body></html>";
        let cleaned = clean(html, profile(&resolver, Platform::GooglePatents));
        assert!(cleaned.contains("<p>Plain</p>"));
    }
}
