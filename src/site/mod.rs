//! Platform profiles and URL resolution.
//!
//! Each supported patent platform is one [`Platform`] variant backed by one
//! selector table module. Adding a platform means adding a variant and a
//! module; extraction code never branches on the platform.
//!
//! # Architecture
//!
//! - [`Platform`]: Tagged variant over supported sites
//! - [`PlatformProfile`]: Compiled selector chains for one site
//! - [`PlatformResolver`]: Classifies URLs, owns all compiled profiles
//!
//! # Example
//!
//! ```rust
//! use patscrape::site::{PlatformResolver, Resolution};
//!
//! let resolver = PlatformResolver::new().unwrap();
//! match resolver.resolve("https://patents.google.com/patent/US9000000B2/en") {
//!     Resolution::Supported(profile) => assert_eq!(profile.name(), "google_patents"),
//!     Resolution::Unsupported => unreachable!(),
//! }
//! ```

pub mod espacenet;
pub mod google;
pub mod uspto;

use regex::Regex;
use scraper::Selector;
use serde::Serialize;

use crate::error::ConfigError;
use crate::extract::FieldName;

/// How a value is read from an element matched by a candidate selector.
#[derive(Debug, Clone, Copy)]
pub enum Probe {
    /// Concatenated descendant text.
    Text,
    /// Value of the named attribute (e.g. `meta[content]`).
    Attr(&'static str),
    /// First descendant text node matching the pattern.
    Matching(&'static str),
}

/// Static description of one selector candidate.
#[derive(Debug, Clone, Copy)]
pub struct CandidateSpec {
    pub css: &'static str,
    pub probe: Probe,
}

impl CandidateSpec {
    pub const fn text(css: &'static str) -> Self {
        Self {
            css,
            probe: Probe::Text,
        }
    }

    pub const fn attr(css: &'static str, name: &'static str) -> Self {
        Self {
            css,
            probe: Probe::Attr(name),
        }
    }

    pub const fn matching(css: &'static str, pattern: &'static str) -> Self {
        Self {
            css,
            probe: Probe::Matching(pattern),
        }
    }
}

/// Static selector tables for one platform.
#[derive(Debug)]
pub struct ProfileSpec {
    pub title: &'static [CandidateSpec],
    pub status: &'static [CandidateSpec],
    pub year: &'static [CandidateSpec],
    pub abstract_text: &'static [CandidateSpec],
    pub description: &'static [CandidateSpec],
    pub claims: &'static [CandidateSpec],
    pub full_text: &'static [CandidateSpec],
    /// Which descendants of a claims container are individual claims, tried in order.
    /// A `num` attribute on a matched item is read as its ordinal, never required.
    pub claim_items: &'static [&'static str],
    /// Sub-elements whose text never belongs to a claim.
    pub claim_noise: &'static [&'static str],
    /// Navigation, advertisement and footer regions stripped before text extraction.
    pub boilerplate: &'static [&'static str],
}

impl ProfileSpec {
    fn field(&self, field: FieldName) -> &'static [CandidateSpec] {
        match field {
            FieldName::Title => self.title,
            FieldName::Status => self.status,
            FieldName::Year => self.year,
            FieldName::Abstract => self.abstract_text,
            FieldName::Description => self.description,
            FieldName::Claims => self.claims,
            FieldName::FullText => self.full_text,
        }
    }
}

/// Supported patent platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    GooglePatents,
    Uspto,
    Espacenet,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::GooglePatents, Platform::Uspto, Platform::Espacenet];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Platform::GooglePatents => "google_patents",
            Platform::Uspto => "uspto",
            Platform::Espacenet => "espacenet",
        }
    }

    fn spec(self) -> &'static ProfileSpec {
        match self {
            Platform::GooglePatents => &google::PROFILE,
            Platform::Uspto => &uspto::PROFILE,
            Platform::Espacenet => &espacenet::PROFILE,
        }
    }

    fn matches(self, host: &str, path: &str) -> bool {
        match self {
            Platform::GooglePatents => google::matches(host, path),
            Platform::Uspto => uspto::matches(host, path),
            Platform::Espacenet => espacenet::matches(host, path),
        }
    }

    /// Classify a URL by host. Returns `None` for unparsable or unknown URLs.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Platform> {
        let parsed = url::Url::parse(url.trim()).ok()?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return None;
        }
        let host = parsed.host_str()?.to_ascii_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);
        let path = parsed.path().to_ascii_lowercase();

        Platform::ALL.into_iter().find(|p| p.matches(host, &path))
    }
}

#[derive(Debug)]
pub(crate) enum CompiledProbe {
    Text,
    Attr(&'static str),
    Matching(Regex),
}

/// A compiled selector candidate.
#[derive(Debug)]
pub struct SelectorCandidate {
    pub css: &'static str,
    pub(crate) selector: Selector,
    pub(crate) probe: CompiledProbe,
}

/// Compiled selector chains for one platform. Built once at startup.
#[derive(Debug)]
pub struct PlatformProfile {
    platform: Platform,
    fields: Vec<(FieldName, Vec<SelectorCandidate>)>,
    claim_items: Vec<Selector>,
    claim_noise: Vec<Selector>,
    boilerplate: Vec<Selector>,
}

impl PlatformProfile {
    /// Compile a platform's selector tables.
    pub fn compile(platform: Platform) -> Result<Self, ConfigError> {
        let spec = platform.spec();
        let name = platform.name();

        let fields = FieldName::ALL
            .into_iter()
            .map(|field| {
                let candidates = spec
                    .field(field)
                    .iter()
                    .map(|c| compile_candidate(name, c))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((field, candidates))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            platform,
            fields,
            claim_items: compile_all(name, spec.claim_items)?,
            claim_noise: compile_all(name, spec.claim_noise)?,
            boilerplate: compile_all(name, spec.boilerplate)?,
        })
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.platform.name()
    }

    /// Ordered candidates for a field, primary first.
    #[must_use]
    pub fn candidates(&self, field: FieldName) -> &[SelectorCandidate] {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map_or(&[], |(_, c)| c.as_slice())
    }

    pub(crate) fn claim_items(&self) -> &[Selector] {
        &self.claim_items
    }

    pub(crate) fn claim_noise(&self) -> &[Selector] {
        &self.claim_noise
    }

    pub(crate) fn boilerplate(&self) -> &[Selector] {
        &self.boilerplate
    }
}

fn compile_selector(platform: &'static str, css: &'static str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| ConfigError::Selector {
        platform,
        css,
        reason: format!("{e:?}"),
    })
}

fn compile_all(
    platform: &'static str,
    list: &'static [&'static str],
) -> Result<Vec<Selector>, ConfigError> {
    list.iter().map(|css| compile_selector(platform, css)).collect()
}

fn compile_candidate(
    platform: &'static str,
    spec: &CandidateSpec,
) -> Result<SelectorCandidate, ConfigError> {
    let probe = match spec.probe {
        Probe::Text => CompiledProbe::Text,
        Probe::Attr(name) => CompiledProbe::Attr(name),
        Probe::Matching(pattern) => {
            CompiledProbe::Matching(Regex::new(pattern).map_err(|source| ConfigError::Pattern {
                platform,
                pattern,
                source,
            })?)
        }
    };

    Ok(SelectorCandidate {
        css: spec.css,
        selector: compile_selector(platform, spec.css)?,
        probe,
    })
}

/// Outcome of classifying a URL.
#[derive(Debug)]
pub enum Resolution<'a> {
    Supported(&'a PlatformProfile),
    Unsupported,
}

/// Owns every compiled profile and maps URLs onto them.
#[derive(Debug)]
pub struct PlatformResolver {
    profiles: Vec<PlatformProfile>,
}

impl PlatformResolver {
    /// Compile all built-in platform profiles.
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_platforms(&Platform::ALL)
    }

    /// Compile a subset of platforms. An empty set is a configuration error.
    pub fn with_platforms(platforms: &[Platform]) -> Result<Self, ConfigError> {
        if platforms.is_empty() {
            return Err(ConfigError::NoProfiles);
        }
        let profiles = platforms
            .iter()
            .map(|p| PlatformProfile::compile(*p))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!("Compiled {} platform profiles", profiles.len());
        Ok(Self { profiles })
    }

    #[must_use]
    pub fn resolve(&self, url: &str) -> Resolution<'_> {
        match Platform::from_url(url).and_then(|p| self.profile(p)) {
            Some(profile) => {
                tracing::debug!("Matched platform profile: {}", profile.name());
                Resolution::Supported(profile)
            }
            None => Resolution::Unsupported,
        }
    }

    #[must_use]
    pub fn profile(&self, platform: Platform) -> Option<&PlatformProfile> {
        self.profiles.iter().find(|p| p.platform == platform)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
