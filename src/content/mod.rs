//! Boilerplate removal and text normalization.
//!
//! | Step | Function | Runs on |
//! |------|----------|---------|
//! | Strip navigation, ads, footers | [`clean::clean`] | whole document, once |
//! | NFC + whitespace + length cap | [`normalize::normalize`] | each extracted field |
//!
//! # Example
//!
//! ```rust
//! use patscrape::content::normalize::normalize;
//!
//! let out = normalize("  Glucose\u{00A0}  biosensor \n", 100);
//! assert_eq!(out.text, "Glucose biosensor");
//! assert!(!out.truncated);
//! ```

pub mod clean;
pub mod normalize;
