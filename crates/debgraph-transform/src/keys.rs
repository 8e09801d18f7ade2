//! Key derivation.
//!
//! - identity keys: the natural unique attribute, verbatim
//! - content-hash keys: `sha256` hex of raw key material
//! - source-package split: `foo (1.2-3)` -> (`foo`, `1.2-3`)

use regex::Regex;
use sha2::{Digest as _, Sha256};
use std::fmt::Write as _;
use std::sync::OnceLock;

/// Lowercase hex SHA-256 of the UTF-8 bytes of `material`.
///
/// Used for SSH key material, whose natural form (arbitrary length base64)
/// is not a usable document key.
pub fn content_hash_key(material: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(material.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest.iter() {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// A package's `source` field, split into name and optional version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePackage {
    pub name: String,
    pub version: Option<String>,
}

fn source_version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(([0-9a-z.-]+)\)").unwrap())
}

/// Split `source` into the source package name and the version embedded in
/// parentheses, if any. Without a matching parenthesized token the field is
/// returned verbatim.
pub fn split_source(source: &str) -> SourcePackage {
    let Some(caps) = source_version_re().captures(source) else {
        return SourcePackage {
            name: source.to_string(),
            version: None,
        };
    };

    let (Some(whole), Some(version)) = (caps.get(0), caps.get(1)) else {
        return SourcePackage {
            name: source.to_string(),
            version: None,
        };
    };

    let mut name = String::with_capacity(source.len());
    name.push_str(&source[..whole.start()]);
    name.push_str(&source[whole.end()..]);

    SourcePackage {
        name: name.trim().to_string(),
        version: Some(version.as_str().to_string()),
    }
}

/// First whitespace-separated token of `value`, e.g. the host in an
/// `allowedHost` entry such as `ries.debian.org restricted`.
pub fn first_token(value: &str) -> Option<&str> {
    value.split_whitespace().next()
}
