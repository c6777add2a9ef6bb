//! URL fingerprinting
//!
//! Maps a concrete page URL to a canonical path + query signature so that
//! repeated visits to the same logical page group together. Volatile path
//! segments (numeric ids, hashes, UUIDs, slugs) are masked and query values
//! are discarded.

use crate::{CoreError, CoreResult};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Base authority used so relative URLs parse
const DUMMY_BASE: &str = "http://dummy.base";

static NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());
static VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]{5,36}$").unwrap());
static SLUG_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9-]{4,11}$").unwrap());
static UUID_LIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9-]{12,36}$").unwrap());

/// Placeholder kinds a path segment can be masked to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentClass {
    Id,
    Value,
    SlugId,
    Uuid,
}

impl SegmentClass {
    pub fn placeholder(&self) -> &'static str {
        match self {
            SegmentClass::Id => ":id",
            SegmentClass::Value => ":value",
            SegmentClass::SlugId => ":slug_id",
            SegmentClass::Uuid => ":uuid",
        }
    }
}

/// URL normalizer with optional user-supplied path patterns
#[derive(Debug, Clone, Default)]
pub struct UrlNormalizer {
    patterns: Vec<Regex>,
}

impl UrlNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile custom patterns; they replace segment classification for any
    /// URL they match.
    pub fn with_patterns<S: AsRef<str>>(patterns: &[S]) -> CoreResult<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|e| {
                    CoreError::Config(format!("url_patterns: invalid pattern '{}': {}", p.as_ref(), e))
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }

    /// Compute the fingerprint of `url`
    pub fn normalize(&self, url: &str) -> CoreResult<String> {
        let base = Url::parse(DUMMY_BASE).map_err(|e| CoreError::Url(e.to_string()))?;
        let parsed = base
            .join(url)
            .map_err(|e| CoreError::Url(format!("{}: {}", url, e)))?;

        if let Some(masked) = self.apply_patterns(parsed.path()) {
            // Custom branch keeps the raw query string untouched.
            let search = match parsed.query() {
                Some(q) if !q.is_empty() => format!("?{}", q),
                _ => String::new(),
            };
            return Ok(masked + &search);
        }

        let path = parsed
            .path()
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| match classify_segment(segment) {
                Some(class) => class.placeholder(),
                None => segment,
            })
            .collect::<Vec<_>>()
            .join("/");

        let mut params: Vec<String> = parsed
            .query_pairs()
            .map(|(key, _)| format!("{}=*", key))
            .collect();
        params.sort();

        let search = if params.is_empty() {
            String::new()
        } else {
            format!("?{}", params.join("&"))
        };

        Ok(format!("/{}{}", path, search))
    }

    /// Replace every match of every pattern with a numbered placeholder.
    /// Returns `None` when nothing matched.
    fn apply_patterns(&self, path: &str) -> Option<String> {
        if self.patterns.is_empty() {
            return None;
        }

        let mut counter = 0usize;
        let mut masked = path.to_string();
        for pattern in &self.patterns {
            masked = pattern
                .replace_all(&masked, |_: &regex::Captures| {
                    counter += 1;
                    format!("/{{$regExp{}}}", counter)
                })
                .into_owned();
        }

        if counter == 0 {
            return None;
        }
        if !masked.contains('/') {
            masked.insert(0, '/');
        }
        Some(masked)
    }
}

/// Fingerprint `url` using only the built-in segment rules
pub fn normalize(url: &str) -> CoreResult<String> {
    UrlNormalizer::new().normalize(url)
}

/// Classify one non-empty path segment. First match wins.
pub fn classify_segment(segment: &str) -> Option<SegmentClass> {
    if segment.contains('.') {
        return None;
    }
    if NUMERIC.is_match(segment) {
        return Some(SegmentClass::Id);
    }

    let mixed = has_letter_and_digit(segment);
    if mixed && VALUE.is_match(segment) {
        Some(SegmentClass::Value)
    } else if mixed && SLUG_ID.is_match(segment) {
        Some(SegmentClass::SlugId)
    } else if mixed && UUID_LIKE.is_match(segment) {
        Some(SegmentClass::Uuid)
    } else {
        None
    }
}

fn has_letter_and_digit(segment: &str) -> bool {
    segment.chars().any(|c| c.is_ascii_alphabetic()) && segment.chars().any(|c| c.is_ascii_digit())
}
