//! Access map: quick links keyed by a slug derived from their label.
//!
//! Slugs are a pure function of the label, so two differently worded labels
//! can land on the same slug. The later entry wins; collisions are logged and
//! counted so they show up in diagnostics.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::text::normalize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccessEntry {
    pub slug: String,
    pub label: String,
    pub url: String,
}

#[derive(Clone, Debug, Default)]
pub struct AccessMap {
    entries: HashMap<String, AccessEntry>,
    collisions: usize,
}

pub fn slug(label: &str) -> String {
    let normalized = normalize(label);
    let mut slug = String::with_capacity(normalized.len());
    let mut pending_separator = false;

    for ch in normalized.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(ch);
        } else {
            pending_separator = true;
        }
    }

    slug
}

impl AccessMap {
    pub fn build<I, L, U>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (L, U)>,
        L: Into<String>,
        U: Into<String>,
    {
        let mut map = Self::default();

        for (label, url) in pairs {
            let label = label.into().trim().to_string();
            let url = url.into().trim().to_string();
            let key = slug(&label);
            if key.is_empty() || url.is_empty() {
                debug!(event_name = "access.entry_skipped", label = %label, "skipping access entry");
                continue;
            }

            let entry = AccessEntry { slug: key.clone(), label, url };
            if let Some(previous) = map.entries.insert(key.clone(), entry) {
                map.collisions += 1;
                warn!(
                    event_name = "access.slug_collision",
                    slug = %key,
                    replaced_label = %previous.label,
                    "access slug collision, later entry wins"
                );
            }
        }

        map
    }

    /// Loads and parses a listing file. A missing or unreadable file yields an
    /// empty map.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(raw) => Self::build(parse_listing(&raw)),
            Err(error) => {
                warn!(
                    event_name = "access.listing_unavailable",
                    path = %path.display(),
                    error = %error,
                    "access listing could not be read, continuing with an empty map"
                );
                Self::default()
            }
        }
    }

    pub fn resolve(&self, slug: &str) -> Option<&AccessEntry> {
        self.entries.get(slug)
    }

    pub fn find_by_label(&self, label: &str) -> Option<&AccessEntry> {
        self.resolve(&slug(label))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// First `limit` slugs in lexical order.
    pub fn sample(&self, limit: usize) -> Vec<String> {
        let mut slugs = self.entries.keys().cloned().collect::<Vec<_>>();
        slugs.sort();
        slugs.truncate(limit);
        slugs
    }
}

/// Parses a heterogeneous access listing into ordered `(label, url)` pairs.
///
/// Supported shapes, one entry each:
/// - `label<TAB>url`
/// - `label - url`, `label: url`, `label | url`
/// - a label line followed by a line holding only the URL
///
/// Blank lines and `#` comments are ignored; anything else that does not form
/// a pair is skipped.
pub fn parse_listing(raw: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut pending_label: Option<String> = None;

    for line in raw.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((label, url)) = line.rsplit_once('\t') {
            let (label, url) = (label.trim(), url.trim());
            if !label.is_empty() && is_url(url) {
                pairs.push((label.to_string(), url.to_string()));
                pending_label = None;
                continue;
            }
        }

        if let Some(start) = url_start(line) {
            let label = line[..start].trim().trim_end_matches(['-', ':', '|', '\t']).trim();
            let url = line[start..].trim();
            match (label.is_empty(), pending_label.take()) {
                (false, _) => pairs.push((label.to_string(), url.to_string())),
                (true, Some(previous)) => pairs.push((previous, url.to_string())),
                (true, None) => {
                    debug!(event_name = "access.line_skipped", line = %line, "url without a label");
                }
            }
            continue;
        }

        if let Some(previous) = pending_label.replace(line.to_string()) {
            debug!(event_name = "access.line_skipped", line = %previous, "label without a url");
        }
    }

    pairs
}

fn is_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn url_start(line: &str) -> Option<usize> {
    [line.find("https://"), line.find("http://")].into_iter().flatten().min()
}
