//! Drop-payload classification.
//!
//! # Responsibility
//! - Turn a dropped item (file path or URL string) into the artifact
//!   payload it should create.
//! - Derive display names when the drag source supplies none.
//!
//! # Invariants
//! - Anything matching a URL scheme becomes a `UrlMark`; everything else
//!   becomes an `Attachment`.
//! - Derived names are never empty.

use crate::model::artifact::ArtifactPayload;
use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)(?:https?|ftp)://\S+$").expect("valid url regex"));
static URL_HOST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)[a-z][a-z0-9+.-]*://([^/\s?#]+)").expect("valid host regex"));

const FALLBACK_FILE_NAME: &str = "Untitled file";
const FALLBACK_LINK_NAME: &str = "Untitled link";

/// One item handed over by a canvas drop gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedFile {
    /// Display name supplied by the drag source, when available.
    pub name: Option<String>,
    /// Filesystem path or URI carried by the drop.
    pub path: String,
}

impl DroppedFile {
    pub fn new(name: Option<&str>, path: &str) -> Self {
        Self {
            name: name.map(str::to_string),
            path: path.to_string(),
        }
    }
}

/// Classifies a dropped item into the payload it should create.
pub fn payload_for_drop(file: &DroppedFile) -> ArtifactPayload {
    let trimmed = file.path.trim();
    let supplied_name = file
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    if URL_RE.is_match(trimmed) {
        let name = supplied_name
            .map(str::to_string)
            .unwrap_or_else(|| host_name_for_url(trimmed));
        return ArtifactPayload::UrlMark {
            url: trimmed.to_string(),
            name,
        };
    }

    let file_name = supplied_name
        .map(str::to_string)
        .unwrap_or_else(|| file_name_for_path(trimmed));
    ArtifactPayload::Attachment {
        file_name,
        file_path: trimmed.to_string(),
    }
}

/// Last path segment, tolerating either separator.
fn file_name_for_path(path: &str) -> String {
    path.rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .unwrap_or(FALLBACK_FILE_NAME)
        .to_string()
}

/// Host part of the URL as a readable default name.
fn host_name_for_url(url: &str) -> String {
    URL_HOST_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|host| host.as_str().to_string())
        .unwrap_or_else(|| FALLBACK_LINK_NAME.to_string())
}
