//! Request classification.
//!
//! Every request gets exactly one [`RequestKind`]. The rules are a single
//! ordered table evaluated first-match-wins, so precedence can be read off
//! [`RULES`] directly:
//!
//! 1. static asset: manifest path, images directory, or css/js/pdf
//! 2. external asset: cross-origin and on an allow-listed host
//! 3. html document: `Accept` mentions `text/html`
//! 4. other

use serde::{Deserialize, Serialize};

use crate::manifest::{IMAGES_DIR, Manifest, STATIC_EXTENSIONS};
use crate::request::WorkerRequest;

/// Classification tag, one per caching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    StaticAsset,
    ExternalAsset,
    HtmlDocument,
    Other,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::StaticAsset => "static_asset",
            RequestKind::ExternalAsset => "external_asset",
            RequestKind::HtmlDocument => "html_document",
            RequestKind::Other => "other",
        }
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

type Predicate = fn(&Manifest, &WorkerRequest) -> bool;

/// Ordered (predicate, tag) rules. `Other` is the fallthrough.
pub const RULES: &[(Predicate, RequestKind)] = &[
    (is_static_asset, RequestKind::StaticAsset),
    (is_external_asset, RequestKind::ExternalAsset),
    (is_html_document, RequestKind::HtmlDocument),
];

/// Classify a request against the site manifest.
pub fn classify(manifest: &Manifest, request: &WorkerRequest) -> RequestKind {
    RULES
        .iter()
        .find(|(rule, _)| rule(manifest, request))
        .map(|(_, kind)| *kind)
        .unwrap_or(RequestKind::Other)
}

pub fn is_static_asset(manifest: &Manifest, request: &WorkerRequest) -> bool {
    let path = request.url.path();
    manifest.is_manifest_path(path)
        || path.starts_with(IMAGES_DIR)
        || STATIC_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

pub fn is_external_asset(manifest: &Manifest, request: &WorkerRequest) -> bool {
    if request.url.origin() == manifest.origin.origin() {
        return false;
    }
    let Some(host) = request.url.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    manifest
        .external_hosts
        .iter()
        .any(|provider| host == *provider || host.ends_with(&format!(".{provider}")))
}

pub fn is_html_document(_manifest: &Manifest, request: &WorkerRequest) -> bool {
    request.accepts_html()
}
