//! Build-time asset manifest and versioned store names.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// Site-relative paths that must be available offline.
pub const STATIC_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/styles.css",
    "/script-optimized.js",
    "/manifest.json",
    "/Ahmed_M__Abdelmoneim.pdf",
    "/Pictures/profile.jpg",
    "/Pictures/1.jpg",
    "/Pictures/2.jpg",
    "/Pictures/3.jpg",
    "/Pictures/4.jpg",
    "/Pictures/5.jpg",
    "/Pictures/6.jpg",
    "/Pictures/7.jpg",
    "/Pictures/8.jpg",
    "/Pictures/9.jpg",
    "/Pictures/10.jpg",
    "/Pictures/11.jpg",
];

/// Third-party resources pre-cached into the dynamic store on install.
pub const EXTERNAL_ASSETS: &[&str] = &[
    "https://fonts.googleapis.com/css2?family=Inter:wght@300;400;500;600;700&display=swap",
    "https://fonts.gstatic.com",
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.0.0/css/all.min.css",
];

/// Hosts whose cross-origin resources are served stale-while-revalidate.
pub const EXTERNAL_HOSTS: &[&str] = &["googleapis.com", "gstatic.com", "cdnjs.cloudflare.com"];

/// Everything under this path is a static image.
pub const IMAGES_DIR: &str = "/Pictures/";

/// Extensions that always classify as static.
pub const STATIC_EXTENSIONS: &[&str] = &[".css", ".js", ".pdf"];

pub const DEFAULT_CACHE_VERSION: &str = "v1.0";

/// Names of the two live stores for one cache version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreNames {
    pub static_store: String,
    pub dynamic_store: String,
}

impl StoreNames {
    pub fn for_version(version: &str) -> Self {
        Self { static_store: format!("static-cache-{version}"), dynamic_store: format!("dynamic-cache-{version}") }
    }

    /// Whether a store survives activation.
    pub fn is_current(&self, name: &str) -> bool {
        name == self.static_store || name == self.dynamic_store
    }
}

impl Default for StoreNames {
    fn default() -> Self {
        Self::for_version(DEFAULT_CACHE_VERSION)
    }
}

/// The site's manifest, bound to its origin.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub origin: Url,
    pub static_assets: Vec<String>,
    pub external_assets: Vec<String>,
    pub external_hosts: Vec<String>,
}

impl Manifest {
    /// The embedded manifest for a site served from `origin`.
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            static_assets: STATIC_ASSETS.iter().map(|s| s.to_string()).collect(),
            external_assets: EXTERNAL_ASSETS.iter().map(|s| s.to_string()).collect(),
            external_hosts: EXTERNAL_HOSTS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the provider hosts. Hosts are trimmed and lowercased so they
    /// compare against request hosts directly.
    pub fn with_external_hosts(mut self, hosts: Vec<String>) -> Self {
        self.external_hosts = hosts.iter().map(|h| h.trim().to_ascii_lowercase()).collect();
        self
    }

    /// Absolute URLs of the static assets.
    pub fn static_urls(&self) -> Result<Vec<Url>, Error> {
        self.static_assets
            .iter()
            .map(|path| {
                self.origin
                    .join(path)
                    .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
            })
            .collect()
    }

    /// Parsed URLs of the external pre-cache list.
    pub fn external_urls(&self) -> Result<Vec<Url>, Error> {
        self.external_assets
            .iter()
            .map(|s| Url::parse(s).map_err(|e| Error::InvalidUrl(format!("{s}: {e}"))))
            .collect()
    }

    pub fn is_manifest_path(&self, path: &str) -> bool {
        self.static_assets.iter().any(|asset| asset == path)
    }
}
