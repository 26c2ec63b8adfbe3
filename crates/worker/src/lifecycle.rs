//! Install and activation steps.
//!
//! ### Install
//! - The static list is cached as one unit into the static store: every
//!   asset must come back 2xx or nothing is written and install fails.
//! - The external list goes into the dynamic store with the same
//!   all-or-nothing rule, but its failure is only logged.
//! - Both lists are fetched concurrently.
//!
//! ### Activate
//! - Every store whose name is not one of the current pair is deleted.
//! - Running it twice deletes nothing the second time.

use futures_util::future::{join, try_join_all};
use serde::{Deserialize, Serialize};
use sworker_core::{Error, WorkerRequest, WorkerResponse};
use url::Url;

use crate::router::Router;

/// What install managed to cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct InstallReport {
    pub static_cached: usize,
    pub external_cached: usize,
    /// Why the external list was skipped, if it was.
    pub external_error: Option<String>,
}

/// Stores removed and kept by a cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CleanupReport {
    pub deleted: Vec<String>,
    pub kept: Vec<String>,
}

/// Pre-cache both asset lists.
pub async fn install(router: &Router) -> Result<InstallReport, Error> {
    let manifest = router.manifest();
    let names = router.names();
    let static_urls = manifest.static_urls()?;
    let external_urls = manifest.external_urls()?;

    tracing::info!(
        "installing: {} static assets into {}, {} external into {}",
        static_urls.len(),
        names.static_store,
        external_urls.len(),
        names.dynamic_store
    );

    let (statics, externals) = join(
        precache(router, &names.static_store, static_urls),
        precache(router, &names.dynamic_store, external_urls),
    )
    .await;

    let static_cached = statics.map_err(Error::InstallFailed)?;
    let (external_cached, external_error) = match externals {
        Ok(count) => (count, None),
        Err(reason) => {
            tracing::warn!("external pre-cache skipped: {}", reason);
            (0, Some(reason))
        }
    };

    Ok(InstallReport { static_cached, external_cached, external_error })
}

/// Fetch every URL, then write them all in one batch.
async fn precache(router: &Router, store: &str, urls: Vec<Url>) -> Result<usize, String> {
    let fetches = urls.into_iter().map(|url| async move {
        let request = WorkerRequest::get(url);
        let response = router
            .fetcher()
            .fetch(&request)
            .await
            .map_err(|e| format!("{}: {}", request.url, e))?;
        if !response.status.is_success() {
            return Err(format!("{} returned {}", request.url, response.status));
        }
        Ok::<(WorkerRequest, WorkerResponse), String>((request, response))
    });
    let entries = try_join_all(fetches).await?;

    router
        .storage()
        .put_all(store, &entries)
        .await
        .map_err(|e| format!("writing {store}: {e}"))?;

    tracing::debug!("pre-cached {} entries into {}", entries.len(), store);
    Ok(entries.len())
}

/// Delete every store that is not current.
pub async fn cleanup(router: &Router) -> Result<CleanupReport, Error> {
    let names = router.names();
    let mut report = CleanupReport::default();

    for name in router.storage().keys().await? {
        if names.is_current(&name) {
            report.kept.push(name);
        } else {
            if router.storage().delete(&name).await? {
                tracing::info!("deleted stale store {}", name);
            }
            report.deleted.push(name);
        }
    }

    Ok(report)
}

/// Activation is a cleanup pass with logging.
pub async fn activate(router: &Router) -> Result<CleanupReport, Error> {
    let report = cleanup(router).await?;
    tracing::info!("activated: kept {:?}, deleted {} stale stores", report.kept, report.deleted.len());
    Ok(report)
}
