//! Background sync: replay submissions queued while offline.
//!
//! Only [`CONTACT_FORM_SYNC`] has a handler; other tags are acknowledged
//! and ignored. A submission is removed as soon as the network answers it,
//! whatever the status. The first transport failure stops the replay and
//! leaves it and everything after it queued for the next sync.

use reqwest::{Method, header::{CONTENT_TYPE, HeaderValue}};
use serde::{Deserialize, Serialize};
use sworker_core::{CacheDb, Error, PendingSubmission, WorkerRequest};
use url::Url;

use crate::fetch::Fetcher;

pub const CONTACT_FORM_SYNC: &str = "contact-form-sync";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SyncReport {
    pub tag: String,
    pub replayed: usize,
    /// Entries dropped because they can never be sent (bad method or URL).
    pub discarded: usize,
    pub remaining: usize,
}

/// Run the sync handler for `tag`.
pub async fn replay(outbox: &CacheDb, fetcher: &dyn Fetcher, tag: &str) -> Result<SyncReport, Error> {
    let mut report = SyncReport { tag: tag.to_string(), ..Default::default() };
    if tag != CONTACT_FORM_SYNC {
        tracing::debug!(tag, "ignoring sync for unknown tag");
        return Ok(report);
    }

    let pending = outbox.pending_submissions(tag).await?;
    tracing::info!(tag, "replaying {} queued submissions", pending.len());

    for (index, submission) in pending.iter().enumerate() {
        let Some(request) = to_request(submission) else {
            tracing::warn!(id = submission.id, "discarding unsendable submission to {}", submission.url);
            outbox.remove_submission(submission.id).await?;
            report.discarded += 1;
            continue;
        };

        match fetcher.fetch(&request).await {
            Ok(response) => {
                tracing::debug!(id = submission.id, status = %response.status, "submission delivered");
                outbox.remove_submission(submission.id).await?;
                report.replayed += 1;
            }
            Err(e) => {
                report.remaining = pending.len() - index;
                return Err(Error::SyncFailed(format!(
                    "{} delivered, {} still queued: {}",
                    report.replayed, report.remaining, e
                )));
            }
        }
    }

    Ok(report)
}

fn to_request(submission: &PendingSubmission) -> Option<WorkerRequest> {
    let method = Method::from_bytes(submission.method.as_bytes()).ok()?;
    let url = Url::parse(&submission.url).ok()?;
    let mut request = WorkerRequest::new(method, url).with_body(submission.body.clone());
    if let Some(content_type) = &submission.content_type
        && let Ok(value) = HeaderValue::from_str(content_type)
    {
        request.headers.insert(CONTENT_TYPE, value);
    }
    Some(request)
}
