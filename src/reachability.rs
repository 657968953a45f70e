use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use crate::error::ErddapError;
use crate::http::{HttpTransport, RequestOptions, default_transport};

type CheckKey = (String, RequestOptions);

/// Memo of urls that answered a HEAD probe successfully.
///
/// Failures are never stored, so an unreachable url is probed again on the
/// next call. The lock is never held across the probe, so a slow server only
/// delays its own callers; concurrent first calls for the same key may each
/// probe and then record the same entry.
#[derive(Debug, Default)]
pub struct UrlCheckCache {
    reachable: Mutex<BTreeSet<CheckKey>>,
}

impl UrlCheckCache {
    pub const fn new() -> Self {
        Self {
            reachable: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn check(
        &self,
        transport: &dyn HttpTransport,
        url: &str,
        options: &RequestOptions,
    ) -> Result<String, ErddapError> {
        let key = (url.to_string(), options.clone());
        if self.lock().contains(&key) {
            tracing::debug!(url, "reachability cache hit");
            return Ok(key.0);
        }

        let status = transport
            .head(url, options)
            .map_err(|err| ErddapError::Unreachable {
                url: url.to_string(),
                reason: err.to_string(),
            })?;
        if !is_success(status) {
            return Err(ErddapError::Unreachable {
                url: url.to_string(),
                reason: format!("status {status}"),
            });
        }

        self.lock().insert(key);
        Ok(url.to_string())
    }

    pub fn contains(&self, url: &str, options: &RequestOptions) -> bool {
        self.lock().contains(&(url.to_string(), options.clone()))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<CheckKey>> {
        self.reachable
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Informational, success and redirection codes pass; 4xx and 5xx fail.
fn is_success(status: u16) -> bool {
    status < 400
}

static URL_CHECKS: UrlCheckCache = UrlCheckCache::new();

/// Probe `url` with a HEAD request instead of fetching the body.
///
/// Returns the url unchanged when the server answers without an error
/// status. Successful probes are remembered for the rest of the process.
pub fn check_url_response(url: &str, options: &RequestOptions) -> Result<String, ErddapError> {
    let transport = default_transport()?;
    URL_CHECKS.check(transport, url, options)
}
