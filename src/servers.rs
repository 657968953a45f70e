use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::config::{ClientConfig, DEFAULT_REGISTRY_URL};
use crate::error::ErddapError;
use crate::http::{HttpTransport, default_transport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerEntry {
    pub description: String,
    pub url: String,
}

pub type ServerMap = BTreeMap<String, ServerEntry>;

#[derive(Debug, Deserialize)]
struct RegistryRecord {
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Parse the registry document into a map keyed by short name.
///
/// Records without a short name are skipped.
pub fn parse_registry(content: &[u8]) -> Result<ServerMap, ErddapError> {
    let records: Vec<RegistryRecord> = serde_json::from_slice(content)
        .map_err(|err| ErddapError::RegistryFetch(err.to_string()))?;
    Ok(records
        .into_iter()
        .filter_map(|record| {
            let short_name = record.short_name.filter(|name| !name.is_empty())?;
            Some((
                short_name,
                ServerEntry {
                    description: record.name.unwrap_or_default(),
                    url: record.url.unwrap_or_default(),
                },
            ))
        })
        .collect())
}

/// Known ERDDAP servers, fetched from the registry once and kept for the
/// lifetime of the directory.
///
/// A failed fetch leaves the directory empty so the next call retries.
#[derive(Debug)]
pub struct ServerDirectory {
    registry_url: Cow<'static, str>,
    servers: Mutex<Option<Arc<ServerMap>>>,
}

impl ServerDirectory {
    pub const fn new(registry_url: &'static str) -> Self {
        Self {
            registry_url: Cow::Borrowed(registry_url),
            servers: Mutex::new(None),
        }
    }

    pub fn with_registry_url(registry_url: impl Into<String>) -> Self {
        Self {
            registry_url: Cow::Owned(registry_url.into()),
            servers: Mutex::new(None),
        }
    }

    pub fn with_config(config: &ClientConfig) -> Self {
        Self::with_registry_url(config.registry_url.clone())
    }

    pub fn registry_url(&self) -> &str {
        &self.registry_url
    }

    pub fn servers(&self, transport: &dyn HttpTransport) -> Result<Arc<ServerMap>, ErddapError> {
        let mut servers = self
            .servers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(cached) = servers.as_ref() {
            return Ok(Arc::clone(cached));
        }

        let content = transport
            .get(&self.registry_url, None)
            .map_err(|err| ErddapError::RegistryFetch(err.to_string()))?;
        let loaded = Arc::new(parse_registry(&content)?);
        tracing::debug!(count = loaded.len(), "loaded server registry");
        *servers = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    pub fn get(
        &self,
        transport: &dyn HttpTransport,
        short_name: &str,
    ) -> Result<Option<ServerEntry>, ErddapError> {
        Ok(self.servers(transport)?.get(short_name).cloned())
    }

    pub fn is_loaded(&self) -> bool {
        self.servers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }
}

static SERVERS: ServerDirectory = ServerDirectory::new(DEFAULT_REGISTRY_URL);

/// The process-wide server directory, loaded on first call.
pub fn servers_list() -> Result<Arc<ServerMap>, ErddapError> {
    let transport = default_transport()?;
    SERVERS.servers(transport)
}
