use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ErddapError;

pub const DEFAULT_REGISTRY_URL: &str =
    "https://raw.githubusercontent.com/IrishMarineInstitute/awesome-erddap/master/erddaps.json";
pub const DEFAULT_TEMP_PREFIX: &str = "erddap_fetch_";
pub const DEFAULT_TEMP_SUFFIX: &str = ".nc";

/// Settings for the HTTP transport and the temp-file fallback.
///
/// Nothing is read implicitly: build one in code or deserialize it from JSON.
/// Every field is optional in the JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    pub user_agent: String,
    pub timeout_secs: Option<u64>,
    pub registry_url: String,
    pub temp_prefix: String,
    pub temp_suffix: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: None,
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            temp_prefix: DEFAULT_TEMP_PREFIX.to_string(),
            temp_suffix: DEFAULT_TEMP_SUFFIX.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn load(path: &Path) -> Result<Self, ErddapError> {
        let content =
            fs::read_to_string(path).map_err(|_| ErddapError::ConfigRead(path.to_path_buf()))?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ErddapError> {
        serde_json::from_str(content).map_err(|err| ErddapError::ConfigParse(err.to_string()))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

pub fn default_user_agent() -> String {
    format!("erddap-fetch/{}", env!("CARGO_PKG_VERSION"))
}
