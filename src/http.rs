use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::redirect::Policy;

use crate::config::ClientConfig;
use crate::error::ErddapError;

/// HTTP basic credentials passed through to the server untouched.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Per-request options for a header-only probe.
///
/// Ordered and hashable so that it can be part of a memoization key.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestOptions {
    pub auth: Option<BasicAuth>,
    pub timeout: Option<Duration>,
    pub headers: BTreeMap<String, String>,
    pub allow_redirects: bool,
}

impl RequestOptions {
    pub fn with_auth(mut self, auth: BasicAuth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn follow_redirects(mut self) -> Self {
        self.allow_redirects = true;
        self
    }
}

pub trait HttpTransport: Send + Sync {
    /// GET the url, following redirects, and return the whole body.
    ///
    /// Non-success statuses are not errors here; only transport failures are.
    fn get(&self, url: &str, auth: Option<&BasicAuth>) -> Result<Vec<u8>, ErddapError>;

    /// HEAD the url and return the response status code.
    fn head(&self, url: &str, options: &RequestOptions) -> Result<u16, ErddapError>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    no_redirect: Client,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ErddapError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|err| ErddapError::HttpClient(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers.clone())
            .timeout(config.timeout())
            .build()
            .map_err(|err| ErddapError::HttpClient(err.to_string()))?;
        let no_redirect = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .redirect(Policy::none())
            .build()
            .map_err(|err| ErddapError::HttpClient(err.to_string()))?;
        Ok(Self {
            client,
            no_redirect,
        })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &str, auth: Option<&BasicAuth>) -> Result<Vec<u8>, ErddapError> {
        tracing::debug!(url, "GET");
        let request = with_auth(self.client.get(url), auth);
        let response = request.send().map_err(|err| network(url, &err))?;
        tracing::debug!(url, status = response.status().as_u16(), "GET response");
        let bytes = response.bytes().map_err(|err| network(url, &err))?;
        Ok(bytes.to_vec())
    }

    fn head(&self, url: &str, options: &RequestOptions) -> Result<u16, ErddapError> {
        tracing::debug!(url, "HEAD");
        let client = if options.allow_redirects {
            &self.client
        } else {
            &self.no_redirect
        };
        let mut request = with_auth(client.head(url), options.auth.as_ref());
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let response = request.send().map_err(|err| network(url, &err))?;
        Ok(response.status().as_u16())
    }
}

fn with_auth(request: RequestBuilder, auth: Option<&BasicAuth>) -> RequestBuilder {
    match auth {
        Some(auth) => request.basic_auth(&auth.username, Some(&auth.password)),
        None => request,
    }
}

fn network(url: &str, err: &reqwest::Error) -> ErddapError {
    ErddapError::Network {
        url: url.to_string(),
        message: err.to_string(),
    }
}

static DEFAULT_TRANSPORT: OnceLock<ReqwestTransport> = OnceLock::new();

/// Process-wide transport built from [`ClientConfig::default`] on first use.
pub fn default_transport() -> Result<&'static ReqwestTransport, ErddapError> {
    if let Some(transport) = DEFAULT_TRANSPORT.get() {
        return Ok(transport);
    }
    let transport = ReqwestTransport::new(&ClientConfig::default())?;
    Ok(DEFAULT_TRANSPORT.get_or_init(|| transport))
}

/// Thin GET wrapper: fetch the body of `url` as an owned byte buffer.
pub fn urlopen(url: &str, auth: Option<&BasicAuth>) -> Result<Vec<u8>, ErddapError> {
    default_transport()?.get(url, auth)
}
