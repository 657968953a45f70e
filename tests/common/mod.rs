#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use erddap_fetch::error::ErddapError;
use erddap_fetch::http::{BasicAuth, HttpTransport, RequestOptions};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Serves canned bodies by url and counts GET requests.
#[derive(Default)]
pub struct MockTransport {
    bodies: Mutex<HashMap<String, Vec<u8>>>,
    gets: Mutex<usize>,
    last_auth: Mutex<Option<BasicAuth>>,
}

impl MockTransport {
    pub fn serve(&self, url: &str, body: &[u8]) {
        self.bodies
            .lock()
            .unwrap()
            .insert(url.to_string(), body.to_vec());
    }

    pub fn gets(&self) -> usize {
        *self.gets.lock().unwrap()
    }

    pub fn last_auth(&self) -> Option<BasicAuth> {
        self.last_auth.lock().unwrap().clone()
    }
}

impl HttpTransport for MockTransport {
    fn get(&self, url: &str, auth: Option<&BasicAuth>) -> Result<Vec<u8>, ErddapError> {
        *self.gets.lock().unwrap() += 1;
        *self.last_auth.lock().unwrap() = auth.cloned();
        self.bodies
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| ErddapError::Network {
                url: url.to_string(),
                message: "connection refused".to_string(),
            })
    }

    fn head(&self, url: &str, _options: &RequestOptions) -> Result<u16, ErddapError> {
        let known = self.bodies.lock().unwrap().contains_key(url);
        Ok(if known { 200 } else { 404 })
    }
}
