mod common;

use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;

use assert_matches::assert_matches;

use erddap_fetch::config::{ClientConfig, DEFAULT_REGISTRY_URL};
use erddap_fetch::error::ErddapError;
use erddap_fetch::servers::ServerDirectory;

use common::{MockTransport, init_tracing};

fn fixture() -> Vec<u8> {
    fs::read("tests/fixtures/erddaps.json").unwrap()
}

#[test]
fn registry_is_fetched_once() {
    init_tracing();
    let transport = MockTransport::default();
    transport.serve(DEFAULT_REGISTRY_URL, &fixture());
    let directory = ServerDirectory::new(DEFAULT_REGISTRY_URL);
    assert!(!directory.is_loaded());

    let first = directory.servers(&transport).unwrap();
    let second = directory.servers(&transport).unwrap();

    assert_eq!(transport.gets(), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert!(directory.is_loaded());
}

#[test]
fn registry_entries_are_keyed_by_short_name() {
    let transport = MockTransport::default();
    transport.serve(DEFAULT_REGISTRY_URL, &fixture());
    let directory = ServerDirectory::new(DEFAULT_REGISTRY_URL);

    let servers = directory.servers(&transport).unwrap();
    assert_eq!(servers.len(), 3);
    assert!(!servers.contains_key(""));

    let mii = directory.get(&transport, "MII").unwrap().unwrap();
    assert_eq!(mii.description, "Irish Marine Institute");
    assert_eq!(mii.url, "https://erddap.marine.ie/erddap/");
    assert!(directory.get(&transport, "nope").unwrap().is_none());
    assert_eq!(transport.gets(), 1);
}

#[test]
fn failed_fetch_is_retried_later() {
    let transport = MockTransport::default();
    let directory = ServerDirectory::with_registry_url("https://registry.example.org/erddaps.json");

    let err = directory.servers(&transport).unwrap_err();
    assert_matches!(err, ErddapError::RegistryFetch(_));
    assert!(!directory.is_loaded());

    transport.serve(directory.registry_url(), &fixture());
    let servers = directory.servers(&transport).unwrap();
    assert_eq!(servers.len(), 3);
    assert_eq!(transport.gets(), 2);
}

#[test]
fn malformed_registry_is_not_cached() {
    let transport = MockTransport::default();
    transport.serve(DEFAULT_REGISTRY_URL, b"<html>rate limited</html>");
    let directory = ServerDirectory::new(DEFAULT_REGISTRY_URL);

    let err = directory.servers(&transport).unwrap_err();
    assert_matches!(err, ErddapError::RegistryFetch(_));
    assert!(!directory.is_loaded());
}

#[test]
fn configured_registry_url_is_fetched() {
    let config = ClientConfig {
        registry_url: "https://mirror.example.org/awesome-erddap/erddaps.json".to_string(),
        ..ClientConfig::default()
    };
    let transport = MockTransport::default();
    transport.serve(&config.registry_url, &fixture());
    let directory = ServerDirectory::with_config(&config);

    assert_eq!(directory.registry_url(), config.registry_url);
    let servers = directory.servers(&transport).unwrap();
    assert!(servers.contains_key("CSIRO"));
    assert_eq!(transport.gets(), 1);
}

#[test]
fn concurrent_first_access_fetches_once() {
    const THREADS: usize = 8;
    let transport = MockTransport::default();
    transport.serve(DEFAULT_REGISTRY_URL, &fixture());
    let directory = ServerDirectory::new(DEFAULT_REGISTRY_URL);
    let barrier = Barrier::new(THREADS);

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    directory.servers(&transport).unwrap()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert_eq!(transport.gets(), 1);
    assert!(results.iter().all(|servers| Arc::ptr_eq(servers, &results[0])));
    assert_eq!(results[0].len(), 3);
}
