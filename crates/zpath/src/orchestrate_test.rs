// Copyright (c) Contributors to the zpath project.
// SPDX-License-Identifier: Apache-2.0

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rstest::rstest;

use super::*;
use crate::diff::EnvChange;
use crate::executor::BindingExecutor;
use crate::mutate::{InsertMode, PATH_LIST_SEPARATOR};
use crate::services::Blocker;

const FEED: &str = "https://example.com/foo.xml";

struct FakeAliases(HashMap<String, String>);

#[async_trait]
impl AliasResolver for FakeAliases {
    async fn resolve(&self, alias: &str) -> Result<String> {
        self.0.get(alias).cloned().ok_or_else(|| Error::CommandFailed {
            command: format!("0alias -r {alias}"),
            code: Some(1),
            stderr: format!("unknown alias {alias}"),
        })
    }
}

struct FakeSolver(SelectionGraph);

#[async_trait]
impl Solver for FakeSolver {
    async fn select(&self, url: &str) -> Result<SelectionGraph> {
        if url == self.0.interface {
            Ok(self.0.clone())
        } else {
            Err(Error::CommandFailed {
                command: format!("0launch --get-selections {url}"),
                code: Some(1),
                stderr: "no such feed".to_string(),
            })
        }
    }
}

/// Store whose contents can be filled in by [`FakeFetcher`].
#[derive(Clone, Default)]
struct SharedStore(Arc<Mutex<HashMap<String, PathBuf>>>);

impl SharedStore {
    fn with(entries: &[(&str, &str)]) -> Self {
        let store = Self::default();
        for (digest, path) in entries {
            store.add(digest, path);
        }
        store
    }

    fn add(&self, digest: &str, path: &str) {
        self.0
            .lock()
            .unwrap()
            .insert(digest.to_string(), PathBuf::from(path));
    }
}

impl ImplementationStore for SharedStore {
    fn lookup(&self, digest: &str) -> Option<PathBuf> {
        self.0.lock().unwrap().get(digest).cloned()
    }
}

/// Fetcher that "downloads" into a [`SharedStore`] from a blocker.
#[derive(Clone)]
struct FakeFetcher {
    store: SharedStore,
    fail: bool,
    requested: Arc<Mutex<Vec<String>>>,
}

impl FakeFetcher {
    fn new(store: &SharedStore) -> Self {
        Self {
            store: store.clone(),
            fail: false,
            requested: Arc::default(),
        }
    }

    fn failing(store: &SharedStore) -> Self {
        Self {
            fail: true,
            ..Self::new(store)
        }
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn download_missing(
        &self,
        _selections: &SelectionGraph,
        missing: &[&ImplementationRecord],
    ) -> Result<Option<Blocker>> {
        let digests: Vec<String> = missing
            .iter()
            .flat_map(|r| r.digests.first().cloned())
            .collect();
        self.requested.lock().unwrap().extend(digests.clone());

        let store = self.store.clone();
        let fail = self.fail;
        Ok(Some(Blocker::new("fake download", async move {
            if fail {
                return Err(Error::CommandFailed {
                    command: "0launch --download-only".to_string(),
                    code: Some(1),
                    stderr: "network unreachable".to_string(),
                });
            }
            for digest in digests {
                store.add(&digest, &format!("/store/{digest}"));
            }
            Ok(())
        })))
    }
}

fn root_record(digest: &str) -> ImplementationRecord {
    ImplementationRecord {
        digests: vec![digest.to_string()],
        ..ImplementationRecord::new(FEED)
    }
}

fn orchestrator(selections: SelectionGraph, store: &SharedStore) -> Orchestrator {
    orchestrator_with_fetcher(selections, store, FakeFetcher::new(store))
}

fn orchestrator_with_fetcher(
    selections: SelectionGraph,
    store: &SharedStore,
    fetcher: FakeFetcher,
) -> Orchestrator {
    let aliases = FakeAliases(HashMap::from([("foo".to_string(), FEED.to_string())]));
    Orchestrator::new(
        aliases,
        FakeSolver(selections),
        fetcher,
        BindingExecutor,
        store.clone(),
    )
}

fn env(vars: &[(&str, &str)]) -> EnvSnapshot {
    vars.iter().copied().collect()
}

fn change(name: &str, value: &str) -> EnvChange {
    EnvChange {
        name: name.to_string(),
        value: Some(value.to_string()),
    }
}

#[rstest]
#[tokio::test]
async fn test_prepend_onto_unset_variable_is_replace() {
    let store = SharedStore::with(&[("abc123", "/store/abc123")]);
    let orch = orchestrator(SelectionGraph::new(FEED, [root_record("abc123")]), &store);
    let request = Request::new(FEED)
        .with_insertion(InsertionRequest::new("FOO_PATH").with_mode(InsertMode::Prepend));

    let report = orch
        .run(&request, env(&[("HOME", "/home/user")]))
        .await
        .unwrap();

    assert_eq!(report.changes, vec![change("FOO_PATH", "/store/abc123")]);
    assert!(report.messages.is_empty());
    assert_eq!(report.render(), vec!["export FOO_PATH=/store/abc123"]);
}

#[rstest]
#[tokio::test]
#[cfg(unix)]
async fn test_append_with_subpath() {
    let store = SharedStore::with(&[("xyz", "/store/xyz")]);
    let orch = orchestrator(SelectionGraph::new(FEED, [root_record("xyz")]), &store);
    let request = Request::new(FEED).with_insertion(
        InsertionRequest::new("FOO_PATH")
            .with_mode(InsertMode::Append)
            .with_subpath("bin"),
    );

    let report = orch
        .run(&request, env(&[("FOO_PATH", "/usr/bin")]))
        .await
        .unwrap();

    assert_eq!(
        report.render(),
        vec!["export FOO_PATH=/usr/bin:/store/xyz/bin"]
    );
}

#[rstest]
#[tokio::test]
async fn test_alias_is_resolved() {
    let store = SharedStore::with(&[("abc123", "/store/abc123")]);
    let orch = orchestrator(SelectionGraph::new(FEED, [root_record("abc123")]), &store);
    let request = Request::new("foo").with_insertion(InsertionRequest::new("FOO_PATH"));

    let report = orch.run(&request, env(&[])).await.unwrap();
    assert_eq!(report.changes, vec![change("FOO_PATH", "/store/abc123")]);
}

#[rstest]
#[tokio::test]
async fn test_alias_failure() {
    let store = SharedStore::default();
    let orch = orchestrator(SelectionGraph::new(FEED, [root_record("abc123")]), &store);
    let request = Request::new("unknown").with_insertion(InsertionRequest::new("FOO_PATH"));

    let err = orch.run(&request, env(&[])).await.unwrap_err();
    match err {
        Error::AliasResolution { alias, reason } => {
            assert_eq!(alias, "unknown");
            assert!(reason.contains("unknown alias"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[rstest]
#[tokio::test]
async fn test_solver_failure_is_resolution_error() {
    let store = SharedStore::default();
    let orch = orchestrator(SelectionGraph::new(FEED, []), &store);
    let request = Request::new("https://example.com/other.xml");

    let err = orch.run(&request, env(&[])).await.unwrap_err();
    assert!(matches!(err, Error::Resolution { .. }), "{err:?}");
}

#[rstest]
#[tokio::test]
async fn test_missing_implementations_are_downloaded_first() {
    let store = SharedStore::default();
    let fetcher = FakeFetcher::new(&store);
    let requested = fetcher.requested.clone();
    let orch = orchestrator_with_fetcher(
        SelectionGraph::new(FEED, [root_record("fresh")]),
        &store,
        fetcher,
    );
    let request = Request::new(FEED).with_insertion(InsertionRequest::new("FOO_PATH"));

    let report = orch.run(&request, env(&[])).await.unwrap();

    assert_eq!(*requested.lock().unwrap(), vec!["fresh".to_string()]);
    assert_eq!(report.changes, vec![change("FOO_PATH", "/store/fresh")]);
}

#[rstest]
#[tokio::test]
async fn test_present_implementations_are_not_downloaded() {
    let store = SharedStore::with(&[("abc123", "/store/abc123")]);
    let fetcher = FakeFetcher::failing(&store);
    let requested = fetcher.requested.clone();
    let orch = orchestrator_with_fetcher(
        SelectionGraph::new(FEED, [root_record("abc123")]),
        &store,
        fetcher,
    );

    orch.run(&Request::new(FEED), env(&[])).await.unwrap();
    assert!(requested.lock().unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_download_failure() {
    let store = SharedStore::default();
    let orch = orchestrator_with_fetcher(
        SelectionGraph::new(FEED, [root_record("fresh")]),
        &store,
        FakeFetcher::failing(&store),
    );
    let request = Request::new(FEED).with_insertion(InsertionRequest::new("FOO_PATH"));

    let err = orch.run(&request, env(&[])).await.unwrap_err();
    match err {
        Error::Download { url, reason } => {
            assert_eq!(url, FEED);
            assert!(reason.contains("network unreachable"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[rstest]
#[tokio::test]
async fn test_root_path_not_found() {
    // The download "succeeds" but puts nothing where the root can be found.
    let store = SharedStore::default();
    let mut root = root_record("abc123");
    root.digests.clear();
    let orch = orchestrator(SelectionGraph::new(FEED, [root]), &store);
    let request = Request::new(FEED).with_insertion(InsertionRequest::new("FOO_PATH"));

    let err = orch.run(&request, env(&[])).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }), "{err:?}");
}

#[rstest]
#[tokio::test]
async fn test_root_missing_from_selections() {
    let store = SharedStore::with(&[("dep", "/store/dep")]);
    let dep = ImplementationRecord {
        digests: vec!["dep".to_string()],
        ..ImplementationRecord::new("https://example.com/dep.xml")
    };
    let orch = orchestrator(SelectionGraph::new(FEED, [dep]), &store);
    let request = Request::new(FEED).with_insertion(InsertionRequest::new("FOO_PATH"));

    let err = orch.run(&request, env(&[])).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }), "{err:?}");
}

#[rstest]
#[tokio::test]
async fn test_root_path_only_needed_when_variable_requested() {
    let store = SharedStore::default();
    let mut root = root_record("abc123");
    root.digests.clear();
    let orch = orchestrator(SelectionGraph::new(FEED, [root]), &store);

    let report = orch
        .run(&Request::new(FEED), env(&[("A", "1")]))
        .await
        .unwrap();
    assert!(report.changes.is_empty());
}

#[rstest]
#[tokio::test]
#[cfg(unix)]
async fn test_binding_changes_are_reported() {
    let store = SharedStore::with(&[("abc123", "/store/abc123"), ("dep", "/store/dep")]);
    let mut root = root_record("abc123");
    root.environment = serde_yaml::from_str("- set: FOO_HOME\n  insert: ''\n").unwrap();
    let mut dep = ImplementationRecord::new("https://example.com/dep.xml");
    dep.digests.push("dep".to_string());
    dep.environment = serde_yaml::from_str("- prepend: PATH\n  insert: bin\n").unwrap();
    let orch = orchestrator(SelectionGraph::new(FEED, [root, dep]), &store);
    let request = Request::new(FEED).with_insertion(InsertionRequest::new("FOO_PATH"));

    let report = orch
        .run(&request, env(&[("PATH", "/usr/bin"), ("HOME", "/home/user")]))
        .await
        .unwrap();

    let changes: HashSet<(String, Option<String>)> = report
        .changes
        .into_iter()
        .map(|c| (c.name, c.value))
        .collect();
    let expected: HashSet<(String, Option<String>)> = [
        ("FOO_PATH", "/store/abc123".to_string()),
        ("FOO_HOME", "/store/abc123".to_string()),
        ("PATH", format!("/store/dep/bin{PATH_LIST_SEPARATOR}/usr/bin")),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), Some(v)))
    .collect();
    assert_eq!(changes, expected);
}

#[rstest]
#[tokio::test]
#[cfg(unix)]
async fn test_explicit_insertion_overrides_bindings() {
    let store = SharedStore::with(&[("abc123", "/store/abc123")]);
    let mut root = root_record("abc123");
    root.environment = serde_yaml::from_str("- prepend: PATH\n  insert: bin\n").unwrap();
    let orch = orchestrator(SelectionGraph::new(FEED, [root]), &store);
    let request = Request::new(FEED).with_insertion(
        InsertionRequest::new("PATH")
            .with_mode(InsertMode::Append)
            .with_subpath("sbin"),
    );

    let report = orch
        .run(&request, env(&[("PATH", "/usr/bin")]))
        .await
        .unwrap();

    assert_eq!(
        report.changes,
        vec![change("PATH", "/usr/bin:/store/abc123/sbin")]
    );
    assert_eq!(report.messages.len(), 1);
    assert!(report.messages[0].contains("PATH"));
}

#[rstest]
#[tokio::test]
async fn test_no_changes_without_bindings_or_request() {
    let store = SharedStore::with(&[("abc123", "/store/abc123")]);
    let orch = orchestrator(SelectionGraph::new(FEED, [root_record("abc123")]), &store);
    let report = orch
        .run(&Request::new(FEED), env(&[("PATH", "/usr/bin")]))
        .await
        .unwrap();
    assert_eq!(report, Report::default());
}

#[rstest]
#[case("https://example.com/foo.xml", true)]
#[case("file:///tmp/foo.xml", true)]
#[case("foo", false)]
#[case("/local/feed.xml", false)]
fn test_is_url(#[case] feed: &str, #[case] expected: bool) {
    assert_eq!(is_url(feed), expected);
}
