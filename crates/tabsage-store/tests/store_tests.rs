//! Integration tests for the cache/session store: producer idempotence,
//! session projection, and sweep behavior.

use std::cell::Cell;
use std::fs;
use tabsage_store::{CacheArtifacts, Error, Store};
use tabsage_types::{FieldSchema, FieldType, SourceIdentity, TableSchema};
use tempfile::TempDir;

fn sample_artifacts() -> CacheArtifacts {
    CacheArtifacts {
        schema: TableSchema {
            fields: vec![FieldSchema {
                name: "qty".to_string(),
                dtype: FieldType::Float,
                definition: vec![
                    "[info] Numeric field 'qty': totals per batch.".to_string(),
                    "[format] float; value range \u{2248} [0, 375000].".to_string(),
                ],
                summary: None,
                samples: vec![],
                sql_type: None,
            }],
        },
        preview_markdown: "| qty |\n|---|\n| 100 |".to_string(),
    }
}

fn world() -> (TempDir, Store, SourceIdentity) {
    let tmp = TempDir::new().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    let source = tmp.path().join("report.csv");
    fs::write(&source, "qty\n100\n").unwrap();
    let identity = SourceIdentity::new(&source, None);
    (tmp, store, identity)
}

#[test]
fn test_producer_invoked_at_most_once() {
    let (_tmp, store, identity) = world();
    let calls = Cell::new(0);

    let first = store
        .get_or_create_cache(&identity, || {
            calls.set(calls.get() + 1);
            Ok(sample_artifacts())
        })
        .unwrap();
    let second = store
        .get_or_create_cache(&identity, || {
            calls.set(calls.get() + 1);
            Ok(sample_artifacts())
        })
        .unwrap();

    assert_eq!(calls.get(), 1);
    assert_eq!(
        fs::read_to_string(first.schema_path()).unwrap(),
        fs::read_to_string(second.schema_path()).unwrap()
    );
}

#[test]
fn test_two_sessions_share_one_cache_entry() {
    // Two sequential bindings against the same identity: one producer
    // invocation, two independent projections.
    let (_tmp, store, identity) = world();
    let calls = Cell::new(0);

    for thread in ["thread-a", "thread-b"] {
        let entry = store
            .get_or_create_cache(&identity, || {
                calls.set(calls.get() + 1);
                Ok(sample_artifacts())
            })
            .unwrap();
        let session = store.project_into_session(thread, &entry).unwrap();

        assert_eq!(
            fs::read(entry.schema_path()).unwrap(),
            fs::read(session.schema_path()).unwrap()
        );
        assert_eq!(
            fs::read(entry.preview_path()).unwrap(),
            fs::read(session.preview_path()).unwrap()
        );
    }

    assert_eq!(calls.get(), 1);
}

#[test]
fn test_projection_fails_on_missing_artifact() {
    let (_tmp, store, identity) = world();
    let entry = store
        .get_or_create_cache(&identity, || Ok(sample_artifacts()))
        .unwrap();

    fs::remove_file(entry.preview_path()).unwrap();

    let err = store.project_into_session("thread-x", &entry).unwrap_err();
    assert!(matches!(err, Error::MissingArtifact(_)));
}

#[test]
fn test_reset_session_is_tolerant() {
    let (_tmp, store, identity) = world();
    // Missing directory: no panic, no error surfaced.
    store.reset_session("never-created");

    let entry = store
        .get_or_create_cache(&identity, || Ok(sample_artifacts()))
        .unwrap();
    let session = store.project_into_session("thread-y", &entry).unwrap();
    assert!(session.dir().exists());

    store.reset_session("thread-y");
    assert!(!session.dir().exists());
}

#[test]
fn test_reset_all_sessions_sweeps_and_recreates() {
    let (_tmp, store, identity) = world();
    let entry = store
        .get_or_create_cache(&identity, || Ok(sample_artifacts()))
        .unwrap();
    store.project_into_session("a", &entry).unwrap();
    store.project_into_session("b", &entry).unwrap();

    store.reset_all_sessions();

    assert!(store.sessions_root().exists());
    assert_eq!(fs::read_dir(store.sessions_root()).unwrap().count(), 0);
    // Cache survives the sweep.
    assert!(entry.schema_path().exists());
}

#[test]
fn test_cache_entry_loads_schema_back() {
    let (_tmp, store, identity) = world();
    let entry = store
        .get_or_create_cache(&identity, || Ok(sample_artifacts()))
        .unwrap();
    let schema = entry.load_schema().unwrap();
    assert_eq!(schema.field_names(), vec!["qty"]);
    assert_eq!(schema.numeric_fields(), vec!["qty"]);
}
