//! ArtifactStore Tests
//!
//! End-to-end behaviour of the façade against a real temp directory.

use std::io::Write;
use std::sync::Arc;

use tempstore_core::{ErrorKind, Operation, ReferenceResolver, ResourceKey, StoreCause, UrlError};
use tempstore_test_utils::{
    setup_test_store, setup_test_store_with, FailingSerializer, RejectingSerializer,
    TEST_NAMESPACE,
};

#[test]
fn test_write_then_url_example_scenario() {
    let t = setup_test_store("Doc:Demo");

    let mut out = t.store.open_for_write("plantuml_a1b2").unwrap();
    out.write_all(b"\x89PNG").unwrap();
    let written = out.finish().unwrap();

    assert_eq!(written, t.namespace_root().join("Doc%3ADemo").join("plantuml_a1b2"));
    assert_eq!(std::fs::read(&written).unwrap(), b"\x89PNG");

    let url = t.store.get_url("plantuml_a1b2").unwrap();
    assert_eq!(
        url.as_str(),
        "https://wiki/bin/tmp/plantuml/Doc:Demo/plantuml_a1b2"
    );

    let decoded = ReferenceResolver::resolve(t.scheme.as_ref(), &url).unwrap();
    assert_eq!(
        decoded,
        ResourceKey::new(TEST_NAMESPACE, "Doc:Demo", "plantuml_a1b2").unwrap()
    );
    assert_eq!(t.store.resolve_url(&url, t.scheme.as_ref()).unwrap(), written);
}

#[test]
fn test_same_artifact_in_two_contexts() {
    let t = setup_test_store("docA");
    let mut a = t.store.open_for_write("diagram1").unwrap();
    a.write_all(b"A").unwrap();
    let path_a = a.finish().unwrap();
    let url_a = t.store.get_url("diagram1").unwrap();

    t.context.switch_to("docB");
    let mut b = t.store.open_for_write("diagram1").unwrap();
    b.write_all(b"B").unwrap();
    let path_b = b.finish().unwrap();
    let url_b = t.store.get_url("diagram1").unwrap();

    assert_ne!(path_a, path_b);
    assert_ne!(url_a, url_b);
    assert_eq!(std::fs::read(&path_a).unwrap(), b"A");
    assert_eq!(std::fs::read(&path_b).unwrap(), b"B");

    // URLs keep pointing at their own context after the switch
    assert_eq!(t.store.resolve_url(&url_a, t.scheme.as_ref()).unwrap(), path_a);
    assert_eq!(t.store.resolve_url(&url_b, t.scheme.as_ref()).unwrap(), path_b);
}

#[test]
fn test_repeated_calls_are_deterministic() {
    let t = setup_test_store("Doc");
    assert_eq!(t.store.locate("img").unwrap(), t.store.locate("img").unwrap());
    assert_eq!(t.store.get_url("img").unwrap(), t.store.get_url("img").unwrap());
}

#[test]
fn test_traversal_ids_stay_inside_namespace() {
    let t = setup_test_store("Doc");
    let root = t.namespace_root();

    for id in ["../../etc/passwd", "..", ".", "a/../../b", "/abs", "C:\\x", "\0nul"] {
        let mut out = t.store.open_for_write(id).unwrap();
        out.write_all(id.as_bytes()).unwrap();
        let path = out.finish().unwrap();
        assert_eq!(path.parent().unwrap(), root.join("Doc"), "{id}");
        assert!(path.is_file(), "{id}");
    }

    // Nothing was written outside the namespace root
    let entries: Vec<_> = std::fs::read_dir(t.dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from(TEST_NAMESPACE)]);
}

#[test]
fn test_traversal_context_stays_inside_namespace() {
    let t = setup_test_store("../../outside");
    let path = t.store.open_for_write("x").unwrap().finish().unwrap();
    assert!(path.starts_with(t.namespace_root()));
    assert_eq!(path.parent().unwrap().parent().unwrap(), t.namespace_root());
}

#[test]
fn test_empty_artifact_id_fails_without_side_effects() {
    let t = setup_test_store("Doc");

    let err = t.store.open_for_write("").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidKey);
    assert_eq!(err.operation(), Operation::OpenForWrite);
    assert_eq!(err.artifact_id(), "");
    assert!(!t.namespace_root().exists());

    assert_eq!(t.store.get_url("").unwrap_err().kind(), ErrorKind::InvalidKey);
}

#[test]
fn test_oversized_id_has_no_url() {
    let t = setup_test_store("Doc");
    let id = "x".repeat(300);

    let err = t.store.get_url(&id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidKey);
    assert_eq!(err.operation(), Operation::GetUrl);
    assert_eq!(err.artifact_id(), id);
    assert_eq!(t.store.open_for_write(&id).unwrap_err().kind(), ErrorKind::InvalidKey);
    assert!(!t.namespace_root().exists());
}

#[test]
fn test_device_names_and_trailing_dots_get_own_files() {
    let t = setup_test_store("Doc");

    let mut paths = Vec::new();
    for id in ["CON", "nul.txt", "com1", "diagram.", "diagram", "diagram "] {
        let mut out = t.store.open_for_write(id).unwrap();
        out.write_all(id.as_bytes()).unwrap();
        let path = out.finish().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), id.as_bytes(), "{id}");
        paths.push(path);
    }

    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), 6);
}

#[test]
fn test_unsupported_reference_reported() {
    let t = setup_test_store_with("Doc", Some(Arc::new(RejectingSerializer)));

    let err = t.store.get_url("diagram1").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedReference);
    assert_eq!(err.artifact_id(), "diagram1");
    assert!(matches!(
        err.cause(),
        StoreCause::Url(UrlError::UnsupportedReference { reason, .. }) if reason.contains("plantuml")
    ));

    // Writing does not depend on the URL layer
    assert!(t.store.open_for_write("diagram1").is_ok());
}

#[test]
fn test_serialization_failure_keeps_cause() {
    let t = setup_test_store_with("Doc", Some(Arc::new(FailingSerializer)));

    let err = t.store.get_url("diagram1").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SerializationFailed);

    let mut chain = Vec::new();
    let mut source: Option<&dyn std::error::Error> = Some(&err);
    while let Some(e) = source {
        chain.push(e.to_string());
        source = e.source();
    }
    assert_eq!(chain.first().unwrap(), "failed to compute the URL for artifact [diagram1]");
    assert_eq!(chain.last().unwrap(), "no active request");
}

#[test]
fn test_blocked_root_is_storage_unavailable() {
    let t = setup_test_store("Doc");
    std::fs::write(t.namespace_root(), b"occupied").unwrap();

    let err = t.store.open_for_write("img").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
    assert_eq!(err.artifact_id(), "img");
}

#[test]
fn test_concurrent_first_use() {
    let t = setup_test_store("Doc");

    std::thread::scope(|s| {
        for i in 0..16 {
            let store = &t.store;
            s.spawn(move || {
                let mut out = store.open_for_write(&format!("diagram{i}")).unwrap();
                out.write_all(&[u8::try_from(i).unwrap()]).unwrap();
                out.finish().unwrap();
            });
        }
    });

    let count = std::fs::read_dir(t.namespace_root().join("Doc")).unwrap().count();
    assert_eq!(count, 16);
}

#[test]
fn test_concurrent_same_artifact_last_writer_wins() {
    let t = setup_test_store("Doc");

    std::thread::scope(|s| {
        for _ in 0..8 {
            let store = &t.store;
            s.spawn(move || {
                let mut out = store.open_for_write("shared").unwrap();
                out.write_all(b"same-bytes").unwrap();
                out.finish().unwrap();
            });
        }
    });

    let path = t.store.locate("shared").unwrap();
    assert_eq!(std::fs::read(path).unwrap(), b"same-bytes");
}
