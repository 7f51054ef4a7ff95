use problem_harness::gate::UploadGate;
use problem_harness::snapshot::{Bump, SnapshotError, SnapshotManager, CHECKSUM_FILE, MANIFEST_FILE};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_source(dir: &Path, with_contests: bool) {
    fs::create_dir_all(dir).unwrap();
    let problems = json!([
        {"problem_id": "a", "slug": "two-sum", "topics": ["array"]},
        {"problem_id": "b", "slug": "three-sum", "topics": ["array", "two-pointers"]}
    ]);
    let topics = json!([{"topic_id": "t1", "name": "array"}]);
    fs::write(dir.join("problems.json"), serde_json::to_string_pretty(&problems).unwrap()).unwrap();
    fs::write(dir.join("topics.json"), serde_json::to_string_pretty(&topics).unwrap()).unwrap();
    if with_contests {
        fs::write(dir.join("contests.json"), "[]").unwrap();
    }
}

fn setup() -> (TempDir, PathBuf, SnapshotManager) {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("output");
    write_source(&source, true);
    let manager = SnapshotManager::new(tmp.path().join("validated"));
    (tmp, source, manager)
}

#[test]
fn test_create_then_verify_is_valid() {
    let (_tmp, source, manager) = setup();
    let manifest = manager
        .create("v1.0.0", &source, "v1.0.0", Some("first"), false)
        .unwrap();

    assert_eq!(manifest.version, "v1.0.0");
    assert_eq!(manifest.counts.problems, 2);
    assert_eq!(manifest.counts.topics, 1);
    assert_eq!(manifest.counts.contests, Some(0));
    assert_eq!(manifest.notes.as_deref(), Some("first"));
    assert!(manifest.created_at.ends_with('Z'));
    for key in ["problems.json", "problems.json_file", "topics.json", "topics.json_file"] {
        assert!(manifest.checksums[key].starts_with("sha256:"), "{}", key);
    }

    let dir = manager.path_for("v1.0.0").unwrap();
    assert_eq!(
        fs::read(dir.join("problems.json")).unwrap(),
        fs::read(source.join("problems.json")).unwrap(),
        "snapshot files are byte copies"
    );
    assert!(dir.join(MANIFEST_FILE).is_file());

    let checksum_txt = fs::read_to_string(dir.join(CHECKSUM_FILE)).unwrap();
    let names: Vec<&str> = checksum_txt
        .lines()
        .filter_map(|line| line.split("  ").nth(1))
        .collect();
    assert_eq!(names, vec!["contests.json", "manifest.json", "problems.json", "topics.json"]);

    let verification = manager.verify("v1.0.0").unwrap();
    assert!(verification.valid, "{:?}", verification.errors);
    assert!(verification.mismatches.is_empty());
    assert!(verification.missing.is_empty());
}

#[test]
fn test_one_byte_change_is_one_mismatch() {
    let (_tmp, source, manager) = setup();
    manager.create("v1.0.0", &source, "v1.0.0", None, false).unwrap();

    let topics = manager.path_for("v1.0.0").unwrap().join("topics.json");
    let mut bytes = fs::read(&topics).unwrap();
    let last = bytes.len() - 1;
    bytes[last] = b' ';
    fs::write(&topics, bytes).unwrap();

    let verification = manager.verify("v1.0.0").unwrap();
    assert!(!verification.valid);
    assert_eq!(verification.mismatches.len(), 1);
    assert_eq!(verification.mismatches[0].file, "topics.json");
}

#[test]
fn test_deleted_file_is_reported_missing() {
    let (_tmp, source, manager) = setup();
    manager.create("v1.0.0", &source, "v1.0.0", None, false).unwrap();
    fs::remove_file(manager.path_for("v1.0.0").unwrap().join("problems.json")).unwrap();

    let verification = manager.verify("v1.0.0").unwrap();
    assert!(!verification.valid);
    assert_eq!(verification.missing, vec!["problems.json"]);
}

#[test]
fn test_verify_unknown_version_is_reported_not_raised() {
    let (_tmp, _source, manager) = setup();
    let verification = manager.verify("v9.9.9").unwrap();
    assert!(!verification.valid);
    assert_eq!(verification.errors, vec!["Version v9.9.9 does not exist"]);
}

#[test]
fn test_existing_version_requires_force() {
    let (_tmp, source, manager) = setup();
    manager.create("v1.0.0", &source, "v1.0.0", None, false).unwrap();

    let err = manager
        .create("v1.0.0", &source, "v1.0.0", None, false)
        .unwrap_err();
    assert!(matches!(err, SnapshotError::AlreadyExists(ref v) if v == "v1.0.0"));

    // A forced create replaces the old snapshot instead of merging into it.
    let stale = manager.path_for("v1.0.0").unwrap().join("stale.json");
    fs::write(&stale, "[]").unwrap();
    fs::remove_file(source.join("contests.json")).unwrap();
    let manifest = manager
        .create("v1.0.0", &source, "v1.0.0", None, true)
        .unwrap();
    assert_eq!(manifest.counts.contests, None);
    assert!(!stale.exists());
    assert!(!manager.path_for("v1.0.0").unwrap().join("contests.json").exists());
    assert!(manager.verify("v1.0.0").unwrap().valid);
}

#[test]
fn test_missing_source_leaves_no_directory() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("output");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("problems.json"), "[]").unwrap();
    let manager = SnapshotManager::new(tmp.path().join("validated"));

    let err = manager
        .create("v1.0.0", &source, "v1.0.0", None, false)
        .unwrap_err();
    assert!(matches!(err, SnapshotError::MissingSource(ref p) if p.ends_with("topics.json")));
    assert!(!manager.path_for("v1.0.0").unwrap().exists());
}

#[test]
fn test_malformed_source_is_rejected() {
    let (_tmp, source, manager) = setup();
    fs::write(source.join("problems.json"), "{\"not\": \"an array\"}").unwrap();
    let err = manager
        .create("v1.0.0", &source, "v1.0.0", None, false)
        .unwrap_err();
    assert!(matches!(err, SnapshotError::MalformedSource { .. }));
    assert!(!manager.path_for("v1.0.0").unwrap().exists());
}

#[test]
fn test_invalid_version_rejected() {
    let (_tmp, source, manager) = setup();
    for bad in ["1.0.0", "v1.0", "latest"] {
        let err = manager.create(bad, &source, "v1.0.0", None, false).unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidVersion(_)), "{}", bad);
    }
}

#[test]
fn test_version_paths_stay_under_root() {
    let (_tmp, source, manager) = setup();
    manager.create("v1.0.0", &source, "v1.0.0", None, false).unwrap();

    for bad in ["../output", "v1.0.0/..", "/tmp", ""] {
        assert!(
            matches!(manager.path_for(bad), Err(SnapshotError::InvalidVersion(_))),
            "{}",
            bad
        );
        assert!(
            matches!(manager.verify(bad), Err(SnapshotError::InvalidVersion(_))),
            "{}",
            bad
        );
        assert!(manager.load_manifest(bad).is_err(), "{}", bad);
        assert!(UploadGate::new(&manager, Some(bad)).is_err(), "{}", bad);
    }
    assert_eq!(manager.path_for("v1.0.0").unwrap(), manager.root().join("v1.0.0"));
    assert!(UploadGate::new(&manager, Some("v1.0.0")).is_ok());
}

#[test]
fn test_next_version_and_listing() {
    let (_tmp, source, manager) = setup();
    assert_eq!(manager.next_version(Bump::Patch).unwrap().to_string(), "v1.0.0");
    assert!(manager.latest().unwrap().is_none());

    for version in ["v1.2.3", "v1.10.0", "v1.9.0"] {
        manager.create(version, &source, "v1.0.0", None, false).unwrap();
    }
    fs::create_dir_all(manager.root().join("scratch")).unwrap();

    let listed: Vec<String> = manager.list().unwrap().into_iter().map(|s| s.version).collect();
    assert_eq!(listed, vec!["v1.2.3", "v1.9.0", "v1.10.0"]);
    assert_eq!(manager.latest().unwrap().unwrap().version, "v1.10.0");

    assert_eq!(manager.next_version(Bump::Patch).unwrap().to_string(), "v1.10.1");
    assert_eq!(manager.next_version(Bump::Minor).unwrap().to_string(), "v1.11.0");
    assert_eq!(manager.next_version(Bump::Major).unwrap().to_string(), "v2.0.0");
}
