#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use dummy_workload::lib_file::{read_record, Removal, ScratchFiles};

fn leftovers(files: &ScratchFiles) -> Vec<String> {
    let stem = files.file_stem_prefix();
    std::fs::read_dir(files.dir())
        .expect("read dir")
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with(stem.as_str()))
        .collect()
}

#[test]
fn write_then_read_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut files = ScratchFiles::new(dir.path(), "t", 4242, 10);
    let rec = files.write_and_verify(7, 100).expect("write");
    assert_eq!(rec.iteration, 7);
    assert_eq!(rec.pid, 4242);
    assert_eq!(rec.random_data.len(), 100);

    let path = files.path_for(7);
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some("temp-t-4242-7.json")
    );
    let back = read_record(&path).expect("read");
    assert_eq!(back, rec);
}

#[test]
fn scratch_json_has_expected_fields() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut files = ScratchFiles::new(dir.path(), "t", 1, 10);
    files.write_and_verify(1, 3).expect("write");
    let raw = std::fs::read_to_string(files.path_for(1)).expect("read");
    let v: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(v["iteration"], 1);
    assert_eq!(v["pid"], 1);
    assert!(v["timestamp"].is_string());
    assert_eq!(v["random_data"].as_array().map(Vec::len), Some(3));
}

#[test]
fn cap_holds_after_every_write() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut files = ScratchFiles::new(dir.path(), "cap", 9, 4);
    for i in 1..=20 {
        files.write_and_verify(i, 2).expect("write");
        files.enforce_cap();
        assert!(files.len() <= 4, "len {} at {i}", files.len());
    }
    assert_eq!(leftovers(&files).len(), 4);
    let oldest = files.tracked().next().map(std::path::Path::to_path_buf);
    assert_eq!(oldest, Some(files.path_for(17)));
}

#[test]
fn prune_respects_retain() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut files = ScratchFiles::new(dir.path(), "p", 9, 10);
    for i in 1..=3 {
        files.write_and_verify(i, 1).expect("write");
    }
    assert!(files.prune_oldest(3).is_none());
    files.write_and_verify(4, 1).expect("write");
    match files.prune_oldest(3) {
        Some(Removal::Removed(p)) => assert_eq!(p, files.path_for(1)),
        other => panic!("unexpected {other:?}"),
    }
    assert!(!files.path_for(1).exists());
}

#[test]
fn remove_all_tolerates_missing_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut files = ScratchFiles::new(dir.path(), "rm", 9, 10);
    files.write_and_verify(1, 1).expect("write");
    files.write_and_verify(2, 1).expect("write");
    std::fs::remove_file(files.path_for(1)).expect("pre-remove");
    let removals = files.remove_all();
    assert_eq!(removals.len(), 2);
    assert!(matches!(removals[0], Removal::AlreadyGone(_)));
    assert!(matches!(removals[1], Removal::Removed(_)));
    assert!(files.is_empty());
    assert!(leftovers(&files).is_empty());
}

#[test]
fn sweep_only_touches_own_pattern() {
    let dir = tempfile::tempdir().expect("tempdir");
    let files = ScratchFiles::new(dir.path(), "sw", 12, 10);
    std::fs::write(dir.path().join("temp-sw-12-5.json"), "{}").expect("write own");
    std::fs::write(dir.path().join("temp-sw-123-5.json"), "{}").expect("write other pid");
    std::fs::write(dir.path().join("notes.txt"), "keep").expect("write unrelated");
    let removed = files.sweep_dir().expect("sweep");
    assert_eq!(removed.len(), 1);
    assert!(!dir.path().join("temp-sw-12-5.json").exists());
    assert!(dir.path().join("temp-sw-123-5.json").exists());
    assert!(dir.path().join("notes.txt").exists());
}

#[test]
fn write_into_missing_dir_fails_but_is_tracked() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut files = ScratchFiles::new(dir.path().join("missing"), "m", 1, 10);
    assert!(files.write_and_verify(1, 1).is_err());
    assert_eq!(files.len(), 1);
}
