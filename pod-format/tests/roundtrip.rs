use std::io::Write;

use pod_format::{EntryPath, Error, Pod};

fn name(s: &str) -> EntryPath {
    EntryPath::new(s).unwrap()
}

#[test]
fn save_and_reopen_preserves_order_and_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("order.pod");

    let mut pod = Pod::new();
    pod.add_bytes(name("zeta/last.rbc"), b"zzz".to_vec()).unwrap();
    pod.add_bytes(name("alpha/first.rbc"), b"aaa".to_vec()).unwrap();
    pod.add_bytes(name("meta/manifest.conf"), b"[pod]\n".to_vec())
        .unwrap();
    pod.save(&archive).unwrap();

    let reopened = Pod::open(&archive).unwrap();
    let names: Vec<_> = reopened
        .entries()
        .iter()
        .map(|e| e.name().as_str().to_string())
        .collect();
    assert_eq!(names, ["zeta/last.rbc", "alpha/first.rbc", "meta/manifest.conf"]);

    let entry = reopened.entry("alpha/first.rbc").unwrap();
    assert_eq!(reopened.read_bytes(entry).unwrap(), b"aaa");
    let entry = reopened.entry("meta/manifest.conf").unwrap();
    assert_eq!(reopened.read_bytes(entry).unwrap(), b"[pod]\n");
}

#[test]
fn file_payloads_are_read_at_save_time() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("input.rbc");
    std::fs::write(&source, b"compiled bytes").unwrap();
    let archive = dir.path().join("files.pod");

    let mut pod = Pod::new();
    pod.add_file(name("lib/input.rbc"), &source).unwrap();
    pod.save(&archive).unwrap();

    // Mutating the source afterwards must not affect the saved archive.
    std::fs::write(&source, b"changed").unwrap();

    let reopened = Pod::open(&archive).unwrap();
    let entry = reopened.entry("lib/input.rbc").unwrap();
    assert_eq!(reopened.read_bytes(entry).unwrap(), b"compiled bytes");
}

#[test]
fn stored_payloads_survive_resave_into_another_archive() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.pod");
    let second = dir.path().join("second.pod");

    let mut pod = Pod::new();
    pod.add_bytes(name("bootstrap/init.rbc"), b"init".to_vec())
        .unwrap();
    pod.add_bytes(name("lib/core.rbc"), b"core".to_vec()).unwrap();
    pod.save(&first).unwrap();

    let source = Pod::open(&first).unwrap();
    let mut merged = Pod::new();
    merged.add_bytes(name("lib/extra.rbc"), b"extra".to_vec()).unwrap();
    assert_eq!(merged.merge_from(&source), 2);
    drop(source);

    merged.save(&second).unwrap();

    let reopened = Pod::open(&second).unwrap();
    assert_eq!(reopened.len(), 3);
    let entry = reopened.entry("bootstrap/init.rbc").unwrap();
    assert_eq!(reopened.read_bytes(entry).unwrap(), b"init");
}

#[test]
fn save_replaces_existing_archive_atomically() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("replace.pod");

    let mut old = Pod::new();
    old.add_bytes(name("old"), b"old".to_vec()).unwrap();
    old.save(&archive).unwrap();

    let mut new = Pod::new();
    new.add_bytes(name("new"), b"new".to_vec()).unwrap();
    new.save(&archive).unwrap();

    let reopened = Pod::open(&archive).unwrap();
    assert_eq!(reopened.len(), 1);
    assert!(reopened.entry("old").is_none());
    assert!(reopened.entry("new").is_some());
}

#[test]
fn extract_all_recreates_the_tree() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");

    let mut pod = Pod::new();
    pod.add_bytes(name("a/b/c.rbc"), b"c".to_vec()).unwrap();
    pod.add_bytes(name("top.conf"), b"t".to_vec()).unwrap();
    pod.extract_all(&out).unwrap();

    assert_eq!(std::fs::read(out.join("a/b/c.rbc")).unwrap(), b"c");
    assert_eq!(std::fs::read(out.join("top.conf")).unwrap(), b"t");
}

#[test]
fn extract_prefix_strips_the_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("runtime");

    let mut pod = Pod::new();
    pod.add_bytes(name("bootstrap/init.rbc"), b"i".to_vec()).unwrap();
    pod.add_bytes(name("bootstrap/deep/more.rbc"), b"m".to_vec())
        .unwrap();
    pod.add_bytes(name("bootstrapper"), b"x".to_vec()).unwrap();
    pod.add_bytes(name("lib/other.rbc"), b"o".to_vec()).unwrap();

    let count = pod.extract_prefix("bootstrap", &out).unwrap();
    assert_eq!(count, 2);
    assert_eq!(std::fs::read(out.join("init.rbc")).unwrap(), b"i");
    assert_eq!(std::fs::read(out.join("deep/more.rbc")).unwrap(), b"m");
    assert!(!out.join("bootstrapper").exists());
    assert!(!out.join("other.rbc").exists());
}

#[test]
fn open_rejects_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("bogus.pod");
    std::fs::write(&bogus, b"definitely not a pod archive").unwrap();

    let err = Pod::open(&bogus).unwrap_err();
    assert!(matches!(err, Error::Corrupt { .. }), "got: {:?}", err);
}

#[test]
fn open_rejects_truncated_archive() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("trunc.pod");

    let mut pod = Pod::new();
    pod.add_bytes(name("a"), vec![0u8; 256]).unwrap();
    pod.save(&archive).unwrap();

    let bytes = std::fs::read(&archive).unwrap();
    let mut file = std::fs::File::create(&archive).unwrap();
    file.write_all(&bytes[..bytes.len() / 2]).unwrap();
    drop(file);

    let err = Pod::open(&archive).unwrap_err();
    assert!(matches!(err, Error::Corrupt { .. }), "got: {:?}", err);
}

#[test]
fn open_rejects_directory_with_overflowing_length() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("overflow.pod");

    let mut pod = Pod::new();
    pod.add_bytes(name("a"), b"payload".to_vec()).unwrap();
    pod.save(&archive).unwrap();

    // the trailing 8 bytes of the file are the record's length field;
    // a length of u64::MAX must not wrap past the bounds check
    let mut bytes = std::fs::read(&archive).unwrap();
    let len = bytes.len();
    bytes[len - 8..].copy_from_slice(&u64::MAX.to_le_bytes());
    std::fs::write(&archive, &bytes).unwrap();

    let err = Pod::open(&archive).unwrap_err();
    assert!(matches!(err, Error::Corrupt { .. }), "got: {:?}", err);
}

#[test]
fn open_missing_file_is_a_read_error() {
    let err = Pod::open("/no/such/archive.pod").unwrap_err();
    assert!(matches!(err, Error::Read { .. }), "got: {:?}", err);
}
