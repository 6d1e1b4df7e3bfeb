#![cfg(target_family = "unix")]

use depotcheck_core::manifest::ManifestRecord;
use depotcheck_core::path_safety::PathPolicy;
use depotcheck_core::progress::Progress;
use depotcheck_core::verify::{verify_record, VerificationOutcome};
use sha1::{Digest, Sha1};
use std::fs;
use std::os::unix::fs::symlink;

fn record(name: &str, data: &[u8]) -> ManifestRecord {
    let mut checksum = [0u8; 20];
    checksum.copy_from_slice(&Sha1::digest(data));
    ManifestRecord { size: data.len() as u64, checksum, flags: 0, rel_path: name.to_string() }
}

fn unreadable_reason(out: VerificationOutcome) -> String {
    match out {
        VerificationOutcome::Unreadable { reason } => reason,
        other => panic!("expected unreadable, got {:?}", other),
    }
}

#[test]
fn contained_symlink_followed_by_default_rejected_on_request() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("root");
    fs::create_dir_all(root.join("target")).unwrap();
    fs::write(root.join("target/file.txt"), b"hello\n").unwrap();
    symlink(root.join("target"), root.join("safe")).unwrap();

    let rec = record("safe/file.txt", b"hello\n");
    let progress = Progress::new(false);
    let out = verify_record(&root, &rec, PathPolicy::default(), &progress);
    assert_eq!(out, VerificationOutcome::Ok);

    let strict = PathPolicy { follow_symlinks: false };
    let reason = unreadable_reason(verify_record(&root, &rec, strict, &progress));
    assert!(reason.contains("symlink"), "unexpected reason: {}", reason);
}

#[test]
fn symlink_escaping_root_is_unreadable() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("root");
    fs::create_dir_all(&root).unwrap();
    fs::write(tmp.path().join("outside.txt"), b"outside\n").unwrap();
    symlink(tmp.path(), root.join("evil")).unwrap();

    let rec = record("evil/outside.txt", b"outside\n");
    let reason =
        unreadable_reason(verify_record(&root, &rec, PathPolicy::default(), &Progress::new(false)));
    assert!(reason.contains("escapes root"), "unexpected reason: {}", reason);
}
