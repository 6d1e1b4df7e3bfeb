use crate::manifest::{ManifestRecord, SHA1_LEN};
use crate::path_safety::{validate_path, PathPolicy};
use crate::progress::Progress;
use anyhow::{Context, Result};
use rayon::prelude::*;
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

const BUF_SIZE: usize = 64 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationOutcome {
    Ok,
    SizeMismatch { expected: u64, actual: u64 },
    ChecksumMismatch,
    Unreadable { reason: String },
}

impl VerificationOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, VerificationOutcome::Ok)
    }
}

/// Stream `path` through SHA-1. The handle is dropped on every return.
pub fn sha1_file(path: &Path, progress: &Progress) -> io::Result<[u8; SHA1_LEN]> {
    let mut f = File::open(path)?;
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = match f.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
        progress.add_bytes(n as u64);
    }
    let mut out = [0u8; SHA1_LEN];
    out.copy_from_slice(&hasher.finalize());
    Ok(out)
}

/// Check one file record under `root`: path, then size, then content hash.
/// Directory records must be filtered out by the caller.
pub fn verify_record(
    root: &Path,
    rec: &ManifestRecord,
    policy: PathPolicy,
    progress: &Progress,
) -> VerificationOutcome {
    let path = match validate_path(root, &rec.rel_path, policy) {
        Ok(p) => p,
        Err(e) => return VerificationOutcome::Unreadable { reason: format!("{:#}", e) },
    };
    let meta = match std::fs::metadata(&path) {
        Ok(m) => m,
        Err(e) => return VerificationOutcome::Unreadable { reason: e.to_string() },
    };
    if meta.is_dir() {
        return VerificationOutcome::Unreadable {
            reason: format!("{} is a directory", path.display()),
        };
    }
    if meta.len() != rec.size {
        return VerificationOutcome::SizeMismatch { expected: rec.size, actual: meta.len() };
    }
    match sha1_file(&path, progress) {
        Ok(digest) if digest == rec.checksum => VerificationOutcome::Ok,
        Ok(_) => VerificationOutcome::ChecksumMismatch,
        Err(e) => VerificationOutcome::Unreadable { reason: e.to_string() },
    }
}

/// Verifies batches of records on a pool of `jobs` threads. With one job
/// everything stays on the calling thread.
pub struct Verifier {
    root: PathBuf,
    policy: PathPolicy,
    progress: Progress,
    pool: Option<rayon::ThreadPool>,
}

impl Verifier {
    pub fn new(root: &Path, policy: PathPolicy, jobs: usize, progress: Progress) -> Result<Self> {
        let pool = if jobs > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(jobs)
                    .thread_name(|i| format!("verify-{}", i))
                    .build()
                    .context("build verification thread pool")?,
            )
        } else {
            None
        };
        Ok(Self { root: root.to_path_buf(), policy, progress, pool })
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    fn check(&self, rec: &ManifestRecord) -> VerificationOutcome {
        let outcome = verify_record(&self.root, rec, self.policy, &self.progress);
        if matches!(
            outcome,
            VerificationOutcome::SizeMismatch { .. } | VerificationOutcome::Unreadable { .. }
        ) {
            self.progress.skip_bytes(rec.size);
        }
        self.progress.inc_file();
        tracing::debug!(path = %rec.rel_path, ?outcome, "verified");
        outcome
    }

    /// Outcomes come back in input order whatever the finishing order was.
    pub fn verify_batch(&self, records: &[&ManifestRecord]) -> Vec<VerificationOutcome> {
        match &self.pool {
            None => records.iter().map(|r| self.check(r)).collect(),
            Some(pool) => pool.install(|| records.par_iter().map(|r| self.check(r)).collect()),
        }
    }
}
