use crate::localize::FluentLoc;
use crate::manifest::{self, ManifestRecord};
use crate::path_safety::PathPolicy;
use crate::progress::Progress;
use crate::report::{missing_list_path, LogLine, Reporter, RunSummary};
use crate::verify::Verifier;
use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::PathBuf;

/// Records handed to the pool per round. Output for a batch is emitted
/// before the next batch starts.
const BATCH_PER_JOB: usize = 16;

#[derive(Clone, Debug)]
pub struct RunConfig {
    pub manifest: PathBuf,
    pub root: PathBuf,
    pub jobs: usize,
    pub policy: PathPolicy,
    pub progress: bool,
}

impl RunConfig {
    pub fn new(manifest: PathBuf, root: PathBuf) -> Self {
        Self { manifest, root, jobs: 1, policy: PathPolicy::default(), progress: false }
    }
}

/// Verify every file record of the manifest under the install root.
///
/// The whole manifest is parsed before anything is checked, so a missing
/// header or malformed line fails the run without creating the missing list.
/// Failure lines and the final summary go to `emit` in manifest order.
pub fn run(cfg: &RunConfig, mut emit: impl FnMut(&LogLine)) -> Result<RunSummary> {
    let records = manifest::load(&cfg.manifest)
        .with_context(|| format!("load manifest {}", cfg.manifest.display()))?;

    let files: Vec<&ManifestRecord> = records
        .iter()
        .filter(|r| {
            if r.is_directory() {
                tracing::trace!(path = %r.rel_path, "skipping directory");
            }
            !r.is_directory()
        })
        .collect();
    let jobs = cfg.jobs.max(1);
    tracing::info!(
        records = records.len(),
        files = files.len(),
        jobs,
        root = %cfg.root.display(),
        "manifest loaded"
    );

    let missing_path = missing_list_path(&cfg.manifest);
    let loc = FluentLoc::builtin("en-GB")?;
    let mut reporter = Reporter::create(&missing_path, Box::new(loc))
        .with_context(|| format!("create {}", missing_path.display()))?;

    let progress = Progress::new(cfg.progress);
    progress.set_stage("Verifying");
    let declared_bytes = files.iter().fold(0u64, |acc, r| acc.saturating_add(r.size));
    progress.set_totals(files.len() as u64, declared_bytes);
    let verifier = Verifier::new(&cfg.root, cfg.policy, jobs, progress)?;
    verifier.progress().start();

    let result = verify_all(&verifier, &files, jobs * BATCH_PER_JOB, &mut reporter, &mut emit)
        .with_context(|| format!("write {}", missing_path.display()));
    verifier.progress().stop();
    result?;

    let (summary, line) =
        reporter.finish().with_context(|| format!("write {}", missing_path.display()))?;
    tracing::info!(?summary, "verification finished");
    emit(&line);
    Ok(summary)
}

fn verify_all<W: Write>(
    verifier: &Verifier,
    files: &[&ManifestRecord],
    batch_size: usize,
    reporter: &mut Reporter<W>,
    emit: &mut impl FnMut(&LogLine),
) -> io::Result<()> {
    for batch in files.chunks(batch_size) {
        let outcomes = verifier.verify_batch(batch);
        for (rec, outcome) in batch.iter().zip(&outcomes) {
            if let Some(line) = reporter.record(rec, outcome)? {
                emit(&line);
            }
        }
    }
    Ok(())
}
