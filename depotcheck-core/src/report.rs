//! Aggregation of verification outcomes.
//!
//! The reporter never prints. It hands back [`LogLine`] values and leaves
//! rendering (colour, stream choice) to the caller.

use crate::localize::Localizer;
use crate::manifest::ManifestRecord;
use crate::verify::VerificationOutcome;
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Success,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogLine {
    pub severity: Severity,
    pub message: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total_files: u64,
    pub size_mismatch: u64,
    pub checksum_mismatch: u64,
    pub unreadable: u64,
}

impl RunSummary {
    pub fn failures(&self) -> u64 {
        self.size_mismatch + self.checksum_mismatch + self.unreadable
    }
}

/// `<manifest>-missing.txt`, next to the manifest.
pub fn missing_list_path(manifest: &Path) -> PathBuf {
    let mut s = OsString::from(manifest.as_os_str());
    s.push("-missing.txt");
    PathBuf::from(s)
}

pub struct Reporter<W: Write> {
    missing: BufWriter<W>,
    loc: Box<dyn Localizer>,
    summary: RunSummary,
}

impl Reporter<File> {
    /// Create (or truncate) the missing list at `path`.
    pub fn create(path: &Path, loc: Box<dyn Localizer>) -> io::Result<Self> {
        Ok(Self::new(File::create(path)?, loc))
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(missing: W, loc: Box<dyn Localizer>) -> Self {
        Self { missing: BufWriter::new(missing), loc, summary: RunSummary::default() }
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Account for one outcome. Failures are appended to the missing list and
    /// returned as an error line; directory records are ignored.
    pub fn record(
        &mut self,
        rec: &ManifestRecord,
        outcome: &VerificationOutcome,
    ) -> io::Result<Option<LogLine>> {
        if rec.is_directory() {
            return Ok(None);
        }
        self.summary.total_files += 1;
        let name = rec.rel_path.as_str();
        let message = match outcome {
            VerificationOutcome::Ok => return Ok(None),
            VerificationOutcome::SizeMismatch { expected, actual } => {
                self.summary.size_mismatch += 1;
                let (expected, actual) = (expected.to_string(), actual.to_string());
                self.loc.msg(
                    "size-mismatch",
                    &[("name", name), ("expected", expected.as_str()), ("actual", actual.as_str())],
                )
            }
            VerificationOutcome::ChecksumMismatch => {
                self.summary.checksum_mismatch += 1;
                self.loc.msg("checksum-mismatch", &[("name", name)])
            }
            VerificationOutcome::Unreadable { reason } => {
                self.summary.unreadable += 1;
                self.loc.msg("unreadable", &[("name", name), ("reason", reason.as_str())])
            }
        };
        writeln!(self.missing, "{}", rec.rel_path)?;
        Ok(Some(LogLine { severity: Severity::Error, message }))
    }

    /// Flush the missing list and build the summary line.
    pub fn finish(mut self) -> io::Result<(RunSummary, LogLine)> {
        self.missing.flush()?;
        let s = self.summary;
        let counts = [s.total_files, s.unreadable, s.size_mismatch, s.checksum_mismatch]
            .map(|n| n.to_string());
        let message = self.loc.msg(
            "summary",
            &[
                ("total", counts[0].as_str()),
                ("unreadable", counts[1].as_str()),
                ("size", counts[2].as_str()),
                ("bad", counts[3].as_str()),
            ],
        );
        Ok((s, LogLine { severity: Severity::Success, message }))
    }
}
