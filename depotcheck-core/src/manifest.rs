//! Depot manifest text format.
//!
//! A manifest starts with free-form header lines. The file list begins right
//! after [`HEADER`]; every following non-blank line is one record:
//!
//! ```text
//!           Size Chunks File SHA                                 Flags Name
//!         123456      1 0123456789abcdef0123456789abcdef01234567     0 bin/game.exe
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Column header row that precedes the file list.
pub const HEADER: &str = "          Size Chunks File SHA                                 Flags Name";

/// Flags value marking a directory entry.
pub const FLAG_DIRECTORY: i32 = 64;

/// Length of a SHA-1 digest in bytes.
pub const SHA1_LEN: usize = 20;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed record: {0}")]
    MalformedRecord(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("read manifest {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("reached end of manifest without finding the file list header")]
    HeaderNotFound,

    #[error("manifest line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: ParseError,
    },
}

/// One file or directory entry of the manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestRecord {
    pub size: u64,
    pub checksum: [u8; SHA1_LEN],
    pub flags: i32,
    pub rel_path: String,
}

impl ManifestRecord {
    pub fn is_directory(&self) -> bool {
        self.flags == FLAG_DIRECTORY
    }

    pub fn checksum_hex(&self) -> String {
        hex::encode(self.checksum)
    }

    /// Normalized single-space layout. The chunk column is not kept, so it is
    /// written as 0.
    pub fn to_line(&self) -> String {
        format!("{} 0 {} {} {}", self.size, self.checksum_hex(), self.flags, self.rel_path)
    }
}

/// Parse one non-blank record line.
///
/// Whitespace runs anywhere in the line collapse to one space before the
/// split, so the name keeps single inner spaces but not repeated ones.
pub fn parse_line(line: &str) -> Result<ManifestRecord, ParseError> {
    let normalized = line.split_whitespace().collect::<Vec<_>>().join(" ");
    let fields: Vec<&str> = normalized.splitn(5, ' ').collect();
    if fields.len() != 5 {
        return Err(ParseError::MalformedRecord(format!(
            "expected 5 fields, found {}",
            fields.len()
        )));
    }

    let size: u64 = fields[0]
        .parse()
        .map_err(|_| ParseError::MalformedRecord(format!("bad size {:?}", fields[0])))?;

    let mut checksum = [0u8; SHA1_LEN];
    hex::decode_to_slice(fields[2], &mut checksum)
        .map_err(|e| ParseError::MalformedRecord(format!("bad SHA-1 {:?}: {}", fields[2], e)))?;

    let flags: i32 = fields[3]
        .parse()
        .map_err(|_| ParseError::MalformedRecord(format!("bad flags {:?}", fields[3])))?;

    Ok(ManifestRecord { size, checksum, flags, rel_path: fields[4].to_string() })
}

/// Lazy reader over the record lines of a manifest.
///
/// Construction consumes the header section; iteration yields
/// `(line_number, line)` for each non-blank line after it. Line numbers are
/// 1-based positions in the whole file.
pub struct ManifestReader<R> {
    lines: io::Lines<R>,
    line_no: usize,
    path: PathBuf,
}

impl ManifestReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, ManifestError> {
        let f = File::open(path)
            .map_err(|source| ManifestError::Io { path: path.to_path_buf(), source })?;
        Self::from_reader(BufReader::new(f), path)
    }
}

impl<R: BufRead> ManifestReader<R> {
    /// `path` is only used in error messages.
    pub fn from_reader(reader: R, path: &Path) -> Result<Self, ManifestError> {
        let mut rd = ManifestReader { lines: reader.lines(), line_no: 0, path: path.to_path_buf() };
        loop {
            match rd.next_raw()? {
                None => return Err(ManifestError::HeaderNotFound),
                Some(line) if line == HEADER => break,
                Some(_) => {}
            }
        }
        tracing::debug!(path = %rd.path.display(), line = rd.line_no, "found file list header");
        Ok(rd)
    }

    fn next_raw(&mut self) -> Result<Option<String>, ManifestError> {
        match self.lines.next() {
            None => Ok(None),
            Some(Err(source)) => Err(ManifestError::Io { path: self.path.clone(), source }),
            Some(Ok(mut line)) => {
                self.line_no += 1;
                if line.ends_with('\r') {
                    line.pop();
                }
                Ok(Some(line))
            }
        }
    }

    /// Parse every remaining line. Stops at the first malformed record.
    pub fn records(self) -> Result<Vec<ManifestRecord>, ManifestError> {
        let mut out = Vec::new();
        for item in self {
            let (line, text) = item?;
            let rec = parse_line(&text).map_err(|source| ManifestError::Parse { line, source })?;
            out.push(rec);
        }
        Ok(out)
    }
}

impl<R: BufRead> Iterator for ManifestReader<R> {
    type Item = Result<(usize, String), ManifestError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.next_raw() {
                Err(e) => return Some(Err(e)),
                Ok(None) => return None,
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => return Some(Ok((self.line_no, line))),
            }
        }
    }
}

/// Open `path`, skip its header and parse all records, directories included.
pub fn load(path: &Path) -> Result<Vec<ManifestRecord>, ManifestError> {
    ManifestReader::open(path)?.records()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SHA: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

    fn reader(text: &str) -> Result<ManifestReader<Cursor<Vec<u8>>>, ManifestError> {
        ManifestReader::from_reader(Cursor::new(text.as_bytes().to_vec()), Path::new("test"))
    }

    #[test]
    fn parses_padded_columns() {
        let line = format!("      1024      1 {}     0 bin/game.exe", SHA);
        let rec = parse_line(&line).unwrap();
        assert_eq!(rec.size, 1024);
        assert_eq!(rec.checksum_hex(), SHA);
        assert_eq!(rec.flags, 0);
        assert_eq!(rec.rel_path, "bin/game.exe");
        assert!(!rec.is_directory());
    }

    #[test]
    fn name_keeps_single_inner_spaces() {
        let line = format!("5 1 {} 0 Program Files\\My   Game\\a b.txt", SHA);
        let rec = parse_line(&line).unwrap();
        assert_eq!(rec.rel_path, "Program Files\\My Game\\a b.txt");
    }

    #[test]
    fn directory_flag() {
        let rec = parse_line(&format!("0 0 {} 64 data", SHA)).unwrap();
        assert!(rec.is_directory());
        let rec = parse_line(&format!("0 0 {} 96 data", SHA)).unwrap();
        assert!(!rec.is_directory());
    }

    #[test]
    fn negative_flags_are_a_regular_file() {
        let rec = parse_line(&format!("3 1 {} -1 a.txt", SHA)).unwrap();
        assert_eq!(rec.flags, -1);
        assert!(!rec.is_directory());
        assert_eq!(parse_line(&rec.to_line()).unwrap(), rec);
    }

    #[test]
    fn rejects_malformed_lines() {
        let cases = [
            format!("1 1 {} 0", SHA),
            format!("x 1 {} 0 a", SHA),
            format!("1 1 {} y a", SHA),
            format!("-1 1 {} 0 a", SHA),
            "1 1 abc 0 a".to_string(),
            "1 1 zz39a3ee5e6b4b0d3255bfef95601890afd80709 0 a".to_string(),
            format!("1 1 {}00 0 a", SHA),
        ];
        for c in &cases {
            assert!(
                matches!(parse_line(c), Err(ParseError::MalformedRecord(_))),
                "accepted {:?}",
                c
            );
        }
    }

    #[test]
    fn header_skipped_and_blank_lines_ignored() {
        let text = format!(
            "Content Manifest for Depot 1\r\n\r\n{}\r\n\r\n  1 1 {} 0 a.txt\r\n   \n2 1 {} 64 dir\n",
            HEADER, SHA, SHA
        );
        let lines: Vec<_> = reader(&text).unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].0, 5);
        assert_eq!(lines[1].0, 7);

        let recs = reader(&text).unwrap().records().unwrap();
        assert_eq!(recs[0].rel_path, "a.txt");
        assert!(recs[1].is_directory());
    }

    #[test]
    fn missing_header_is_fatal() {
        let text = format!("Manifest\n1 1 {} 0 a.txt\n", SHA);
        assert!(matches!(reader(&text), Err(ManifestError::HeaderNotFound)));
        assert!(matches!(reader(""), Err(ManifestError::HeaderNotFound)));
    }

    #[test]
    fn header_must_match_exactly() {
        let text = format!("{}\n1 1 {} 0 a.txt\n", HEADER.trim(), SHA);
        assert!(matches!(reader(&text), Err(ManifestError::HeaderNotFound)));
    }

    #[test]
    fn parse_error_reports_line_number() {
        let text = format!("{}\n1 1 {} 0 a.txt\n\n1 1 nothex 0 b.txt\n", HEADER, SHA);
        match reader(&text).unwrap().records() {
            Err(ManifestError::Parse { line, .. }) => assert_eq!(line, 4),
            other => panic!("unexpected {:?}", other.map(|v| v.len())),
        }
    }
}
