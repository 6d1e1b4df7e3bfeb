use anyhow::{bail, Context, Result};
use std::path::{Component, Path, PathBuf};

#[derive(Clone, Copy, Debug)]
pub struct PathPolicy {
    pub follow_symlinks: bool,
}

impl Default for PathPolicy {
    fn default() -> Self {
        Self { follow_symlinks: true }
    }
}

fn is_drive(part: &str) -> bool {
    let b = part.as_bytes();
    b.len() == 2 && b[0].is_ascii_alphabetic() && b[1] == b':'
}

/// Turn a manifest name into a relative path. Both `/` and `\` separate
/// components. Rejects absolute names, drive prefixes and `..`.
pub fn normalize_rel(rel: &str) -> Result<PathBuf> {
    if rel.starts_with('/') || rel.starts_with('\\') {
        bail!("absolute paths are not allowed: {:?}", rel);
    }
    let mut out = PathBuf::new();
    for (i, part) in rel.split(['/', '\\']).enumerate() {
        match part {
            "" | "." => {}
            ".." => bail!("parent traversal not allowed: {:?}", rel),
            p if i == 0 && is_drive(p) => bail!("absolute paths are not allowed: {:?}", rel),
            p => out.push(p),
        }
    }
    if out.as_os_str().is_empty() {
        bail!("empty path: {:?}", rel);
    }
    // Catches platform prefixes that survive the split (e.g. `\\?\` on Windows).
    if !out.components().all(|c| matches!(c, Component::Normal(_))) {
        bail!("path is not relative: {:?}", rel);
    }
    Ok(out)
}

/// Resolve manifest name `rel` under `root`. If `follow_symlinks` the
/// canonicalized path must stay under the canonicalized root; otherwise any
/// symlink along the path is an error.
pub fn validate_path(root: &Path, rel: &str, policy: PathPolicy) -> Result<PathBuf> {
    let rel = normalize_rel(rel)?;
    let candidate = root.join(&rel);
    if !policy.follow_symlinks {
        let mut cur = root.to_path_buf();
        for comp in rel.components() {
            cur.push(comp);
            if let Ok(m) = std::fs::symlink_metadata(&cur) {
                if m.file_type().is_symlink() {
                    bail!("symlink in path (not following): {:?}", cur);
                }
            }
        }
        Ok(candidate)
    } else {
        let root_can = std::fs::canonicalize(root)
            .with_context(|| format!("resolve install root {}", root.display()))?;
        let cand_can = std::fs::canonicalize(&candidate)
            .with_context(|| format!("resolve {}", candidate.display()))?;
        if !cand_can.starts_with(&root_can) {
            bail!("path escapes root: {:?}", rel);
        }
        Ok(cand_can)
    }
}
