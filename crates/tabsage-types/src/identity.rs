use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};

/// Number of hex characters kept from the full SHA-256 digest.
const DIGEST_LEN: usize = 12;

/// Identity of a tabular data source: the resolved path of the file plus an
/// optional sub-selector (sheet name for spreadsheets, table name for
/// relational files).
///
/// Two identities with the same (path, selector) pair always produce the
/// same digest, which is what keys the cache directory for the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceIdentity {
    path: PathBuf,
    selector: Option<String>,
}

impl SourceIdentity {
    pub fn new(path: impl AsRef<Path>, selector: Option<&str>) -> Self {
        Self {
            path: normalize_path(path.as_ref()),
            selector: selector.map(|s| s.to_string()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    /// File stem of the source, used in artifact file names.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "source".to_string())
    }

    /// Short deterministic cache key for this identity.
    ///
    /// The canonicalized path and the selector are hashed together with a
    /// separator so that `("a", Some("b"))` and `("ab", None)` cannot
    /// collide on concatenation.
    pub fn digest(&self) -> IdentityDigest {
        let mut hasher = Sha256::new();
        hasher.update(self.path.to_string_lossy().as_bytes());
        hasher.update(b"||");
        hasher.update(self.selector.as_deref().unwrap_or("").as_bytes());
        let hex = format!("{:x}", hasher.finalize());
        IdentityDigest(hex[..DIGEST_LEN].to_string())
    }
}

/// Truncated hex digest derived from a [`SourceIdentity`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityDigest(String);

impl IdentityDigest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a path for hashing (resolve to absolute, canonicalize if possible).
///
/// Canonicalization resolves symlinks so that different spellings of the
/// same file map to the same cache entry, e.g. `/var/...` and
/// `/private/var/...` on macOS.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_stable() {
        let a = SourceIdentity::new("/data/report.csv", None);
        let b = SourceIdentity::new("/data/report.csv", None);
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().as_str().len(), DIGEST_LEN);
    }

    #[test]
    fn test_selector_changes_digest() {
        let plain = SourceIdentity::new("/data/report.xlsx", None);
        let sheet1 = SourceIdentity::new("/data/report.xlsx", Some("Sheet1"));
        let sheet2 = SourceIdentity::new("/data/report.xlsx", Some("Sheet2"));
        assert_ne!(plain.digest(), sheet1.digest());
        assert_ne!(sheet1.digest(), sheet2.digest());
    }

    #[test]
    fn test_path_changes_digest() {
        let a = SourceIdentity::new("/data/a.csv", Some("t"));
        let b = SourceIdentity::new("/data/b.csv", Some("t"));
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn test_digest_is_hex() {
        let id = SourceIdentity::new("/data/report.csv", Some("metrics"));
        assert!(id.digest().as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
