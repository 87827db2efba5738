use anyhow::{Context, Result};
use std::borrow::Cow;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::traits::{DigestStore, Fingerprint};
use super::RecordKey;

/// Filesystem-based digest store: one small text file per record.
///
/// Layout:
/// - `<context_dir>/containerfile-digest.txt` for the build definition
/// - `<state_dir>/<sanitized reference>-digest.txt` for each base image
pub struct FilesystemDigestStore {
    context_dir: PathBuf,
    state_dir: PathBuf,
}

impl FilesystemDigestStore {
    /// Create a store rooted at the given context and state directories
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(context_dir: P, state_dir: Q) -> Self {
        FilesystemDigestStore {
            context_dir: context_dir.as_ref().to_path_buf(),
            state_dir: state_dir.as_ref().to_path_buf(),
        }
    }

    /// Get the path of the record file for `key`
    pub fn record_path(&self, key: &RecordKey) -> PathBuf {
        let dir = match key {
            RecordKey::BuildDefinition => &self.context_dir,
            RecordKey::BaseImage(_) => &self.state_dir,
        };
        dir.join(key.file_name())
    }
}

impl DigestStore for FilesystemDigestStore {
    fn read_stored(&self, key: &RecordKey) -> Result<Option<Fingerprint>> {
        let path = self.record_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes =
            fs::read(&path).with_context(|| format!("Failed to read digest record {:?}", path))?;
        // A damaged record just compares unequal and is replaced by the next write
        let content = String::from_utf8_lossy(&bytes);
        if matches!(content, Cow::Owned(_)) {
            tracing::warn!("Digest record {:?} is not valid UTF-8", path);
        }
        Ok(Some(content.trim_end_matches(['\n', '\r']).to_string()))
    }

    fn write_stored(&self, key: &RecordKey, value: &str) -> Result<()> {
        let path = self.record_path(key);
        let dir = path
            .parent()
            .with_context(|| format!("Digest record {:?} has no parent directory", path))?;
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {:?}", dir))?;

        // 1. Write to a temp file next to the record
        let mut temp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {:?}", dir))?;
        writeln!(temp, "{}", value).context("Failed to write digest record")?;

        // 2. Rename over the record (atomic on POSIX systems)
        temp.persist(&path)
            .with_context(|| format!("Failed to replace digest record {:?}", path))?;

        tracing::debug!("Wrote {} record to {:?}", key, path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_record_reads_as_none() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FilesystemDigestStore::new(temp_dir.path(), temp_dir.path());

        assert_eq!(store.read_stored(&RecordKey::BuildDefinition)?, None);
        assert_eq!(store.read_stored(&RecordKey::base_image("alpine:3"))?, None);
        Ok(())
    }

    #[test]
    fn test_write_and_read_record() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FilesystemDigestStore::new(temp_dir.path(), temp_dir.path());
        let key = RecordKey::base_image("alpine:3");

        store.write_stored(&key, "Digest: sha256:abc")?;
        assert_eq!(store.read_stored(&key)?, Some("Digest: sha256:abc".to_string()));

        store.write_stored(&key, "Digest: sha256:def")?;
        assert_eq!(store.read_stored(&key)?, Some("Digest: sha256:def".to_string()));
        Ok(())
    }

    #[test]
    fn test_record_layout() -> Result<()> {
        let context = TempDir::new()?;
        let state = TempDir::new()?;
        let store = FilesystemDigestStore::new(context.path(), state.path());

        store.write_stored(&RecordKey::BuildDefinition, "abc  Containerfile")?;
        store.write_stored(&RecordKey::base_image("docker.io/library/alpine:3"), "x")?;

        let build_record = context.path().join("containerfile-digest.txt");
        assert_eq!(fs::read_to_string(build_record)?, "abc  Containerfile\n");
        assert!(state
            .path()
            .join("docker.io_library_alpine_3-digest.txt")
            .exists());
        assert!(!state.path().join("containerfile-digest.txt").exists());
        Ok(())
    }

    #[test]
    fn test_reads_record_written_without_newline() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FilesystemDigestStore::new(temp_dir.path(), temp_dir.path());
        fs::write(temp_dir.path().join("alpine-digest.txt"), "deadbeef")?;

        assert_eq!(
            store.read_stored(&RecordKey::base_image("alpine"))?,
            Some("deadbeef".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_invalid_utf8_record_reads_lossily() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FilesystemDigestStore::new(temp_dir.path(), temp_dir.path());
        fs::write(temp_dir.path().join("alpine-digest.txt"), [0xff, 0xfe, 0x00])?;

        let stored = store.read_stored(&RecordKey::base_image("alpine"))?;
        assert_eq!(stored.as_deref(), Some("\u{fffd}\u{fffd}\u{0}"));
        Ok(())
    }

    #[test]
    fn test_write_creates_missing_state_dir() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let state = temp_dir.path().join("nested/state");
        let store = FilesystemDigestStore::new(temp_dir.path(), &state);

        store.write_stored(&RecordKey::base_image("alpine"), "v1")?;
        assert!(state.join("alpine-digest.txt").exists());
        Ok(())
    }
}
