use anyhow::Result;

use super::RecordKey;

/// Opaque fingerprint text as it is stored and compared.
/// Either `"<hex>  <path>"` for a build file or whatever the engine printed
/// for an image (`Digest: sha256:...`, a bare image ID, ...).
pub type Fingerprint = String;

/// Persistent storage of one fingerprint per tracked artifact
pub trait DigestStore {
    /// Read the stored fingerprint for `key`.
    /// Returns `Ok(None)` when no record exists; a missing record is never an error.
    fn read_stored(&self, key: &RecordKey) -> Result<Option<Fingerprint>>;

    /// Replace the stored fingerprint for `key`.
    /// Implementations write a temp file and rename it over the record.
    /// There is no locking between processes.
    fn write_stored(&self, key: &RecordKey, value: &str) -> Result<()>;
}
