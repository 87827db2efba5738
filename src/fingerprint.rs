//! Current fingerprints for the build file and base images

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::engine::ContainerEngine;
use crate::storage::Fingerprint;

/// Hash used for the build-file fingerprint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintAlgorithm {
    #[default]
    Sha256,
    /// Matches records written by `sha1sum`-based tooling
    Sha1,
}

impl FingerprintAlgorithm {
    fn hash_hex(self, content: &[u8]) -> String {
        match self {
            FingerprintAlgorithm::Sha256 => hex::encode(Sha256::digest(content)),
            FingerprintAlgorithm::Sha1 => hex::encode(Sha1::digest(content)),
        }
    }
}

/// Fingerprint a build file the way `sha256sum <path>` prints it:
/// `"<hex>  <path>"`.
///
/// The path is part of the value, so renaming the file invalidates its
/// record even if the content is unchanged.
pub fn fingerprint_file(path: &Path, algorithm: FingerprintAlgorithm) -> Result<Fingerprint> {
    let content =
        std::fs::read(path).with_context(|| format!("Failed to read build file {:?}", path))?;
    Ok(format!("{}  {}", algorithm.hash_hex(&content), path.display()))
}

/// Fetch the current digest of a base image by pulling it.
///
/// A failed pull yields an empty fingerprint; callers treat an empty value as
/// changed so the image gets rebuilt.
pub fn fingerprint_image(engine: &impl ContainerEngine, reference: &str) -> Fingerprint {
    match engine.pull(reference) {
        Ok(digest) => {
            tracing::debug!("{} -> {:?}", reference, digest);
            digest
        }
        Err(e) => {
            tracing::warn!("Failed to pull {}: {:#}", reference, e);
            Fingerprint::new()
        }
    }
}
