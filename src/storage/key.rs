use std::fmt;

/// File holding the build-definition fingerprint, inside the context directory
pub const BUILD_DEFINITION_RECORD: &str = "containerfile-digest.txt";

/// Suffix appended to a sanitized image reference to name its record file
pub const IMAGE_RECORD_SUFFIX: &str = "-digest.txt";

/// Identifies one tracked artifact in a [`DigestStore`](super::DigestStore)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKey {
    /// The Containerfile/Dockerfile of the image being built
    BuildDefinition,
    /// A base image, by its raw reference as written after `FROM`
    BaseImage(String),
}

impl RecordKey {
    pub fn base_image(reference: impl Into<String>) -> Self {
        RecordKey::BaseImage(reference.into())
    }

    /// Name of the record file for this key
    pub fn file_name(&self) -> String {
        match self {
            RecordKey::BuildDefinition => BUILD_DEFINITION_RECORD.to_string(),
            RecordKey::BaseImage(reference) => {
                format!("{}{}", sanitize_reference(reference), IMAGE_RECORD_SUFFIX)
            }
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::BuildDefinition => write!(f, "build definition"),
            RecordKey::BaseImage(reference) => write!(f, "image {}", reference),
        }
    }
}

/// Replace every run of characters that are neither ASCII alphanumeric nor `.`
/// with a single `_`.
///
/// Lossy: `quay.io/a:b` and `quay.io/a/b` map to the same name and so share a
/// record. Kept as-is so record files from earlier runs stay valid.
pub fn sanitize_reference(reference: &str) -> String {
    let mut out = String::with_capacity(reference.len());
    let mut in_run = false;
    for c in reference.chars() {
        if c.is_ascii_alphanumeric() || c == '.' {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}
