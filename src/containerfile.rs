//! Base image discovery in a Containerfile/Dockerfile

use std::path::Path;

use anyhow::{Context, Result};

/// Base image name meaning "no base image"; never pulled or recorded
pub const SCRATCH: &str = "scratch";

const FROM_MARKER: &str = "FROM";

/// Extract every base image reference from build-definition text.
///
/// Only lines starting at column one with the `FROM` token count. The rest of
/// the line, trimmed, is the reference. Order is kept and duplicates are not
/// removed.
pub fn base_images(content: &str) -> Vec<String> {
    content.lines().filter_map(parse_from_line).collect()
}

/// Read a build file and extract its base images
pub fn read_base_images(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read build file {:?}", path))?;
    Ok(base_images(&content))
}

fn parse_from_line(line: &str) -> Option<String> {
    let rest = line.strip_prefix(FROM_MARKER)?;
    // `FROMAGE x` is not a FROM line
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let reference = rest.trim();
    if reference.is_empty() {
        return None;
    }
    Some(reference.to_string())
}

/// True for base images that must be fingerprinted
pub fn is_pullable(reference: &str) -> bool {
    reference != SCRATCH
}
