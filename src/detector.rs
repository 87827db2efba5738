//! Change detection: compare current fingerprints with stored records

use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::{
    containerfile,
    engine::ContainerEngine,
    fingerprint::{fingerprint_file, fingerprint_image, FingerprintAlgorithm},
    storage::{DigestStore, Fingerprint, RecordKey},
};

/// Whether the image should be built this run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RebuildDecision {
    /// Some fingerprint was missing or changed
    pub required: bool,
    /// The operator asked for a rebuild regardless
    pub forced: bool,
}

impl RebuildDecision {
    pub fn should_build(&self) -> bool {
        self.required || self.forced
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactStatus {
    /// No record existed
    New,
    Changed,
    Unchanged,
    /// The pull failed; counts as changed
    Unavailable,
}

impl ArtifactStatus {
    fn classify(stored: Option<&str>, current: &str) -> Self {
        if current.is_empty() {
            return ArtifactStatus::Unavailable;
        }
        match stored {
            None => ArtifactStatus::New,
            Some(stored) if stored == current => ArtifactStatus::Unchanged,
            Some(_) => ArtifactStatus::Changed,
        }
    }

    pub fn requires_rebuild(self) -> bool {
        self != ArtifactStatus::Unchanged
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    BuildDefinition,
    BaseImage,
}

/// Outcome for one tracked artifact
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactCheck {
    pub kind: ArtifactKind,
    pub artifact: String,
    pub status: ArtifactStatus,
    pub previous: Option<Fingerprint>,
    pub current: Fingerprint,
}

/// Decision plus the per-artifact detail that led to it
#[derive(Debug, Clone, Serialize)]
pub struct ChangeReport {
    pub decision: RebuildDecision,
    pub checks: Vec<ArtifactCheck>,
    /// Base of the last `FROM` line, `scratch` included
    pub final_base: Option<String>,
}

/// Compares the build file and its base images against a [`DigestStore`]
pub struct ChangeDetector<'a, S: DigestStore, E: ContainerEngine> {
    store: &'a S,
    engine: &'a E,
    build_file: &'a Path,
    algorithm: FingerprintAlgorithm,
}

impl<'a, S: DigestStore, E: ContainerEngine> ChangeDetector<'a, S, E> {
    pub fn new(
        store: &'a S,
        engine: &'a E,
        build_file: &'a Path,
        algorithm: FingerprintAlgorithm,
    ) -> Self {
        Self {
            store,
            engine,
            build_file,
            algorithm,
        }
    }

    /// Check every artifact and refresh the stored records.
    ///
    /// Flow:
    /// 1. Fingerprint the build file; rewrite its record only if missing or different
    /// 2. Pull each base image except `scratch`; always rewrite its record
    /// 3. `required` is set if anything was missing, changed or unavailable
    ///
    /// All images are checked even after the first change so every record is
    /// refreshed in the same run.
    pub fn decide(&self, forced: bool) -> Result<ChangeReport> {
        let mut checks = vec![self.check_build_definition()?];

        let references = containerfile::read_base_images(self.build_file)?;
        let final_base = references.last().cloned();
        let images: Vec<String> = references
            .into_iter()
            .filter(|reference| {
                let pullable = containerfile::is_pullable(reference);
                if !pullable {
                    tracing::debug!("Skipping base image {}", reference);
                }
                pullable
            })
            .collect();

        let pb = if images.len() > 1 {
            let bar = ProgressBar::new(images.len() as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("  {msg} [{bar:40.cyan/blue}] {pos}/{len} images")
                    .context("Invalid progress bar template")?
                    .progress_chars("█▓░"),
            );
            bar.set_message("Pulling base images");
            Some(bar)
        } else {
            None
        };

        for reference in &images {
            checks.push(self.check_base_image(reference)?);
            if let Some(ref bar) = pb {
                bar.inc(1);
            }
        }

        if let Some(ref bar) = pb {
            bar.finish_and_clear();
        }

        let required = checks.iter().any(|c| c.status.requires_rebuild());
        for check in checks.iter().filter(|c| c.status.requires_rebuild()) {
            tracing::info!("{}: {:?}", check.artifact, check.status);
        }

        Ok(ChangeReport {
            decision: RebuildDecision { required, forced },
            checks,
            final_base,
        })
    }

    fn check_build_definition(&self) -> Result<ArtifactCheck> {
        let key = RecordKey::BuildDefinition;
        let current = fingerprint_file(self.build_file, self.algorithm)?;
        let previous = self.store.read_stored(&key)?;
        let status = ArtifactStatus::classify(previous.as_deref(), &current);

        if status.requires_rebuild() {
            self.store.write_stored(&key, &current)?;
        }

        Ok(ArtifactCheck {
            kind: ArtifactKind::BuildDefinition,
            artifact: self.build_file.display().to_string(),
            status,
            previous,
            current,
        })
    }

    fn check_base_image(&self, reference: &str) -> Result<ArtifactCheck> {
        let key = RecordKey::base_image(reference);
        let current = fingerprint_image(self.engine, reference);
        let previous = self.store.read_stored(&key)?;
        let status = ArtifactStatus::classify(previous.as_deref(), &current);

        self.store.write_stored(&key, &current)?;

        Ok(ArtifactCheck {
            kind: ArtifactKind::BaseImage,
            artifact: reference.to_string(),
            status,
            previous,
            current,
        })
    }
}
