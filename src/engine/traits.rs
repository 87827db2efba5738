use std::path::{Path, PathBuf};

use anyhow::Result;

use super::EngineKind;
use crate::storage::Fingerprint;

/// Everything a `build` invocation needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Target image name without tag
    pub image: String,
    /// Tags applied as `--tag <image>:<tag>`, in order
    pub tags: Vec<String>,
    /// `(key, value)` pairs applied as `--label key=value`
    pub labels: Vec<(String, String)>,
    pub build_file: PathBuf,
    pub context_dir: PathBuf,
}

impl BuildRequest {
    /// Fully qualified references, one per tag
    pub fn references(&self) -> Vec<String> {
        self.tags
            .iter()
            .map(|tag| format!("{}:{}", self.image, tag))
            .collect()
    }

    /// Arguments following the engine executable
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["build".to_string()];
        for reference in self.references() {
            args.push("--tag".to_string());
            args.push(reference);
        }
        for (key, value) in &self.labels {
            args.push("--label".to_string());
            args.push(format!("{}={}", key, value));
        }
        args.push("-f".to_string());
        args.push(self.build_file.display().to_string());
        args.push(self.context_dir.display().to_string());
        args
    }
}

/// Exit status of an engine command that ran to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    /// `None` when the process was killed by a signal
    pub code: Option<i32>,
}

impl RunStatus {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for RunStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        RunStatus {
            code: status.code(),
        }
    }
}

/// A container engine CLI (docker, podman)
pub trait ContainerEngine {
    fn kind(&self) -> EngineKind;

    /// Executable invoked for every command
    fn program(&self) -> &Path;

    /// Pull `reference` and return the digest text the engine reports.
    /// The format is engine specific and only ever compared for equality.
    fn pull(&self, reference: &str) -> Result<Fingerprint>;

    /// Run a build, its output shown on stderr.
    /// Returns the exit status without interpreting it.
    fn build(&self, request: &BuildRequest) -> Result<RunStatus>;

    /// Push one fully qualified reference
    fn push(&self, reference: &str) -> Result<RunStatus>;
}
