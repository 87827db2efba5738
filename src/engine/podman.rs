use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{
    process::{run_captured, run_inherited},
    BuildRequest, ContainerEngine, EngineKind, RunStatus,
};
use crate::storage::Fingerprint;

/// Podman CLI
#[derive(Debug, Clone)]
pub struct Podman {
    program: PathBuf,
}

impl Podman {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

/// `podman pull` writes progress to stderr and the image ID as the last line
/// of stdout; that line is the fingerprint.
pub fn parse_pull_output(stdout: &str) -> Option<Fingerprint> {
    stdout
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .map(str::to_string)
}

impl ContainerEngine for Podman {
    fn kind(&self) -> EngineKind {
        EngineKind::Podman
    }

    fn program(&self) -> &Path {
        &self.program
    }

    fn pull(&self, reference: &str) -> Result<Fingerprint> {
        let stdout = run_captured(&self.program, ["pull", reference])?;
        parse_pull_output(&stdout)
            .with_context(|| format!("podman pull printed nothing for {}", reference))
    }

    fn build(&self, request: &BuildRequest) -> Result<RunStatus> {
        run_inherited(&self.program, request.to_args())
    }

    fn push(&self, reference: &str) -> Result<RunStatus> {
        run_inherited(&self.program, ["push", reference])
    }
}
