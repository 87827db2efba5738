use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{
    process::{run_captured, run_inherited},
    BuildRequest, ContainerEngine, EngineKind, RunStatus,
};
use crate::storage::Fingerprint;

const DIGEST_MARKER: &str = "Digest:";

/// Docker CLI
#[derive(Debug, Clone)]
pub struct Docker {
    program: PathBuf,
}

impl Docker {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

/// `docker pull` prints a `Digest: sha256:...` line among its progress
/// output. The whole line, marker included, is the fingerprint.
pub fn parse_pull_output(stdout: &str) -> Option<Fingerprint> {
    stdout
        .lines()
        .find(|line| line.contains(DIGEST_MARKER))
        .map(str::to_string)
}

impl ContainerEngine for Docker {
    fn kind(&self) -> EngineKind {
        EngineKind::Docker
    }

    fn program(&self) -> &Path {
        &self.program
    }

    fn pull(&self, reference: &str) -> Result<Fingerprint> {
        let stdout = run_captured(&self.program, ["pull", reference])?;
        parse_pull_output(&stdout)
            .with_context(|| format!("No {:?} line in docker pull output for {}", DIGEST_MARKER, reference))
    }

    fn build(&self, request: &BuildRequest) -> Result<RunStatus> {
        run_inherited(&self.program, request.to_args())
    }

    fn push(&self, reference: &str) -> Result<RunStatus> {
        run_inherited(&self.program, ["push", reference])
    }
}
