//! Container engine CLIs
//!
//! Docker and podman print pull results differently, so each has its own
//! [`ContainerEngine`] implementation. [`Engine`] wraps whichever one was
//! selected.

mod discovery;
mod docker;
mod podman;
mod process;
mod traits;

use std::{fmt, path::Path};

use anyhow::Result;

pub use discovery::EngineSelection;
pub use docker::Docker;
pub use podman::Podman;
pub use traits::{BuildRequest, ContainerEngine, RunStatus};

use crate::storage::Fingerprint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Docker,
    Podman,
}

impl EngineKind {
    /// Executable name looked up on `PATH`
    pub fn program_name(self) -> &'static str {
        match self {
            EngineKind::Docker => "docker",
            EngineKind::Podman => "podman",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program_name())
    }
}

/// The engine chosen for this run
#[derive(Debug, Clone)]
pub enum Engine {
    Docker(Docker),
    Podman(Podman),
}

// Delegate to the selected engine
impl ContainerEngine for Engine {
    fn kind(&self) -> EngineKind {
        match self {
            Engine::Docker(e) => e.kind(),
            Engine::Podman(e) => e.kind(),
        }
    }

    fn program(&self) -> &Path {
        match self {
            Engine::Docker(e) => e.program(),
            Engine::Podman(e) => e.program(),
        }
    }

    fn pull(&self, reference: &str) -> Result<Fingerprint> {
        match self {
            Engine::Docker(e) => e.pull(reference),
            Engine::Podman(e) => e.pull(reference),
        }
    }

    fn build(&self, request: &BuildRequest) -> Result<RunStatus> {
        match self {
            Engine::Docker(e) => e.build(request),
            Engine::Podman(e) => e.build(request),
        }
    }

    fn push(&self, reference: &str) -> Result<RunStatus> {
        match self {
            Engine::Docker(e) => e.push(reference),
            Engine::Podman(e) => e.push(reference),
        }
    }
}
