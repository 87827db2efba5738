use std::path::{Path, PathBuf};

use anyhow::Result;

use super::{Docker, Engine, EngineKind, Podman};
use crate::error::Error;

/// How the operator asked for an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineSelection {
    /// First of docker, podman found on `PATH`
    Auto,
    /// A specific kind, looked up on `PATH`
    Kind(EngineKind),
    /// An explicit executable; its file name decides the kind
    Executable(PathBuf),
}

/// Infer the engine kind from an executable's file name
pub fn kind_from_executable(path: &Path) -> Option<EngineKind> {
    let name = path.file_name()?.to_string_lossy();
    if name.contains("docker") {
        Some(EngineKind::Docker)
    } else if name.contains("podman") {
        Some(EngineKind::Podman)
    } else {
        None
    }
}

impl EngineSelection {
    /// Resolve to a runnable engine.
    ///
    /// Fails with [`Error::InvalidExecutable`], [`Error::EngineNotFound`] or
    /// [`Error::NoEngine`] depending on what went wrong.
    pub fn resolve(&self) -> Result<Engine> {
        match self {
            EngineSelection::Executable(path) => {
                let kind = kind_from_executable(path)
                    .ok_or_else(|| Error::InvalidExecutable(path.clone()))?;
                let program = which::which(path)
                    .map_err(|_| Error::EngineNotFound(path.display().to_string()))?;
                Ok(Engine::new(kind, program))
            }
            EngineSelection::Kind(kind) => {
                let program = which::which(kind.program_name())
                    .map_err(|_| Error::EngineNotFound(kind.program_name().to_string()))?;
                Ok(Engine::new(*kind, program))
            }
            EngineSelection::Auto => {
                for kind in [EngineKind::Docker, EngineKind::Podman] {
                    if let Ok(program) = which::which(kind.program_name()) {
                        tracing::debug!("Found {} at {:?}", kind, program);
                        return Ok(Engine::new(kind, program));
                    }
                }
                Err(Error::NoEngine.into())
            }
        }
    }
}

impl Engine {
    pub fn new(kind: EngineKind, program: PathBuf) -> Self {
        match kind {
            EngineKind::Docker => Engine::Docker(Docker::new(program)),
            EngineKind::Podman => Engine::Podman(Podman::new(program)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_executable_name() {
        assert_eq!(
            kind_from_executable(Path::new("/usr/bin/docker")),
            Some(EngineKind::Docker)
        );
        assert_eq!(
            kind_from_executable(Path::new("/opt/podman-remote")),
            Some(EngineKind::Podman)
        );
        assert_eq!(
            kind_from_executable(Path::new("/home/me/bin/my-docker-wrapper")),
            Some(EngineKind::Docker)
        );
        assert_eq!(kind_from_executable(Path::new("/usr/bin/nerdctl")), None);
    }

    #[test]
    fn test_directory_name_does_not_count() {
        assert_eq!(kind_from_executable(Path::new("/opt/docker/bin/buildah")), None);
    }

    #[test]
    fn test_invalid_executable_name() {
        let err = EngineSelection::Executable(PathBuf::from("/bin/true"))
            .resolve()
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::InvalidExecutable(_))
        ));
    }

    #[test]
    fn test_missing_explicit_executable() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("docker");
        let err = EngineSelection::Executable(path).resolve().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::EngineNotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_explicit_executable_resolves() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("podman");
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let engine = EngineSelection::Executable(path.clone()).resolve().unwrap();
        assert!(matches!(engine, Engine::Podman(_)));
    }
}
