//! Everything a run needs, resolved once from arguments and config file

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::{
    cli::Args,
    config::RebuildConfig,
    engine::{Engine, EngineKind, EngineSelection},
    error::Error,
    fingerprint::FingerprintAlgorithm,
    tags,
};

/// Build files tried, in order, when `-f` is not given
const DEFAULT_BUILD_FILES: [&str; 2] = ["Containerfile", "Dockerfile"];

#[derive(Debug, Clone)]
pub struct Settings {
    pub engine: Engine,
    pub image: String,
    pub tags: Vec<String>,
    pub build_file: PathBuf,
    pub context_dir: PathBuf,
    pub state_dir: PathBuf,
    pub labels: Vec<(String, String)>,
    pub algorithm: FingerprintAlgorithm,
    pub forced: bool,
    pub dry_run: bool,
    pub push: bool,
}

impl Settings {
    /// Validate arguments and resolve defaults.
    ///
    /// Checks run in this order, so the first failure decides the exit code:
    /// explicitly selected engine, tags, build file, engine discovery, image name.
    pub fn resolve(args: &Args, config: &RebuildConfig, now: DateTime<Utc>) -> Result<Self> {
        let selection = engine_selection(args, config);
        let explicit_engine = match selection {
            EngineSelection::Auto => None,
            ref selection => Some(selection.resolve()?),
        };

        let tags = match &args.tags {
            Some(list) => tags::parse_tags(list, now)?,
            None => config
                .default_tags
                .iter()
                .map(|tag| tags::expand_tag(tag, now))
                .collect::<Result<Vec<_>>>()?,
        };

        let build_file = resolve_build_file(args.file.as_deref())?;
        let context_dir = match &args.context {
            Some(dir) => dir.clone(),
            None => default_context_dir(&build_file),
        };
        if !context_dir.is_dir() {
            anyhow::bail!("Context directory not found: {:?}", context_dir);
        }

        let engine = match explicit_engine {
            Some(engine) => engine,
            None => EngineSelection::Auto.resolve()?,
        };

        let image = args
            .image
            .clone()
            .filter(|image| !image.is_empty())
            .ok_or(Error::MissingImageName)?;

        let state_dir = args
            .state_dir
            .clone()
            .or_else(|| config.state_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));

        let mut labels: Vec<(String, String)> = config
            .labels
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        labels.extend(args.labels.iter().cloned());

        Ok(Settings {
            engine,
            image,
            tags,
            build_file,
            context_dir,
            state_dir,
            labels,
            algorithm: config.fingerprint_algorithm,
            forced: args.force,
            dry_run: args.dry_run,
            push: args.push,
        })
    }
}

/// Command line wins over the config file; nothing selected means discovery
fn engine_selection(args: &Args, config: &RebuildConfig) -> EngineSelection {
    if let Some(path) = &args.executable {
        EngineSelection::Executable(path.clone())
    } else if args.podman {
        EngineSelection::Kind(EngineKind::Podman)
    } else if args.docker {
        EngineSelection::Kind(EngineKind::Docker)
    } else if let Some(path) = &config.engine {
        EngineSelection::Executable(path.clone())
    } else {
        EngineSelection::Auto
    }
}

fn resolve_build_file(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(Error::MissingBuildFile(path.to_path_buf()).into());
        }
        return Ok(path.to_path_buf());
    }

    DEFAULT_BUILD_FILES
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| Error::MissingBuildFile(PathBuf::from(DEFAULT_BUILD_FILES[0])).into())
}

/// Directory containing the build file; `.` for a bare file name
fn default_context_dir(build_file: &Path) -> PathBuf {
    match build_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
