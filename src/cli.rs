use std::path::PathBuf;

use clap::{ArgAction, ArgGroup, Parser};

/// Rebuild a container image when its Containerfile or base images change
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "image-rebuild")]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("engine").args(["executable", "podman", "docker"])))]
pub struct Args {
    /// Container engine executable (file name must contain "docker" or "podman")
    #[arg(short = 'e', long, value_name = "PATH")]
    pub executable: Option<PathBuf>,

    /// Use podman from PATH
    #[arg(short = 'p', long)]
    pub podman: bool,

    /// Use docker from PATH
    #[arg(short = 'd', long)]
    pub docker: bool,

    /// Rebuild even if nothing changed
    #[arg(short = 'r', long = "rebuild")]
    pub force: bool,

    /// Build definition (default: ./Containerfile, then ./Dockerfile)
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Build context directory (default: directory of the build file)
    #[arg(short = 'c', long = "context", value_name = "DIR")]
    pub context: Option<PathBuf>,

    /// Comma-separated tags; "{timestamp}" expands to the current UTC time
    #[arg(short = 't', long, value_name = "TAGS", allow_hyphen_values = true)]
    pub tags: Option<String>,

    /// Check and update digests, but never build
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Push every tag after a successful build
    #[arg(short = 'P', long)]
    pub push: bool,

    /// Extra image label (repeatable)
    #[arg(short = 'l', long = "label", value_name = "KEY=VALUE", value_parser = parse_label)]
    pub labels: Vec<(String, String)>,

    /// Directory for base-image digest records (default: working directory)
    #[arg(short = 's', long, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    /// Print the change report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Name of the image to build, without tag
    pub image: Option<String>,
}

fn parse_label(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got {:?}", s)),
    }
}
