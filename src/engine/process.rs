use std::{
    ffi::OsStr,
    io,
    path::Path,
    process::{Command, Stdio},
};

use anyhow::{Context, Result};

use super::RunStatus;

/// Run the engine with captured output and return stdout.
/// Fails if the command can't be spawned or exits non-zero.
pub fn run_captured<I, S>(program: &Path, args: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args).stdin(Stdio::null());
    tracing::debug!("Running {:?}", cmd);

    let output = cmd
        .output()
        .with_context(|| format!("Failed to execute {}", program.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "{} exited with {}: {}",
            program.display(),
            output.status,
            stderr.trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run the engine so the operator sees its progress.
/// Its stdout is sent to our stderr; stdout is reserved for the `--json` report.
pub fn run_inherited<I, S>(program: &Path, args: I) -> Result<RunStatus>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args).stdout(io::stderr());
    tracing::debug!("Running {:?}", cmd);

    let status = cmd
        .status()
        .with_context(|| format!("Failed to execute {}", program.display()))?;
    Ok(status.into())
}
