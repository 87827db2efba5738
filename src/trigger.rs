//! Run the engine build (and optional push) when the decision calls for it

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::{
    containerfile,
    detector::{ChangeReport, RebuildDecision},
    engine::{BuildRequest, ContainerEngine, RunStatus},
};

pub const CREATED_LABEL: &str = "org.opencontainers.image.created";
pub const BASE_NAME_LABEL: &str = "org.opencontainers.image.base.name";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Nothing changed and no rebuild was forced
    UpToDate,
    /// A build was due but `--dry-run` suppressed it
    DryRun,
    /// The build ran; its status is passed through untouched
    Built(RunStatus),
}

/// Inputs for the build command that don't come from the detector
pub struct BuildTarget {
    pub image: String,
    pub tags: Vec<String>,
    pub labels: Vec<(String, String)>,
    pub build_file: PathBuf,
    pub context_dir: PathBuf,
}

impl BuildTarget {
    /// Assemble the build request.
    ///
    /// Adds the creation time label and the final stage's base image, unless
    /// that stage starts from `scratch`.
    pub fn to_request(&self, report: &ChangeReport, now: DateTime<Utc>) -> BuildRequest {
        let mut labels = vec![(
            CREATED_LABEL.to_string(),
            now.to_rfc3339_opts(SecondsFormat::Secs, true),
        )];
        let final_base = report.final_base.as_deref();
        if let Some(base) = final_base.filter(|base| containerfile::is_pullable(base)) {
            labels.push((BASE_NAME_LABEL.to_string(), base.to_string()));
        }
        labels.extend(self.labels.iter().cloned());

        BuildRequest {
            image: self.image.clone(),
            tags: self.tags.clone(),
            labels,
            build_file: self.build_file.clone(),
            context_dir: self.context_dir.clone(),
        }
    }
}

/// Build when `decision.should_build()`, then push every tag if asked to and
/// the build succeeded.
pub fn run(
    engine: &impl ContainerEngine,
    decision: RebuildDecision,
    request: &BuildRequest,
    dry_run: bool,
    push: bool,
) -> Result<TriggerOutcome> {
    if !decision.should_build() {
        tracing::info!("{} is up to date", request.image);
        return Ok(TriggerOutcome::UpToDate);
    }

    if dry_run {
        tracing::info!("Dry run: skipping build of {}", request.image);
        return Ok(TriggerOutcome::DryRun);
    }

    tracing::info!(
        "Building {} with {} (required: {}, forced: {})",
        request.references().join(", "),
        engine.kind(),
        decision.required,
        decision.forced
    );
    let status = engine
        .build(request)
        .with_context(|| format!("Failed to run build for {}", request.image))?;

    if push && status.success() {
        for reference in request.references() {
            tracing::info!("Pushing {}", reference);
            let push_status = engine
                .push(&reference)
                .with_context(|| format!("Failed to run push for {}", reference))?;
            if !push_status.success() {
                anyhow::bail!("Push of {} failed (exit code {:?})", reference, push_status.code);
            }
        }
    }

    Ok(TriggerOutcome::Built(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::{ArtifactCheck, ArtifactKind, ArtifactStatus};
    use crate::engine::testing::FakeEngine;
    use chrono::TimeZone;

    fn target() -> BuildTarget {
        BuildTarget {
            image: "example/app".to_string(),
            tags: vec!["latest".to_string(), "v1".to_string()],
            labels: vec![("team".to_string(), "infra".to_string())],
            build_file: PathBuf::from("app/Containerfile"),
            context_dir: PathBuf::from("app"),
        }
    }

    fn check(kind: ArtifactKind, artifact: &str) -> ArtifactCheck {
        ArtifactCheck {
            kind,
            artifact: artifact.to_string(),
            status: ArtifactStatus::Unchanged,
            previous: Some("x".to_string()),
            current: "x".to_string(),
        }
    }

    fn report(required: bool, forced: bool) -> ChangeReport {
        ChangeReport {
            decision: RebuildDecision { required, forced },
            checks: vec![
                check(ArtifactKind::BuildDefinition, "app/Containerfile"),
                check(ArtifactKind::BaseImage, "builder:1"),
                check(ArtifactKind::BaseImage, "runtime:2"),
            ],
            final_base: Some("runtime:2".to_string()),
        }
    }

    fn request() -> BuildRequest {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 13, 45, 9).unwrap();
        target().to_request(&report(true, false), now)
    }

    #[test]
    fn test_request_arguments() {
        assert_eq!(
            request().to_args(),
            vec![
                "build",
                "--tag",
                "example/app:latest",
                "--tag",
                "example/app:v1",
                "--label",
                "org.opencontainers.image.created=2024-05-01T13:45:09Z",
                "--label",
                "org.opencontainers.image.base.name=runtime:2",
                "--label",
                "team=infra",
                "-f",
                "app/Containerfile",
                "app",
            ]
        );
    }

    #[test]
    fn test_no_base_label_without_base_images() {
        let report = ChangeReport {
            decision: RebuildDecision::default(),
            checks: vec![check(ArtifactKind::BuildDefinition, "Containerfile")],
            final_base: None,
        };
        let request = target().to_request(&report, Utc::now());
        assert!(request.labels.iter().all(|(k, _)| k != BASE_NAME_LABEL));
    }

    #[test]
    fn test_no_base_label_when_final_stage_is_scratch() {
        let report = ChangeReport {
            decision: RebuildDecision::default(),
            checks: vec![
                check(ArtifactKind::BuildDefinition, "Containerfile"),
                check(ArtifactKind::BaseImage, "builder:1"),
            ],
            final_base: Some("scratch".to_string()),
        };
        let request = target().to_request(&report, Utc::now());
        assert!(request.labels.iter().all(|(k, _)| k != BASE_NAME_LABEL));
    }

    #[test]
    fn test_up_to_date_does_not_build() {
        let engine = FakeEngine::default();
        let outcome = run(&engine, RebuildDecision::default(), &request(), false, true).unwrap();
        assert_eq!(outcome, TriggerOutcome::UpToDate);
        assert!(engine.builds.borrow().is_empty());
        assert!(engine.pushes.borrow().is_empty());
    }

    #[test]
    fn test_forced_builds() {
        let engine = FakeEngine::default();
        let decision = RebuildDecision {
            required: false,
            forced: true,
        };
        let outcome = run(&engine, decision, &request(), false, false).unwrap();
        assert_eq!(outcome, TriggerOutcome::Built(RunStatus { code: Some(0) }));
        assert_eq!(engine.builds.borrow().len(), 1);
        assert!(engine.pushes.borrow().is_empty());
    }

    #[test]
    fn test_dry_run_skips_build() {
        let engine = FakeEngine::default();
        let decision = RebuildDecision {
            required: true,
            forced: false,
        };
        let outcome = run(&engine, decision, &request(), true, true).unwrap();
        assert_eq!(outcome, TriggerOutcome::DryRun);
        assert!(engine.builds.borrow().is_empty());
    }

    #[test]
    fn test_push_every_tag_after_success() {
        let engine = FakeEngine::default();
        let decision = RebuildDecision {
            required: true,
            forced: false,
        };
        run(&engine, decision, &request(), false, true).unwrap();
        assert_eq!(
            *engine.pushes.borrow(),
            vec!["example/app:latest", "example/app:v1"]
        );
    }

    #[test]
    fn test_failed_build_is_passed_through_without_push() {
        let engine = FakeEngine::default().with_build_code(3);
        let decision = RebuildDecision {
            required: true,
            forced: false,
        };
        let outcome = run(&engine, decision, &request(), false, true).unwrap();
        assert_eq!(outcome, TriggerOutcome::Built(RunStatus { code: Some(3) }));
        assert!(engine.pushes.borrow().is_empty());
    }
}
