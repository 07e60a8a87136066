use log::{debug, info};

use super::poll::PollSettings;
use super::session::Session;
use super::types::{Stage, StageSnapshot, StageStatus};
use super::urls::BuildUrl;
use crate::error::{LauncherError, Result};
use crate::output::StageProgress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
    StillRunning,
}

/// One interpretation of the stage view: the verdict so far and the stage
/// that best represents it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStatus {
    pub outcome: Outcome,
    pub stage: Stage,
}

/// Reads the build's current state from `wfapi/describe`.
///
/// # Errors
///
/// Returns [`LauncherError::BuildNotFound`] when the build number does not
/// exist; other HTTP failures are passed through unchanged.
pub async fn poll_status(session: &Session, build: &BuildUrl) -> Result<BuildStatus> {
    let snapshot: StageSnapshot = match session.get_json(&build.wfapi_describe()).await {
        Err(LauncherError::Transport { status: 404, .. }) => {
            return Err(LauncherError::BuildNotFound(build.number().to_string()));
        }
        other => other?,
    };

    Ok(interpret(snapshot))
}

/// Turns a stage snapshot into a verdict.
///
/// Once the build is over, the overall status is not trusted: Jenkins can
/// report FAILED for runs whose stages all passed. Success is instead "every
/// stage succeeded or was skipped".
pub fn interpret(snapshot: StageSnapshot) -> BuildStatus {
    match snapshot.status {
        StageStatus::NotExecuted => {
            if snapshot.duration_millis.unwrap_or(0) == 0 {
                // Created but not started yet.
                BuildStatus {
                    outcome: Outcome::StillRunning,
                    stage: Stage::default(),
                }
            } else {
                BuildStatus {
                    outcome: Outcome::Failure,
                    stage: last_stage(snapshot.stages),
                }
            }
        }
        StageStatus::InProgress => {
            let stage = snapshot
                .stages
                .into_iter()
                .find(|stage| stage.status.is_pending_or_running())
                .unwrap_or_default();
            BuildStatus {
                outcome: Outcome::StillRunning,
                stage,
            }
        }
        _ => {
            let success = snapshot
                .stages
                .iter()
                .all(|stage| stage.status.is_success_or_skipped());
            BuildStatus {
                outcome: if success {
                    Outcome::Success
                } else {
                    Outcome::Failure
                },
                stage: last_stage(snapshot.stages),
            }
        }
    }
}

fn last_stage(stages: Vec<Stage>) -> Stage {
    stages.into_iter().last().unwrap_or_default()
}

/// Polls until the build is final and returns whether it succeeded.
///
/// The progress line is keyed by the running stage's name, so every new
/// stage gets its own line.
pub async fn wait_until_done(
    session: &Session,
    build: &BuildUrl,
    poll: &PollSettings,
    progress: &mut StageProgress,
) -> Result<bool> {
    let mut attempts = 0;

    loop {
        let status = poll_status(session, build).await?;
        attempts += 1;

        match status.outcome {
            Outcome::Success | Outcome::Failure => {
                progress.finish();
                info!(
                    "Build {build} finished: {:?} (last stage '{}')",
                    status.outcome, status.stage.name
                );
                return Ok(status.outcome == Outcome::Success);
            }
            Outcome::StillRunning => {}
        }

        debug!("Build {build} running stage '{}'", status.stage.name);
        poll.check_attempts("build", attempts)?;

        let message = if status.stage.name.is_empty() {
            format!("Build #{} starting", build.number())
        } else {
            format!("Stage {}", status.stage.name)
        };
        poll.wait(progress, &message, status.stage.duration()).await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::auth::Credentials;
    use crate::jenkins::session::TransportSettings;

    fn snapshot(json: &str) -> StageSnapshot {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_all_stages_passed_overrides_failed_status() {
        let status = interpret(snapshot(
            r#"{
                "status": "FAILED",
                "durationMillis": 5000,
                "stages": [
                    {"name": "Checkout", "status": "SUCCESS"},
                    {"name": "Build", "status": "SUCCESS"},
                    {"name": "Deploy", "status": "NOT_EXECUTED"}
                ]
            }"#,
        ));
        assert_eq!(status.outcome, Outcome::Success);
        assert_eq!(status.stage.name, "Deploy");
    }

    #[test]
    fn test_failed_stage_means_failure() {
        let status = interpret(snapshot(
            r#"{
                "status": "SUCCESS",
                "stages": [
                    {"name": "Build", "status": "SUCCESS"},
                    {"name": "Test", "status": "FAILED"},
                    {"name": "Report", "status": "SUCCESS"}
                ]
            }"#,
        ));
        assert_eq!(status.outcome, Outcome::Failure);
        assert_eq!(status.stage.name, "Report");

        let aborted = interpret(snapshot(
            r#"{"status": "ABORTED", "stages": [{"name": "Build", "status": "ABORTED"}]}"#,
        ));
        assert_eq!(aborted.outcome, Outcome::Failure);
    }

    #[test]
    fn test_not_executed_depends_on_duration() {
        let fresh = interpret(snapshot(r#"{"status": "NOT_EXECUTED", "stages": []}"#));
        assert_eq!(fresh.outcome, Outcome::StillRunning);
        assert_eq!(fresh.stage, Stage::default());

        let zero = interpret(snapshot(r#"{"status": "NOT_EXECUTED", "durationMillis": 0}"#));
        assert_eq!(zero.outcome, Outcome::StillRunning);

        let skipped = interpret(snapshot(
            r#"{
                "status": "NOT_EXECUTED",
                "durationMillis": 10,
                "stages": [
                    {"name": "Build", "status": "NOT_EXECUTED"},
                    {"name": "Declarative: Post Actions", "status": "NOT_EXECUTED"}
                ]
            }"#,
        ));
        assert_eq!(skipped.outcome, Outcome::Failure);
        assert_eq!(skipped.stage.name, "Declarative: Post Actions");
    }

    #[test]
    fn test_in_progress_reports_first_unfinished_stage() {
        let status = interpret(snapshot(
            r#"{
                "status": "IN_PROGRESS",
                "stages": [
                    {"name": "Build", "status": "SUCCESS", "durationMillis": 100},
                    {"name": "Test", "status": "IN_PROGRESS", "durationMillis": 2500},
                    {"name": "Deploy", "status": "NOT_EXECUTED"}
                ]
            }"#,
        ));
        assert_eq!(status.outcome, Outcome::StillRunning);
        assert_eq!(status.stage.name, "Test");
        assert_eq!(status.stage.duration(), Some(Duration::from_millis(2500)));

        let no_stages = interpret(snapshot(r#"{"status": "IN_PROGRESS", "stages": []}"#));
        assert_eq!(no_stages.outcome, Outcome::StillRunning);
        assert!(no_stages.stage.name.is_empty());
    }

    async fn session(server: &mockito::Server) -> Session {
        let job = crate::jenkins::JobUrl::parse(&format!("{}/job/a", server.url())).unwrap();
        let settings = TransportSettings {
            fetch_crumb: false,
            ..TransportSettings::default()
        };
        Session::new(&job, &Credentials::new("user", "token"), &settings)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_build_is_reported_as_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/job/a/99/wfapi/describe")
            .with_status(404)
            .create_async()
            .await;

        let session = session(&server).await;
        let build = BuildUrl::parse(&format!("{}/job/a/99", server.url())).unwrap();
        let error = poll_status(&session, &build).await.unwrap_err();

        assert!(matches!(error, LauncherError::BuildNotFound(_)));
        assert_eq!(error.to_string(), "Build #99 does not exist");
    }

    #[tokio::test]
    async fn test_other_http_errors_pass_through() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/job/a/3/wfapi/describe")
            .with_status(403)
            .create_async()
            .await;

        let session = session(&server).await;
        let build = BuildUrl::parse(&format!("{}/job/a/3", server.url())).unwrap();
        let error = poll_status(&session, &build).await.unwrap_err();

        assert_eq!(error.status(), Some(403));
    }

    #[tokio::test]
    async fn test_wait_until_done_reports_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/job/a/3/wfapi/describe")
            .with_body(
                r#"{"status": "FAILED", "durationMillis": 300,
                    "stages": [{"name": "Build", "status": "FAILED", "durationMillis": 300}]}"#,
            )
            .create_async()
            .await;

        let session = session(&server).await;
        let build = BuildUrl::parse(&format!("{}/job/a/3", server.url())).unwrap();
        let poll = PollSettings {
            interval: Duration::from_millis(5),
            max_attempts: None,
        };
        let success = wait_until_done(&session, &build, &poll, &mut StageProgress::hidden())
            .await
            .unwrap();

        assert!(!success);
    }
}
