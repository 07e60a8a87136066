use indexmap::IndexMap;
use log::info;

use super::console::{dump_log, LogSink};
use super::launcher::launch_build;
use super::poll::PollSettings;
use super::queue::resolve_queue_item;
use super::session::{Session, TransportSettings};
use super::status::wait_until_done;
use super::urls::{BuildUrl, JobUrl};
use crate::auth::Credentials;
use crate::error::{LauncherError, Result};
use crate::output::{ProgressMode, Reporter, StageProgress};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Launch, wait for the result and save the log.
    #[default]
    Full,
    /// Launch and stop as soon as the build has a number.
    LaunchOnly,
    /// Wait on an existing build and save its log.
    WaitOnly,
}

/// Per-run settings, fixed before the first request goes out.
#[derive(Debug, Clone, Default)]
pub struct RunSettings {
    pub mode: Mode,
    /// Write the console log to stdout instead of a file.
    pub dump: bool,
    pub quiet: bool,
    /// Force the spinner even when stderr is not a terminal.
    pub progress: bool,
    pub poll: PollSettings,
}

/// What the run operates on.
#[derive(Debug, Clone)]
pub enum Target {
    Job {
        job: JobUrl,
        params: IndexMap<String, String>,
    },
    Build(BuildUrl),
}

impl Target {
    pub fn job(&self) -> &JobUrl {
        match self {
            Self::Job { job, .. } => job,
            Self::Build(build) => build.job(),
        }
    }
}

/// Drives one build through launch, queue, status polling and log retrieval.
pub struct JenkinsProvider {
    session: Session,
    settings: RunSettings,
    reporter: Reporter,
}

impl JenkinsProvider {
    /// Opens a session against the Jenkins server hosting `job`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created or the CSRF
    /// crumb request fails.
    pub async fn new(
        job: &JobUrl,
        credentials: &Credentials,
        transport: &TransportSettings,
        settings: RunSettings,
    ) -> Result<Self> {
        let session = Session::new(job, credentials, transport).await?;
        let reporter = Reporter::new(settings.quiet);
        Ok(Self {
            session,
            settings,
            reporter,
        })
    }

    fn progress(&self) -> StageProgress {
        StageProgress::new(ProgressMode::detect(
            self.settings.quiet,
            self.settings.progress,
        ))
    }

    /// Submits the build and waits until it leaves the queue.
    pub async fn launch(&self, job: &JobUrl, params: &IndexMap<String, String>) -> Result<BuildUrl> {
        self.reporter.note("Sending build request");
        let queue_item = launch_build(&self.session, job, params).await?;
        info!("Build queued at {queue_item}");

        let build = resolve_queue_item(
            &self.session,
            &queue_item,
            &self.settings.poll,
            &mut self.progress(),
        )
        .await?;
        self.reporter.note(format!("Build started: {build}"));
        Ok(build)
    }

    /// Waits for the build to finish, then saves its console log.
    pub async fn wait(&self, build: &BuildUrl) -> Result<bool> {
        let success =
            wait_until_done(&self.session, build, &self.settings.poll, &mut self.progress())
                .await?;
        self.reporter.outcome(success);

        let sink = LogSink::for_build(build, self.settings.dump);
        if let Some(path) = dump_log(&self.session, build, &sink).await? {
            self.reporter
                .note(format!("Job output saved to {}", path.display()));
        }

        Ok(success)
    }

    /// Runs the configured mode and returns whether the build succeeded.
    /// Launch-only runs count as successful once the build has started.
    pub async fn run(&self, target: &Target) -> Result<bool> {
        let build = match (target, self.settings.mode) {
            (Target::Build(build), _) => build.clone(),
            (Target::Job { job, .. }, Mode::WaitOnly) => {
                return Err(LauncherError::Config(format!(
                    "Waiting needs a build url, got the job url {job}"
                )));
            }
            (Target::Job { job, params }, Mode::LaunchOnly) => {
                let build = self.launch(job, params).await?;
                println!("{build}");
                return Ok(true);
            }
            (Target::Job { job, params }, _) => self.launch(job, params).await?,
        };

        self.wait(&build).await
    }
}
