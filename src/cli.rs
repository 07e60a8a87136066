use anyhow::{bail, Context, Result};
use clap::Parser;
use indexmap::IndexMap;
use log::info;
use std::path::PathBuf;

use launch_jenkins::jenkins::{
    parse_job_url, BuildUrl, JenkinsProvider, Mode, RunSettings, Target,
};
use launch_jenkins::Credentials;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "launch-jenkins")]
#[command(author, version, about = "Launch a Jenkins job and wait for it to finish", long_about = None)]
pub struct Cli {
    /// Username
    #[arg(short, long, env = "JENKINS_USER")]
    user: Option<String>,

    /// User API token
    #[arg(short, long, env = "JENKINS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// The full url of the job to launch (or of the build, with --wait-only)
    #[arg(short, long)]
    job: String,

    /// Print job output to stdout instead of saving it to a file
    #[arg(long, default_value_t = false)]
    dump: bool,

    /// Print debug output
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Do not print user messages
    #[arg(short, long, default_value_t = false)]
    quiet: bool,

    /// Force show progress bar
    #[arg(short, long, default_value_t = false)]
    progress: bool,

    /// Only launch the build. Exit when it starts running
    #[arg(short, long, conflicts_with = "wait_only")]
    launch_only: bool,

    /// Interpret the job url as an already running build and wait for it to finish
    #[arg(short, long)]
    wait_only: bool,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds between polls
    #[arg(long)]
    interval: Option<f64>,

    /// Give up after this many polls of the queue or the build
    #[arg(long)]
    max_polls: Option<u32>,

    /// (Optional) A list of parameters in the form key=value
    params: Vec<String>,
}

/// Splits a `key=value` argument on its first `=`.
pub fn parse_kwarg(arg: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((key, value)) => Ok((key.to_string(), value.to_string())),
        None => bail!("Invalid job argument: \"{arg}\". Please use key=value format"),
    }
}

fn parse_params<'a>(args: impl IntoIterator<Item = &'a String>) -> Result<IndexMap<String, String>> {
    args.into_iter().map(|arg| parse_kwarg(arg)).collect()
}

impl Cli {
    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn quiet(&self) -> bool {
        self.quiet
    }

    fn mode(&self) -> Mode {
        if self.launch_only {
            Mode::LaunchOnly
        } else if self.wait_only {
            Mode::WaitOnly
        } else {
            Mode::Full
        }
    }

    fn target(&self) -> Result<Target> {
        if self.wait_only {
            if !self.params.is_empty() {
                bail!("Build parameters cannot be used with --wait-only");
            }
            return Ok(Target::Build(BuildUrl::parse(&self.job)?));
        }

        let (job, inline) = parse_job_url(&self.job)?;
        let params = parse_params(inline.iter().chain(&self.params))?;
        Ok(Target::Job { job, params })
    }

    /// Runs the selected mode and returns whether the build succeeded.
    pub async fn execute(&self) -> Result<bool> {
        let target = self.target()?;
        let config = Config::load(self.config.as_deref())?;

        let user = self
            .user
            .clone()
            .or_else(|| config.user.clone())
            .context("A username is required (--user, JENKINS_USER or the config file)")?;
        let token = self
            .token
            .clone()
            .or_else(|| config.token.clone())
            .context("A token is required (--token, JENKINS_TOKEN or the config file)")?;
        let credentials = Credentials::new(user, token);

        let settings = RunSettings {
            mode: self.mode(),
            dump: self.dump,
            quiet: self.quiet,
            progress: self.progress,
            poll: config.poll_settings(self.interval, self.max_polls)?,
        };

        info!("Connecting to {} as {}", target.job().server_url(), credentials.user());
        let provider = JenkinsProvider::new(
            target.job(),
            &credentials,
            &config.transport_settings(),
            settings,
        )
        .await?;

        Ok(provider.run(&target).await?)
    }
}
