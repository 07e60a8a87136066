use std::fmt;
use std::path::PathBuf;

use regex_lite::Regex;
use url::Url;

use crate::error::{LauncherError, Result};

const LAST_BUILD: &str = "lastBuild";

/// URL of a buildable job: `<server>/job/<name>(/job/<name>)*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobUrl(String);

impl JobUrl {
    /// Parses a bare job URL. Trailing actions or build numbers are rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim_end_matches('/');
        let url = Url::parse(trimmed)
            .map_err(|e| LauncherError::Config(format!("Invalid job URL '{input}': {e}")))?;

        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(LauncherError::Config(format!(
                "Invalid job URL '{input}': expected an http(s) URL"
            )));
        }

        let job_path = Regex::new(r"/job/[^/]+$").map_err(|e| LauncherError::Config(e.to_string()))?;
        if !job_path.is_match(trimmed) {
            return Err(LauncherError::Config(format!("Invalid job URL '{input}'")));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Jenkins root: everything before the first `/job/` segment.
    pub fn server_url(&self) -> &str {
        self.0.find("/job/").map_or(self.0.as_str(), |idx| &self.0[..idx])
    }

    pub fn api_json(&self) -> String {
        format!("{}/api/json", self.0)
    }

    pub fn build_endpoint(&self, parameterized: bool) -> String {
        if parameterized {
            format!("{}/buildWithParameters", self.0)
        } else {
            format!("{}/build", self.0)
        }
    }
}

impl fmt::Display for JobUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildNumber {
    Number(u64),
    Last,
}

impl fmt::Display for BuildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Last => f.write_str(LAST_BUILD),
        }
    }
}

/// One concrete execution of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildUrl {
    job: JobUrl,
    number: BuildNumber,
}

impl BuildUrl {
    /// Parses `<job url>/<number>` or `<job url>/lastBuild`.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim_end_matches('/');
        let not_a_build = || {
            LauncherError::Config(
                "This url doesn't look like a valid build. Make sure there is a build number at the end."
                    .to_string(),
            )
        };

        let (job, last) = trimmed.rsplit_once('/').ok_or_else(not_a_build)?;
        let number = if last == LAST_BUILD {
            BuildNumber::Last
        } else {
            last.parse().map(BuildNumber::Number).map_err(|_| not_a_build())?
        };

        Ok(Self {
            job: JobUrl::parse(job)?,
            number,
        })
    }

    pub fn job(&self) -> &JobUrl {
        &self.job
    }

    pub fn number(&self) -> &BuildNumber {
        &self.number
    }

    pub fn wfapi_describe(&self) -> String {
        format!("{self}/wfapi/describe")
    }

    pub fn console_text(&self) -> String {
        format!("{self}/consoleText")
    }

    /// File name for the saved console log: job names and build number
    /// joined by underscores, e.g. `folder_app_5.txt`.
    pub fn log_file_name(&self) -> PathBuf {
        let full = self.to_string();
        let path = full.find("/job/").map_or("", |idx| &full[idx..]);
        let name = format!("{path}/")
            .replace('/', "_")
            .replace("_job_", "_");
        PathBuf::from(format!("{}.txt", name.trim_matches('_')))
    }
}

impl fmt::Display for BuildUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.job, self.number)
    }
}

/// Accepts a job URL optionally ending in `/build` or
/// `/buildWithParameters?k=v&...`, returning the bare job URL plus any
/// `key=value` pairs carried in the query string.
pub fn parse_job_url(input: &str) -> Result<(JobUrl, Vec<String>)> {
    let trimmed = input.trim_end_matches('/');

    if let Some(job) = trimmed.strip_suffix("/build") {
        return Ok((JobUrl::parse(job)?, Vec::new()));
    }

    if let Some(idx) = trimmed.rfind("/buildWithParameters") {
        let rest = &trimmed[idx + "/buildWithParameters".len()..];
        if rest.is_empty() || rest.starts_with('?') {
            let args = rest
                .trim_start_matches('?')
                .split('&')
                .filter(|arg| !arg.is_empty())
                .map(ToString::to_string)
                .collect();
            return Ok((JobUrl::parse(&trimmed[..idx])?, args));
        }
    }

    let job = JobUrl::parse(trimmed)
        .map_err(|_| LauncherError::Config(format!("Invalid job URL '{input}'")))?;
    Ok((job, Vec::new()))
}
