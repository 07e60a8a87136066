mod console;
mod headers;
mod launcher;
mod params;
mod poll;
mod provider;
mod queue;
mod session;
mod status;
mod types;
mod urls;


pub use console::{dump_log, retrieve_log, LogSink};
pub use headers::Headers;
pub use launcher::{fetch_parameter_definitions, launch_build};
pub use params::validate_params;
pub use poll::PollSettings;
pub use provider::{JenkinsProvider, Mode, RunSettings, Target};
pub use queue::resolve_queue_item;
pub use session::{ChunkStream, Response, Session, TransportSettings};
pub use status::{interpret, poll_status, wait_until_done, BuildStatus, Outcome};
pub use types::{ParameterDefinitions, Stage, StageSnapshot, StageStatus};
pub use urls::{parse_job_url, BuildNumber, BuildUrl, JobUrl};
