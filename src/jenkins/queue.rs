use log::{debug, info};

use super::poll::PollSettings;
use super::session::Session;
use super::types::QueueItem;
use super::urls::BuildUrl;
use crate::error::{LauncherError, Result};
use crate::output::StageProgress;

/// Polls a queue item until Jenkins assigns it a build.
///
/// # Errors
///
/// Returns [`LauncherError::Cancelled`] as soon as the item is reported
/// cancelled, and [`LauncherError::Timeout`] when `poll.max_attempts` runs out.
pub async fn resolve_queue_item(
    session: &Session,
    queue_item: &str,
    poll: &PollSettings,
    progress: &mut StageProgress,
) -> Result<BuildUrl> {
    let url = format!("{}/api/json", queue_item.trim_end_matches('/'));
    let mut attempts = 0;

    loop {
        let item: QueueItem = session.get_json(&url).await?;
        attempts += 1;

        if item.cancelled {
            progress.finish();
            return Err(LauncherError::Cancelled);
        }

        if let Some(build_url) = item.build_url() {
            progress.finish();
            info!("Queue item {queue_item} started as {build_url}");
            return BuildUrl::parse(build_url);
        }

        debug!("Queue item {queue_item} still waiting ({attempts} polls)");
        poll.check_attempts("queue item", attempts)?;
        poll.wait(progress, "Job queued", None).await;
    }
}
