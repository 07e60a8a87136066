use std::time::Duration;

use crate::error::{LauncherError, Result};
use crate::output::StageProgress;

const DISPLAY_TICK: Duration = Duration::from_secs(1);

/// How often to poll the server, and for how long.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    /// `None` polls until the server reports a final state.
    pub max_attempts: Option<u32>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: None,
        }
    }
}

impl PollSettings {
    /// Fails once `attempts` polls have been made without a final answer.
    pub(super) fn check_attempts(&self, what: &'static str, attempts: u32) -> Result<()> {
        match self.max_attempts {
            Some(max) if attempts >= max => Err(LauncherError::Timeout { what, attempts }),
            _ => Ok(()),
        }
    }

    /// Sleeps one interval, refreshing the progress line as time passes.
    ///
    /// `elapsed` is the server's last reported duration; the displayed value
    /// advances locally until the next poll brings a fresh one.
    pub(super) async fn wait(
        &self,
        progress: &mut StageProgress,
        message: &str,
        elapsed: Option<Duration>,
    ) {
        let mut waited = Duration::ZERO;
        while waited < self.interval {
            progress.update(message, elapsed.map(|e| e + waited));
            let step = DISPLAY_TICK.min(self.interval - waited);
            tokio::time::sleep(step).await;
            waited += step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_limit() {
        let unlimited = PollSettings::default();
        assert!(unlimited.check_attempts("queue item", 10_000).is_ok());

        let limited = PollSettings {
            interval: Duration::from_millis(1),
            max_attempts: Some(3),
        };
        assert!(limited.check_attempts("queue item", 2).is_ok());
        let error = limited.check_attempts("queue item", 3).unwrap_err();
        assert_eq!(error.to_string(), "Gave up waiting for queue item after 3 polls");
    }

    #[tokio::test]
    async fn test_wait_sleeps_for_the_interval() {
        let settings = PollSettings {
            interval: Duration::from_millis(20),
            max_attempts: None,
        };
        let started = std::time::Instant::now();
        settings
            .wait(&mut StageProgress::hidden(), "Job queued", None)
            .await;
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
