use std::io::Write;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright_yellow, dim};

/// How poll-loop progress is rendered on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    Hidden,
    Plain,
    Spinner,
}

impl ProgressMode {
    /// Spinner on a terminal (or when forced), plain lines otherwise.
    pub fn detect(quiet: bool, force: bool) -> Self {
        if quiet {
            Self::Hidden
        } else if force || console::Term::stderr().is_term() {
            Self::Spinner
        } else {
            Self::Plain
        }
    }
}

/// One progress line per stage; a new message starts a new line.
pub struct StageProgress {
    mode: ProgressMode,
    current: Option<String>,
    pb: Option<ProgressBar>,
}

impl StageProgress {
    pub fn new(mode: ProgressMode) -> Self {
        Self {
            mode,
            current: None,
            pb: None,
        }
    }

    pub fn hidden() -> Self {
        Self::new(ProgressMode::Hidden)
    }

    pub fn update(&mut self, message: &str, elapsed: Option<Duration>) {
        if self.mode == ProgressMode::Hidden {
            return;
        }

        if self.current.as_deref() != Some(message) {
            self.finish();
            self.current = Some(message.to_string());
            if self.mode == ProgressMode::Spinner {
                self.pb = Some(create_spinner());
            }
        }

        let line = match elapsed {
            Some(elapsed) => format!("{message} {}", dim(format_duration(elapsed))),
            None => message.to_string(),
        };

        match &self.pb {
            Some(pb) => pb.set_message(bright_yellow(line).to_string()),
            None => {
                eprint!("{line}...\r");
                std::io::stderr().flush().ok();
            }
        }
    }

    /// Leaves the current line in place and moves to a fresh one.
    pub fn finish(&mut self) {
        if let Some(pb) = self.pb.take() {
            pb.finish();
        } else if self.current.is_some() {
            eprintln!();
        }
        self.current = None;
    }
}

impl Drop for StageProgress {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    // term_like draws even when stderr is not a tty, which `--progress` relies on.
    pb.set_draw_target(ProgressDrawTarget::term_like(Box::new(console::Term::stderr())));
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// `42s`, `3m 07s` or `1h 02m 03s`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}
