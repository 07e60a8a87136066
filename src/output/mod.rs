mod progress;
mod styling;

pub use progress::{format_duration, ProgressMode, StageProgress};
use styling::{bright_green, bright_red, dim, magenta_bold};

/// Prints the banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🚀 launch-jenkins"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Launch a Jenkins job and wait for it to finish")
    );
}

/// User-facing status lines on stderr, silenced by `--quiet`.
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    quiet: bool,
}

impl Reporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn note(&self, message: impl std::fmt::Display) {
        if !self.quiet {
            eprintln!("{message}");
        }
    }

    pub fn outcome(&self, success: bool) {
        let result = if success {
            bright_green("SUCCESS")
        } else {
            bright_red("FAILURE")
        };
        self.note(format!("The job ended in {result}"));
    }
}
