//! Terminal feedback while a run waits on the server.

use std::borrow::Cow;
use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICK_INTERVAL: Duration = Duration::from_millis(120);

/// Spinner on stderr that clears itself when dropped.
///
/// Hidden when stderr is not a terminal or when the caller prints
/// machine-readable output, so pipes and `--json` stay clean.
pub struct Activity {
    bar: ProgressBar,
}

impl Activity {
    pub fn start(message: impl Into<Cow<'static, str>>, quiet: bool) -> Self {
        let bar = if quiet || !std::io::stderr().is_terminal() {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };

        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}") {
            bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }
        bar.set_message(message);
        bar.enable_steady_tick(TICK_INTERVAL);

        Activity { bar }
    }
}

impl Drop for Activity {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_activity_is_hidden() {
        let activity = Activity::start("syncing", true);
        assert!(activity.bar.is_hidden());
    }

    #[test]
    fn test_drop_finishes_spinner() {
        let activity = Activity::start(String::from("syncing"), true);
        let bar = activity.bar.clone();

        drop(activity);

        assert!(bar.is_finished());
    }
}
