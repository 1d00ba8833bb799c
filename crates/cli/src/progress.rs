//! Terminal progress bar for the CLI.

use fetchkit::progress::BAR_WIDTH;
use fetchkit::{ConsoleProgress, ProgressSink, ProgressSnapshot};
use indicatif::{ProgressBar, ProgressStyle};

/// Renders progress with `indicatif`, drawn on stderr.
///
/// The bar hides itself when stderr is not a terminal.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        Self { bar: new_bar() }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

fn new_bar() -> ProgressBar {
    let template = format!("[{{bar:{BAR_WIDTH}}}] {{msg}}");
    let style = ProgressStyle::with_template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█.");

    let bar = ProgressBar::new(100);
    bar.set_style(style);
    bar
}

impl ProgressSink for BarProgress {
    fn update(&mut self, snapshot: &ProgressSnapshot) {
        let percentage = snapshot.percentage();
        self.bar.set_position(percentage as u64);
        self.bar
            .set_message(format!("{:.2}% ({})", percentage, snapshot.rate_string()));
    }

    fn finish(&mut self) {
        // Each fetch or extraction gets its own line
        let done = std::mem::replace(&mut self.bar, new_bar());
        done.finish();
    }
}

/// Picks the renderer for this invocation.
pub fn sink(plain: bool) -> Box<dyn ProgressSink> {
    if plain {
        Box::new(ConsoleProgress::stdout())
    } else {
        Box::new(BarProgress::new())
    }
}
