use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thirdforce::engine::progress::{Progress, ProgressCallback};
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;
const BAR_TEMPLATE: &str = "{prefix:>8} [{bar:40.cyan/blue}] {pos}/{len} {msg} ({elapsed})";

/// Shows displacement progress on stderr.
///
/// A spinner covers the phase until the batch size is known, then a bar advances
/// once per finished displacement with the ordinal in flight as its message.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
        pb.finish_and_clear();
        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb = self.pb.clone();
        Box::new(move |event: Progress| match pb.lock() {
            Ok(guard) => Self::apply(&guard, event),
            Err(_) => warn!("Progress bar mutex was poisoned. Cannot update progress."),
        })
    }

    fn apply(pb: &ProgressBar, event: Progress) {
        match event {
            Progress::PhaseStart { name } => {
                pb.reset();
                pb.set_length(0);
                pb.set_style(Self::style("{spinner:.green} {prefix}", ProgressStyle::default_spinner()));
                pb.set_prefix(name);
                pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
            }
            Progress::TaskStart { total_steps } => {
                pb.disable_steady_tick();
                pb.reset();
                pb.set_length(total_steps);
                pb.set_style(Self::style(BAR_TEMPLATE, ProgressStyle::default_bar()).progress_chars("##-"));
                pb.set_prefix("forces");
            }
            Progress::DisplacementStart { ordinal } => pb.set_message(format!("disp {}", ordinal)),
            Progress::DisplacementFinish { .. } => pb.inc(1),
            Progress::TaskFinish => {
                pb.set_message("");
                pb.finish();
            }
            Progress::PhaseFinish => {
                pb.disable_steady_tick();
                pb.finish_with_message("done");
            }
        }
    }

    fn style(template: &str, fallback: ProgressStyle) -> ProgressStyle {
        ProgressStyle::with_template(template).unwrap_or(fallback)
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
