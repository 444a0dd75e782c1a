//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`Progress`] struct which implements
//! [`ProgressCallback`] to display visual progress bars in the terminal.
//! Progress is a side channel of the pipeline: phase label, current item
//! label, percent complete. Nothing the sink does may affect the result.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Progress callback for duplicate finding phases.
///
/// Implement this trait to receive progress updates during the duplicate
/// detection pipeline. All methods are observational; implementations
/// must not influence the run.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase (e.g., "partial-hash", "full-hash")
    /// * `total` - Total number of items to process (0 when unknown)
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called at a bounded cadence while a phase runs.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase
    /// * `item` - Label of the item being processed (usually a path)
    /// * `percent` - Completion percentage in `[0.0, 100.0]`
    fn on_progress(&self, phase: &str, item: &str, percent: f64);

    /// Called when a phase completes.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase
    fn on_phase_end(&self, phase: &str);
}

/// Progress reporter using indicatif.
///
/// Keeps one active bar at a time; phases run strictly one after another
/// so a single slot suffices.
pub struct Progress {
    multi: MultiProgress,
    active: Mutex<Option<(String, ProgressBar)>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use partdupe::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            active: Mutex::new(None),
            quiet,
        }
    }

    /// Style for phases without a known total (spinner).
    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    /// Style for the hashing phases (percent bar).
    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        let pb = if total == 0 {
            let pb = self.multi.add(ProgressBar::new_spinner());
            pb.set_style(Self::spinner_style());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            // The bar tracks percent directly, not item count.
            let pb = self.multi.add(ProgressBar::new(100));
            pb.set_style(Self::bar_style());
            pb
        };
        pb.set_message(phase.to_string());

        let mut active = self.active.lock().unwrap();
        if let Some((_, old)) = active.take() {
            old.finish_and_clear();
        }
        *active = Some((phase.to_string(), pb));
    }

    fn on_progress(&self, phase: &str, item: &str, percent: f64) {
        if self.quiet {
            return;
        }

        let active = self.active.lock().unwrap();
        if let Some((ref name, ref pb)) = *active {
            if name == phase {
                pb.set_position(percent.clamp(0.0, 100.0) as u64);
                pb.set_message(truncate_path(item, 40));
            }
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        let mut active = self.active.lock().unwrap();
        let matches = matches!(*active, Some((ref name, _)) if name == phase);
        if matches {
            if let Some((_, pb)) = active.take() {
                pb.finish_with_message(format!("{phase} complete"));
            }
        }
    }
}

/// Truncate a path for display in the progress bar.
///
/// Counts characters, not bytes, so multibyte file names are cut at
/// character boundaries.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let path_buf = std::path::Path::new(path);
    let file_name = path_buf
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len >= max_len {
        let keep = max_len.saturating_sub(3);
        let tail: String = file_name.chars().skip(name_len - keep).collect();
        return format!("...{tail}");
    }

    format!(".../{}", file_name)
}
