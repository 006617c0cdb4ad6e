use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright, bright_green, bright_yellow};

/// Progress tracking for the fetch/aggregate phases
pub struct PhaseProgress {
    pb: ProgressBar,
}

impl PhaseProgress {
    pub fn start_fetch() -> Self {
        eprintln!("{}  {}", bright("⚙️"), bright("Phases").underlined());
        let pb = create_spinner(bright_yellow("Phase 1/2: Fetching build history").to_string());
        Self { pb }
    }

    pub fn finish_fetch_start_aggregate(self) -> Self {
        self.pb
            .finish_with_message(bright_green("Phase 1/2: Fetched build history ✓").to_string());
        let pb = create_spinner(bright_yellow("Phase 2/2: Aggregating versions").to_string());
        Self { pb }
    }

    pub fn finish_aggregate(self) {
        self.pb
            .finish_with_message(bright_green("Phase 2/2: Versions aggregated ✓").to_string());
        eprintln!();
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner}")
            .unwrap(),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
