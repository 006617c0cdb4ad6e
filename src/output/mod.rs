mod progress;
mod styling;
mod summary;
mod tables;

pub use progress::PhaseProgress;
pub use styling::{dim, magenta_bold};
pub use summary::{print_builds_report, print_version_report};

/// Prints the buildlens banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🔭 buildlens"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Jenkins build & version dashboard")
    );
}
