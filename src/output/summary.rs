use std::fmt::Write;

use comfy_table::{Cell, Color as TableColor};

use crate::report::{BuildRow, BuildsReport, VersionReport};

use super::styling::{bright, bright_yellow, cyan, dim};
use super::tables::{create_table, duration_cell, status_cell, tests_cell, timestamp_cell};

/// Prints the version-grouped view: one table per full version string, most
/// recently active version first, builds newest first.
pub fn print_version_report(report: &VersionReport) {
    println!("{}", render_version_report(report));
}

/// Prints the flat all-builds view as a single table with a version column.
pub fn print_builds_report(report: &BuildsReport) {
    println!("{}", render_builds_report(report));
}

fn create_cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

fn build_cells(row: &BuildRow) -> Vec<Cell> {
    vec![
        timestamp_cell(row.timestamp),
        duration_cell(row.duration_ms, row.timestamp),
        status_cell(row.status),
        Cell::new(&row.job),
        Cell::new(format!("#{}", row.build)),
        tests_cell(row.test_summary),
        Cell::new(&row.build_url).fg(TableColor::Grey),
    ]
}

fn render_version_report(report: &VersionReport) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "{} {}",
        bright("📦"),
        bright(format!("{}: Development Version Status", report.product)).underlined()
    );
    let _ = writeln!(
        output,
        "  {} {}   {} {}\n",
        dim("Versions:"),
        bright_yellow(report.total_versions),
        dim("Builds:"),
        bright_yellow(report.total_builds),
    );

    if report.versions.is_empty() {
        let _ = writeln!(output, "  {}", dim("No versioned builds found."));
        return output;
    }

    for (version, rows) in &report.versions {
        let _ = writeln!(output, "{} {}", bright("🔖"), cyan(version));

        let mut table = create_table();
        table.set_header(create_cyan_header(&[
            "Started", "Duration", "Status", "Job", "Build", "Tests", "Link",
        ]));
        for row in rows {
            table.add_row(build_cells(row));
        }
        let _ = writeln!(output, "{table}\n");
    }

    output
}

fn render_builds_report(report: &BuildsReport) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "{} {}",
        bright("🧱"),
        bright(format!("{}: Latest Build Status", report.product)).underlined()
    );
    let _ = writeln!(
        output,
        "  {} {}\n",
        dim("Builds:"),
        bright_yellow(report.total_builds),
    );

    if report.builds.is_empty() {
        let _ = writeln!(output, "  {}", dim("No builds found."));
        return output;
    }

    let mut table = create_table();
    table.set_header(create_cyan_header(&[
        "Version", "Started", "Duration", "Status", "Job", "Build", "Tests", "Link",
    ]));
    for row in &report.builds {
        let mut cells = vec![Cell::new(row.version.as_deref().unwrap_or("-"))];
        cells.extend(build_cells(row));
        table.add_row(cells);
    }
    let _ = writeln!(output, "{table}");

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{BuildStatus, TestSummary};
    use chrono::Utc;
    use indexmap::IndexMap;

    fn row(version: Option<&str>) -> BuildRow {
        BuildRow {
            id: "ocs-ci/42".to_string(),
            job: "ocs-ci".to_string(),
            job_url: "https://jenkins.example.com/job/ocs-ci".to_string(),
            build: 42,
            build_url: "https://jenkins.example.com/job/ocs-ci/42".to_string(),
            status: BuildStatus::Success,
            timestamp: 1_630_000_000_000,
            duration_ms: Some(5_400_000),
            test_summary: Some(TestSummary::new(3, 2, 125)),
            test_results_url: None,
            version: version.map(str::to_string),
        }
    }

    #[test]
    fn test_render_version_report() {
        let report = VersionReport {
            product: "ocs".to_string(),
            collected_at: Utc::now(),
            total_versions: 1,
            total_builds: 1,
            versions: IndexMap::from([(
                "4.9.0-123".to_string(),
                vec![row(Some("4.9.0-123"))],
            )]),
        };

        let rendered = render_version_report(&report);
        assert!(rendered.contains("4.9.0-123"));
        assert!(rendered.contains("ocs-ci"));
        assert!(rendered.contains("#42"));
        assert!(rendered.contains("120 pass / 3 fail / 2 skip"));
    }

    #[test]
    fn test_render_empty_version_report() {
        let report = VersionReport {
            product: "ocs".to_string(),
            collected_at: Utc::now(),
            total_versions: 0,
            total_builds: 0,
            versions: IndexMap::new(),
        };
        assert!(render_version_report(&report).contains("No versioned builds"));
    }

    #[test]
    fn test_render_builds_report_shows_missing_version_as_dash() {
        let report = BuildsReport {
            product: "ocs".to_string(),
            collected_at: Utc::now(),
            total_builds: 1,
            builds: vec![row(None)],
        };

        let rendered = render_builds_report(&report);
        assert!(rendered.contains("Latest Build Status"));
        assert!(rendered.contains('-'));
        assert!(rendered.contains("2021-08-26"));
    }
}
