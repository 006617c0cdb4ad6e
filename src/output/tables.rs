use chrono::{DateTime, Utc};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::report::{BuildStatus, TestSummary};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn status_cell(status: BuildStatus) -> Cell {
    let color = match status {
        BuildStatus::Success => TableColor::Green,
        BuildStatus::Failure => TableColor::Red,
        BuildStatus::Unstable => TableColor::Yellow,
        BuildStatus::Running => TableColor::Cyan,
        BuildStatus::Aborted | BuildStatus::Unknown => TableColor::Grey,
    };
    Cell::new(status.to_string()).fg(color)
}

pub fn timestamp_cell(timestamp_ms: i64) -> Cell {
    let text = DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map_or_else(|| "?".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
    Cell::new(text)
}

/// Finished builds show their duration; running builds show elapsed time
/// since start.
pub fn duration_cell(duration_ms: Option<i64>, timestamp_ms: i64) -> Cell {
    match duration_ms {
        Some(ms) => Cell::new(format_duration(ms)),
        None => {
            let elapsed = Utc::now().timestamp_millis() - timestamp_ms;
            Cell::new(format!("{} so far", format_duration(elapsed.max(0)))).fg(TableColor::Cyan)
        }
    }
}

pub fn tests_cell(summary: Option<TestSummary>) -> Cell {
    let Some(summary) = summary else {
        return Cell::new("-").fg(TableColor::Grey);
    };
    let text = format!(
        "{} pass / {} fail / {} skip",
        summary.pass, summary.fail, summary.skip
    );
    if summary.fail > 0 {
        Cell::new(text).fg(TableColor::Red)
    } else if summary.skip > 0 {
        Cell::new(text).fg(TableColor::Yellow)
    } else {
        Cell::new(text).fg(TableColor::Green)
    }
}

pub fn format_duration(ms: i64) -> String {
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(45_000), "45s");
        assert_eq!(format_duration(90_000), "1m");
        assert_eq!(format_duration(5_400_000), "1h 30m");
        assert_eq!(format_duration(0), "0s");
    }
}
