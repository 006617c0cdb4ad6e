use std::cmp::Reverse;
use std::collections::HashMap;

use indexmap::IndexMap;

use crate::report::BuildRow;

use super::links;
use super::types::BuildRecord;
use super::version::VersionRule;

/// Flatten the merged version map into render-ready rows, keeping the merge
/// step's ordering for both keys and builds.
pub fn project(
    merged: IndexMap<String, Vec<&BuildRecord>>,
    base_url: &str,
) -> IndexMap<String, Vec<BuildRow>> {
    merged
        .into_iter()
        .map(|(version, builds)| {
            let rows = builds
                .into_iter()
                .map(|build| build_row(build, Some(version.clone()), base_url))
                .collect();
            (version, rows)
        })
        .collect()
}

/// Rows for the all-builds view, newest first.
///
/// Each build's version comes from its own job's rule. A prefix filter drops
/// non-matching builds, and unversioned builds along with them; without a
/// filter, unversioned builds stay in with an absent version field.
pub fn flatten(
    records: &[BuildRecord],
    rules: &HashMap<String, VersionRule>,
    base_url: &str,
    version_filter: Option<&str>,
) -> Vec<BuildRow> {
    let mut rows: Vec<BuildRow> = records
        .iter()
        .filter_map(|build| {
            let version = rules
                .get(&build.job)
                .and_then(|rule| rule.extract_version(build));
            if let Some(prefix) = version_filter {
                match &version {
                    Some(v) if v.starts_with(prefix) => {}
                    _ => return None,
                }
            }
            Some(build_row(build, version, base_url))
        })
        .collect();

    rows.sort_by_key(|row| Reverse(row.timestamp));
    rows
}

fn build_row(build: &BuildRecord, version: Option<String>, base_url: &str) -> BuildRow {
    let build_url = links::build_url(base_url, &build.job, build.number);
    let test_results_url = build
        .test_report_path
        .as_deref()
        .map(|path| links::test_report_url(&build_url, path));

    BuildRow {
        id: build.id(),
        job: build.job.clone(),
        job_url: links::job_url(base_url, &build.job),
        build: build.number,
        build_url,
        status: build.status,
        timestamp: build.timestamp,
        duration_ms: build.duration_ms,
        test_summary: build.test_summary,
        test_results_url,
        version,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JobConfig;
    use crate::report::{BuildStatus, TestSummary};

    const BASE: &str = "https://jenkins.example.com";

    fn record(job: &str, number: u64, timestamp: i64, image: Option<&str>) -> BuildRecord {
        BuildRecord {
            job: job.to_string(),
            number,
            timestamp,
            duration_ms: Some(1000),
            status: BuildStatus::Success,
            parameters: image
                .map(|value| {
                    HashMap::from([(
                        "OCS_REGISTRY_IMAGE".to_string(),
                        format!("quay.io/foo:{value}"),
                    )])
                })
                .unwrap_or_default(),
            test_summary: Some(TestSummary::new(3, 2, 125)),
            test_report_path: Some("testReport".to_string()),
        }
    }

    fn rules() -> HashMap<String, VersionRule> {
        let config = JobConfig {
            version_param: "OCS_REGISTRY_IMAGE".to_string(),
            version_regex: None,
            version_exclude: vec!["latest".to_string()],
        };
        HashMap::from([(
            "ocs-ci".to_string(),
            VersionRule::from_config("ocs-ci", &config).unwrap(),
        )])
    }

    #[test]
    fn test_build_row_carries_deep_links() {
        let build = record("ocs-ci", 42, 100, Some("4.9.0-123"));
        let row = build_row(&build, Some("4.9.0-123".to_string()), BASE);

        assert_eq!(row.id, "ocs-ci/42");
        assert_eq!(row.job_url, "https://jenkins.example.com/job/ocs-ci");
        assert_eq!(row.build_url, "https://jenkins.example.com/job/ocs-ci/42");
        assert_eq!(
            row.test_results_url.as_deref(),
            Some("https://jenkins.example.com/job/ocs-ci/42/testReport")
        );
        assert_eq!(row.test_summary.unwrap().pass, 120);
    }

    #[test]
    fn test_flatten_sorts_newest_first() {
        let records = vec![
            record("ocs-ci", 1, 100, Some("4.9.0-99")),
            record("ocs-ci", 2, 300, Some("4.9.0-100")),
            record("ocs-ci", 3, 200, None),
        ];
        let rows = flatten(&records, &rules(), BASE, None);

        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["ocs-ci/2", "ocs-ci/3", "ocs-ci/1"]);
        // unversioned build stays in with an absent version
        assert_eq!(rows[1].version, None);
    }

    #[test]
    fn test_flatten_filter_drops_unversioned_builds() {
        let records = vec![
            record("ocs-ci", 1, 100, Some("4.9.0-99")),
            record("ocs-ci", 2, 200, Some("4.10.0-1")),
            record("ocs-ci", 3, 300, None),
        ];
        let rows = flatten(&records, &rules(), BASE, Some("4.9"));

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "ocs-ci/1");
    }

    #[test]
    fn test_excluded_version_appears_only_in_flat_view() {
        // "latest" is excluded from version-grouped output but the build
        // itself still shows up in the all-builds projection
        let records = vec![record("ocs-ci", 1, 100, Some("latest"))];
        let rows = flatten(&records, &rules(), BASE, None);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].version, None);
    }

    #[test]
    fn test_project_preserves_merge_order() {
        let build_a = record("ocs-ci", 1, 200, Some("4.9.0-100"));
        let build_b = record("ocs-ci", 2, 100, Some("4.9.0-99"));
        let merged: IndexMap<String, Vec<&BuildRecord>> = IndexMap::from([
            ("4.9.0-100".to_string(), vec![&build_a]),
            ("4.9.0-99".to_string(), vec![&build_b]),
        ]);

        let projected = project(merged, BASE);
        let keys: Vec<&String> = projected.keys().collect();
        assert_eq!(keys, vec!["4.9.0-100", "4.9.0-99"]);
        assert_eq!(projected["4.9.0-100"][0].version.as_deref(), Some("4.9.0-100"));
    }
}
