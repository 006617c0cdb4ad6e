use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Final status of a Jenkins build.
///
/// `Running` is derived from the `building` flag and always takes precedence
/// over whatever the `result` field claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    Running,
    Success,
    Failure,
    Aborted,
    Unstable,
    Unknown,
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Running => "running",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Aborted => "aborted",
            Self::Unstable => "unstable",
            Self::Unknown => "unknown",
        };
        f.write_str(text)
    }
}

/// Test result counts attached to a build.
///
/// `pass` is always derived as `total - fail - skip`; the upstream value is
/// never trusted directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    pub pass: i64,
    pub fail: i64,
    pub skip: i64,
    pub total: i64,
}

impl TestSummary {
    pub fn new(fail: i64, skip: i64, total: i64) -> Self {
        Self {
            pass: total - fail - skip,
            fail,
            skip,
            total,
        }
    }
}

/// A render-ready row for one build.
///
/// Carries everything needed to deep-link back to Jenkins so nothing
/// downstream has to re-derive URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildRow {
    /// `job/number`, unique across the whole report
    pub id: String,
    pub job: String,
    pub job_url: String,
    pub build: u64,
    pub build_url: String,
    pub status: BuildStatus,
    /// Epoch milliseconds of build start
    pub timestamp: i64,
    /// Absent while the build is still running
    pub duration_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_summary: Option<TestSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_results_url: Option<String>,
    /// Full extracted version string, absent for unversioned builds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// The version-grouped view of a product.
///
/// Map insertion order is presentation order: version keys sorted by their
/// most recently started build, newest first.
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionReport {
    pub product: String,
    pub collected_at: DateTime<Utc>,
    pub total_versions: usize,
    pub total_builds: usize,
    pub versions: IndexMap<String, Vec<BuildRow>>,
}

/// The flat all-builds view of a product.
#[derive(Debug, Serialize, Deserialize)]
pub struct BuildsReport {
    pub product: String,
    pub collected_at: DateTime<Utc>,
    pub total_builds: usize,
    pub builds: Vec<BuildRow>,
}
