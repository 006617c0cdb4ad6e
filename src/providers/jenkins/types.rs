use std::collections::HashMap;

use crate::report::{BuildStatus, TestSummary};

/// One Jenkins build, normalized from the job's build-listing response.
///
/// Owned by the fetch/normalize step; everything downstream only reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRecord {
    /// Originating job; not unique on its own
    pub job: String,
    /// Build number, unique within a job
    pub number: u64,
    /// Epoch milliseconds of build start
    pub timestamp: i64,
    /// Absent while the build is in progress
    pub duration_ms: Option<i64>,
    pub status: BuildStatus,
    /// Parameters supplied at trigger time
    pub parameters: HashMap<String, String>,
    /// Present only when a test-result action exists on the build
    pub test_summary: Option<TestSummary>,
    /// Relative path of the test report (the action's `urlName`)
    pub test_report_path: Option<String>,
}

impl BuildRecord {
    /// `job/number`, unique across the whole system.
    pub fn id(&self) -> String {
        format!("{}/{}", self.job, self.number)
    }
}

/// A build record annotated with its extracted version.
///
/// Builds with no extractable version never become one of these and stay out
/// of the version-grouped views.
#[derive(Debug)]
pub struct VersionedBuild<'a> {
    /// Full version string, kept verbatim for display and lookup
    pub version: String,
    /// The major.minor.patch bucket the full version coerces to
    pub line: String,
    pub record: &'a BuildRecord,
}
