/// Deep-link builders for the Jenkins web UI.
///
/// Rows carry finished URLs so the rendering layer never has to re-derive
/// them from job names and build numbers.
pub fn job_url(base_url: &str, job: &str) -> String {
    format!("{}/job/{job}", base_url.trim_end_matches('/'))
}

pub fn build_url(base_url: &str, job: &str, number: u64) -> String {
    format!("{}/{number}", job_url(base_url, job))
}

/// Test-report link, rooted at the build and using the action's `urlName`.
pub fn test_report_url(build_url: &str, url_name: &str) -> String {
    format!("{build_url}/{url_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_url() {
        assert_eq!(
            job_url("https://jenkins.example.com", "ocs-ci"),
            "https://jenkins.example.com/job/ocs-ci"
        );
    }

    #[test]
    fn test_job_url_trims_trailing_slash() {
        assert_eq!(
            job_url("https://jenkins.example.com/", "ocs-ci"),
            "https://jenkins.example.com/job/ocs-ci"
        );
    }

    #[test]
    fn test_build_url() {
        assert_eq!(
            build_url("https://jenkins.example.com", "ocs-ci", 42),
            "https://jenkins.example.com/job/ocs-ci/42"
        );
    }

    #[test]
    fn test_test_report_url() {
        assert_eq!(
            test_report_url("https://jenkins.example.com/job/ocs-ci/42", "testReport"),
            "https://jenkins.example.com/job/ocs-ci/42/testReport"
        );
    }
}
