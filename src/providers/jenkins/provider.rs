use std::collections::HashMap;

use chrono::Utc;
use futures::future::join_all;
use log::{info, warn};

use crate::auth::Token;
use crate::config::{Config, ProductConfig};
use crate::error::{BuildLensError, Result};
use crate::output::PhaseProgress;
use crate::report::{BuildsReport, VersionReport};

use super::aggregate;
use super::client::JenkinsClient;
use super::normalize::normalize;
use super::project;
use super::types::BuildRecord;
use super::version::VersionRule;

/// Jenkins build-history provider.
///
/// Fans out one fetch per configured job, tolerates partial failures, and
/// aggregates whatever succeeded into the product's version and build views.
pub struct JenkinsProvider {
    client: JenkinsClient,
    /// Base URL used for deep links; may differ from the API endpoint when
    /// requests go through a proxy
    link_base: String,
}

impl JenkinsProvider {
    pub fn new(config: &Config, token: Option<Token>) -> Result<Self> {
        let token = token.or_else(|| config.jenkins.token.as_deref().map(Token::from));
        let client = JenkinsClient::new(config.jenkins.api_url(), token)?;

        Ok(Self {
            client,
            link_base: config.jenkins.url.clone(),
        })
    }

    /// Fetch and normalize build listings for every job of a product,
    /// concurrently.
    ///
    /// Failed jobs are logged and excluded; the whole fetch fails only when
    /// no job succeeded. Output order and content are independent of fetch
    /// completion order because the merge step re-sorts canonically.
    async fn fetch_product_builds(
        &self,
        product: &str,
        settings: &ProductConfig,
    ) -> Result<Vec<(String, Vec<BuildRecord>)>> {
        info!(
            "Fetching build history for {} jobs of product {product}...",
            settings.jobs.len()
        );

        let fetches = settings.jobs.keys().map(|job| async move {
            let records = match self.client.fetch_job_builds(job).await {
                Ok(raw) => normalize(&raw, job),
                Err(e) => Err(e),
            };
            (job.clone(), records)
        });

        let results = join_all(fetches).await;

        let mut per_job = Vec::new();
        let mut failed = 0;
        for (job, result) in results {
            match result {
                Ok(records) => {
                    info!("Job {job}: {} builds", records.len());
                    per_job.push((job, records));
                }
                Err(e) => {
                    warn!("Job {job} excluded from aggregation: {e}");
                    failed += 1;
                }
            }
        }

        if per_job.is_empty() && failed > 0 {
            return Err(BuildLensError::AllJobsFailed {
                product: product.to_string(),
                jobs: failed,
            });
        }

        Ok(per_job)
    }

    /// Collect the version-grouped view for a product.
    ///
    /// An optional `version_filter` prefix narrows which full versions are
    /// included and disables dev-build truncation for that query.
    pub async fn version_report(
        &self,
        config: &Config,
        product: &str,
        version_filter: Option<&str>,
    ) -> Result<VersionReport> {
        let (name, settings) = config.product(product)?;
        let rules = compile_rules(settings)?;

        let progress = PhaseProgress::start_fetch();
        let per_job = self.fetch_product_builds(name, settings).await?;

        let progress = progress.finish_fetch_start_aggregate();

        let maps = per_job
            .iter()
            .map(|(job, records)| aggregate::bucket(records, &rules[job.as_str()], version_filter))
            .collect();
        let merged = aggregate::merge(maps, settings.max_dev_builds, version_filter.is_some());
        let versions = project::project(merged, &self.link_base);

        progress.finish_aggregate();

        Ok(VersionReport {
            product: name.to_string(),
            collected_at: Utc::now(),
            total_versions: versions.len(),
            total_builds: versions.values().map(Vec::len).sum(),
            versions,
        })
    }

    /// Collect the flat all-builds view for a product.
    pub async fn builds_report(
        &self,
        config: &Config,
        product: &str,
        version_filter: Option<&str>,
    ) -> Result<BuildsReport> {
        let (name, settings) = config.product(product)?;
        let rules = compile_rules(settings)?;

        let progress = PhaseProgress::start_fetch();
        let per_job = self.fetch_product_builds(name, settings).await?;

        let progress = progress.finish_fetch_start_aggregate();

        let records: Vec<BuildRecord> = per_job
            .into_iter()
            .flat_map(|(_, records)| records)
            .collect();
        let builds = project::flatten(&records, &rules, &self.link_base, version_filter);

        progress.finish_aggregate();

        Ok(BuildsReport {
            product: name.to_string(),
            collected_at: Utc::now(),
            total_builds: builds.len(),
            builds,
        })
    }
}

fn compile_rules(settings: &ProductConfig) -> Result<HashMap<String, VersionRule>> {
    settings
        .jobs
        .iter()
        .map(|(job, job_config)| {
            VersionRule::from_config(job, job_config).map(|rule| (job.clone(), rule))
        })
        .collect()
}
