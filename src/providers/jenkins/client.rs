use std::sync::Arc;
use std::time::Duration;

use log::warn;
use reqwest::Client;
use tokio::sync::Semaphore;
use url::Url;

use crate::auth::Token;
use crate::error::{BuildLensError, Result};

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_SECONDS: u64 = 5;
const MAX_CONCURRENT_REQUESTS: usize = 8;

/// Fields requested per build; mirrors what the normalizer consumes.
const BUILD_TREE: &str = "tree=builds[number,building,duration,result,timestamp,\
actions[parameters[name,value],failCount,skipCount,totalCount,urlName]]";

pub struct JenkinsClient {
    client: Client,
    api_base: Url,
    token: Option<Token>,
    semaphore: Arc<Semaphore>,
}

impl JenkinsClient {
    pub fn new(api_base: &str, token: Option<Token>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("buildlens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BuildLensError::Config(format!("Failed to create HTTP client: {e}")))?;

        let api_base = Url::parse(api_base)
            .map_err(|e| BuildLensError::Config(format!("Invalid Jenkins URL: {e}")))?;

        Ok(Self {
            client,
            api_base,
            token,
            semaphore: Arc::new(Semaphore::new(MAX_CONCURRENT_REQUESTS)),
        })
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    fn build_listing_url(&self, job: &str) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| BuildLensError::Config("Jenkins URL cannot be a base".to_string()))?
            .extend(["job", job, "api", "json"]);
        url.set_query(Some(BUILD_TREE));
        Ok(url)
    }

    /// Fetch the raw build listing for one job.
    ///
    /// Retries transient failures (connectivity, 429, 5xx) a few times before
    /// giving up; any persistent failure is the caller's per-job failure to
    /// handle, not a reason to abort other jobs.
    pub async fn fetch_job_builds(&self, job: &str) -> Result<String> {
        let url = self.build_listing_url(job)?;

        // One permit per logical request keeps the fan-out polite
        let _permit = self.semaphore.acquire().await.unwrap();

        let mut retry_count = 0;
        loop {
            let request = self.auth_request(self.client.get(url.clone()));

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() || e.is_request() => {
                    if retry_count >= MAX_RETRIES {
                        return Err(e.into());
                    }
                    warn!(
                        "Network error fetching job {job} ({e}), retrying in {RETRY_DELAY_SECONDS}s ({}/{MAX_RETRIES})...",
                        retry_count + 1
                    );
                    tokio::time::sleep(Duration::from_secs(RETRY_DELAY_SECONDS)).await;
                    retry_count += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let status = response.status();

            if status == 429 || status.is_server_error() {
                if retry_count >= MAX_RETRIES {
                    return Err(BuildLensError::ApiAfterRetries {
                        status: status.as_u16(),
                        retries: MAX_RETRIES,
                    });
                }
                warn!(
                    "Jenkins API error for job {job} (status {status}), retrying in {RETRY_DELAY_SECONDS}s ({}/{MAX_RETRIES})...",
                    retry_count + 1
                );
                tokio::time::sleep(Duration::from_secs(RETRY_DELAY_SECONDS)).await;
                retry_count += 1;
                continue;
            }

            if !status.is_success() {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read error response".to_string());
                return Err(BuildLensError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            return Ok(response.text().await?);
        }
    }
}
