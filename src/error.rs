use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildLensError {
    #[error("Jenkins API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Jenkins API error (status {status}) after {retries} retries")]
    ApiAfterRetries { status: u16, retries: u32 },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Product \"{0}\" not found in configuration")]
    UnknownProduct(String),

    #[error("All {jobs} jobs for product \"{product}\" failed to fetch")]
    AllJobsFailed { product: String, jobs: usize },

    #[error("Malformed build data: {0}")]
    MalformedBuild(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::DeError),
}

pub type Result<T> = std::result::Result<T, BuildLensError>;
