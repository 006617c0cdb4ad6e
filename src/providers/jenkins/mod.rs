mod aggregate;
mod client;
mod links;
mod normalize;
mod project;
mod provider;
mod types;
mod version;

pub use provider::JenkinsProvider;
