use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::auth::Token;
use crate::config::{Config, OutputFormat};
use crate::output;
use crate::providers::JenkinsProvider;

#[derive(Parser)]
#[command(name = "buildlens")]
#[command(author, version, about = "Jenkins build & version dashboard", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./buildlens.{toml,json,yaml})
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write the report as JSON to this path instead of rendering tables
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Print the report as JSON on stdout
    #[arg(short, long, global = true, default_value_t = false)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    /// Jenkins API token
    #[arg(short, long, global = true, env = "BUILDLENS_TOKEN")]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Version-grouped development build status for a product
    Versions {
        /// Product name as defined in the configuration
        product: String,

        /// Only include versions starting with this prefix
        /// (disables the dev-build cap)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Flat listing of recent builds across all of a product's jobs
    Builds {
        /// Product name as defined in the configuration
        product: String,

        /// Only include builds whose version starts with this prefix
        #[arg(short, long)]
        filter: Option<String>,
    },
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        let token = self.token.as_deref().map(Token::from);
        let provider = JenkinsProvider::new(&config, token)?;

        match &self.command {
            Commands::Versions { product, filter } => {
                info!("Collecting version report for product: {product}");
                let report = provider
                    .version_report(&config, product, filter.as_deref())
                    .await?;
                self.emit(&config, &report, output::print_version_report)
            }
            Commands::Builds { product, filter } => {
                info!("Collecting build report for product: {product}");
                let report = provider
                    .builds_report(&config, product, filter.as_deref())
                    .await?;
                self.emit(&config, &report, output::print_builds_report)
            }
        }
    }

    fn emit<T: Serialize>(&self, config: &Config, report: &T, print: impl Fn(&T)) -> Result<()> {
        let wants_json = self.json || config.output.format == OutputFormat::Json;

        if self.output.is_none() && !wants_json {
            print(report);
            return Ok(());
        }

        let json_output = if self.pretty || config.output.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };

        if let Some(output_path) = &self.output {
            std::fs::write(output_path, json_output)?;
            info!("Report written to: {}", output_path.display());
        } else {
            println!("{json_output}");
        }

        Ok(())
    }
}
