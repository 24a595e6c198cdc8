//! Hierarchy View CLI
//!
//! A command-line tool for browsing the resource hierarchy, its capacity
//! usage, logical groups and the service network graph.

mod client;
mod commands;
mod config;
mod output;
mod source;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{capacity, graph, groups, ratios, topology, ViewOptions};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use view_lib::view::ViewMode;

use crate::client::ApiClient;
use crate::config::CliConfig;
use crate::output::OutputFormat;
use crate::source::FileSource;

/// Hierarchy View CLI
#[derive(Parser)]
#[command(name = "hview")]
#[command(author, version, about = "CLI for Hierarchy View", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via HVIEW_API_URL env var)
    #[arg(long, env = "HVIEW_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    /// Dump Prometheus metrics to stderr on exit
    #[arg(long)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the parent/child topology
    Topology {
        /// Group by physical placement instead of namespaces
        #[arg(long)]
        physical: bool,

        /// Drill into a child (TYPE/NAME, or a NAME from the current view)
        #[arg(long, short)]
        drill: Option<String>,

        /// Read the snapshot from a JSON file instead of the API
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Show capacity usage weighted by a metric
    Capacity {
        /// Metric to size rows by (cpu, memory, storage)
        #[arg(long, short)]
        metric: Option<String>,

        /// Group by physical placement instead of namespaces
        #[arg(long)]
        physical: bool,

        /// Drill into a child (TYPE/NAME, or a NAME from the current view)
        #[arg(long, short)]
        drill: Option<String>,

        /// Read the snapshot from a JSON file instead of the API
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// List logical groups
    Groups {
        /// Sort key (name, pods, cpu, memory, storage, cost)
        #[arg(long, short)]
        sort: Option<String>,

        /// Sort in descending order
        #[arg(long)]
        desc: bool,
    },

    /// Show the network graph for a service and its neighbours
    Graph {
        /// Service to filter by (ALL shows the whole graph)
        #[arg(long, short)]
        service: Option<String>,

        /// List the services found on graph nodes instead
        #[arg(long)]
        services: bool,
    },

    /// Show allocation ratios for a saved snapshot
    Ratios {
        /// Snapshot JSON file
        #[arg(long)]
        file: PathBuf,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_target(false).with_writer(std::io::stderr)))
        .init();
}

fn dump_metrics() -> Result<()> {
    use prometheus::{Encoder, TextEncoder};

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .context("Failed to encode metrics")?;
    eprintln!("{}", String::from_utf8_lossy(&buffer));
    Ok(())
}

fn view_mode(physical: bool) -> ViewMode {
    if physical {
        ViewMode::Physical
    } else {
        ViewMode::Logical
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let config = CliConfig::load()?;
    let api_url = cli.api_url.clone().unwrap_or_else(|| config.api_url.clone());
    let format = cli.format.or_else(|| config.output_format()).unwrap_or_default();
    let controller_config = config.controller_config();
    let api = || ApiClient::new(&api_url, config.timeout());

    match cli.command {
        Commands::Topology { physical, drill, file } => {
            let options = ViewOptions {
                mode: view_mode(physical),
                drill,
            };
            match file {
                Some(path) => {
                    let source = FileSource::new(path);
                    topology::show_topology(source, options, controller_config, format).await?
                }
                None => topology::show_topology(api()?, options, controller_config, format).await?,
            }
        }
        Commands::Capacity {
            metric,
            physical,
            drill,
            file,
        } => {
            let metric = metric.unwrap_or_else(|| config.default_metric.clone());
            let options = ViewOptions {
                mode: view_mode(physical),
                drill,
            };
            match file {
                Some(path) => {
                    capacity::show_capacity(
                        FileSource::new(path),
                        &metric,
                        options,
                        controller_config,
                        format,
                    )
                    .await?
                }
                None => {
                    capacity::show_capacity(api()?, &metric, options, controller_config, format)
                        .await?
                }
            }
        }
        Commands::Groups { sort, desc } => {
            groups::list_groups(&api()?, sort.as_deref(), desc, &config.currency, format).await?;
        }
        Commands::Graph { service, services } => {
            graph::show_graph(&api()?, service.as_deref(), services, format).await?;
        }
        Commands::Ratios { file } => {
            ratios::show_ratios(&file, format).await?;
        }
    }

    if cli.metrics {
        dump_metrics()?;
    }

    Ok(())
}
