use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use searchlink::{Client, ClientConfig, ClientOption};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::bulk::{BulkOptions, DocumentSource};
use commands::scroll::ScrollOptions;

#[derive(Parser, Debug)]
#[command(name = "searchlink")]
#[command(about = "Searchlink CLI - talk to an Elasticsearch-compatible cluster")]
#[command(version)]
struct Cli {
    /// Cluster nodes (comma-separated base URLs)
    #[arg(long, env = "SEARCHLINK_HOSTS", value_delimiter = ',', global = true)]
    hosts: Vec<String>,

    /// TOML client configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch a document by id
    Get {
        index: String,
        doc_type: String,
        id: String,

        /// Routing value
        #[arg(long)]
        routing: Option<String>,
    },

    /// Run a search
    Search {
        /// Index to search (all indices when omitted)
        #[arg(short, long)]
        index: Option<String>,

        /// Document type to search
        #[arg(short = 't', long)]
        doc_type: Option<String>,

        /// Search body
        #[arg(short, long, default_value = r#"{"query": {"match_all": {}}}"#)]
        query: String,

        /// Routing value
        #[arg(long)]
        routing: Option<String>,
    },

    /// Index a single document
    Index {
        index: String,
        doc_type: String,

        /// Document JSON
        body: String,

        /// Document id (assigned by the cluster when omitted)
        #[arg(long)]
        id: Option<String>,

        /// Routing value
        #[arg(long)]
        routing: Option<String>,
    },

    /// Delete a document by id
    Delete {
        index: String,
        doc_type: String,
        id: String,

        /// Routing value
        #[arg(long)]
        routing: Option<String>,
    },

    /// Load a JSONL file through the bulk API
    Bulk {
        /// Target index
        #[arg(short, long)]
        index: String,

        /// Document type
        #[arg(short = 't', long, default_value = "_doc")]
        doc_type: String,

        /// JSONL input file (stdin when omitted)
        #[arg(short = 'f', long)]
        input: Option<PathBuf>,

        /// Operations per bulk request
        #[arg(long, default_value = "100")]
        batch_size: usize,

        /// Top-level field holding the document id
        #[arg(long)]
        id_field: Option<String>,

        /// Use create instead of index operations
        #[arg(long)]
        create: bool,

        /// Disable the progress line
        #[arg(long)]
        no_progress: bool,
    },

    /// Export every hit of a search as JSON lines
    Scroll {
        /// Index to page through
        #[arg(short, long)]
        index: String,

        /// Document type
        #[arg(short = 't', long, default_value = "_doc")]
        doc_type: String,

        /// Search body
        #[arg(short, long, default_value = r#"{"query": {"match_all": {}}}"#)]
        query: String,

        /// Hits per page
        #[arg(long, default_value = "100")]
        size: usize,

        /// Keep-alive of the server-side cursor
        #[arg(long, default_value = "1m")]
        ttl: String,

        /// Use the legacy scan search type
        #[arg(long)]
        scan: bool,

        /// Primary shards of the index (scan page size divisor)
        #[arg(long, default_value = "0")]
        shards: usize,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );
    let registry = tracing_subscriber::registry().with(filter);
    // logs go to stderr, stdout carries command output
    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

/// Build the client configuration from the config file and command line flags
fn client_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ClientConfig::new(Vec::<String>::new()),
    };
    if !cli.hosts.is_empty() {
        config.hosts = cli.hosts.clone();
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config = config.with_options([ClientOption::Timeout(Duration::from_millis(timeout_ms))]);
    }
    Ok(config)
}

/// Fail the process when any document of a bulk load was not indexed
fn ensure_all_indexed(failed: usize) -> Result<()> {
    if failed > 0 {
        anyhow::bail!("{} documents failed to index", failed);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = client_config(&cli)?;
    let mut client = Client::with_config(config)
        .context("Failed to create client, pass --hosts, SEARCHLINK_HOSTS or --config")?;
    tracing::debug!(hosts = ?client.hosts(), "Client ready");

    match cli.command {
        Commands::Get {
            index,
            doc_type,
            id,
            routing,
        } => {
            commands::document::run_get(&mut client, &index, &doc_type, &id, routing.as_deref())?;
        }
        Commands::Search {
            index,
            doc_type,
            query,
            routing,
        } => {
            commands::document::run_search(
                &mut client,
                index.as_deref(),
                doc_type.as_deref(),
                &query,
                routing.as_deref(),
            )?;
        }
        Commands::Index {
            index,
            doc_type,
            body,
            id,
            routing,
        } => {
            commands::document::run_index(
                &mut client,
                &index,
                &doc_type,
                id.as_deref(),
                &body,
                routing.as_deref(),
            )?;
        }
        Commands::Delete {
            index,
            doc_type,
            id,
            routing,
        } => {
            commands::document::run_delete(&mut client, &index, &doc_type, &id, routing.as_deref())?;
        }
        Commands::Bulk {
            index,
            doc_type,
            input,
            batch_size,
            id_field,
            create,
            no_progress,
        } => {
            let source = match input {
                Some(path) => DocumentSource::FromFile(path),
                None => DocumentSource::FromStdin,
            };
            let options = BulkOptions {
                index,
                doc_type,
                batch_size,
                id_field,
                create,
                no_progress,
            };
            let failed = commands::bulk::run_bulk(client.into_shared(), source, &options)?;
            ensure_all_indexed(failed)?;
        }
        Commands::Scroll {
            index,
            doc_type,
            query,
            size,
            ttl,
            scan,
            shards,
            output,
        } => {
            let options = ScrollOptions {
                index,
                doc_type,
                query,
                size,
                ttl,
                scan,
                shards,
                output,
            };
            commands::scroll::run_scroll(client.into_shared(), &options)?;
        }
    }

    Ok(())
}
