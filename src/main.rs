//! scanreport - Per-directory storage usage reports from an indexed scan.
//!
//! Usage:
//!   scanreport PATH OUTPUT                 Report PATH alone as pages
//!   scanreport PATH OUTPUT --depth 3       Report PATH and two levels below
//!   scanreport PATH - --format csv         CSV to stdout
//!   scanreport --help                      Show help

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use scanreport_core::{ConnectionConfig, FailurePolicy, IndexPath, TraversalOrder, WalkConfig};
use scanreport_query::ElasticGateway;
use scanreport_render::{Detail, OutputFormat, ReportEmitter, emitter_for};
use scanreport_walk::run_walk;

#[derive(Parser)]
#[command(
    name = "scanreport",
    version,
    about = "Per-directory storage usage reports from a search-indexed scan",
    long_about = "scanreport reads the latest completed scan covering PATH from the search \
                  backend and writes one report per directory: children, users, file types \
                  and access heat.\n\n\
                  Connection settings come from a TOML file (es_hosts, es_api_key, index, \
                  status_index)."
)]
struct Cli {
    /// Directory to report on
    path: String,

    /// Output file, `-` for stdout
    output: PathBuf,

    /// Connection config file (defaults to <config dir>/scanreport/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of directory levels to report, PATH being level one
    #[arg(short, long, default_value = "1")]
    depth: u32,

    /// Output format: pages, csv or json
    #[arg(short, long, default_value = "pages", value_parser = OutputFormat::from_str)]
    format: OutputFormat,

    /// Only children, users and heat for each directory
    #[arg(short, long)]
    brief: bool,

    /// Visiting order: lifo or fifo
    #[arg(long, default_value = "lifo", value_parser = TraversalOrder::from_str)]
    order: TraversalOrder,

    /// Aggregate each tree level on this many threads (0 = sequential)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,

    /// Leave out directories whose queries fail instead of stopping
    #[arg(long)]
    skip_failed: bool,

    /// Log filter, e.g. `debug` or `scanreport_walk=debug` (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let connection = load_connection(cli.config.as_deref())?;
    let walk_config = WalkConfig::builder()
        .root(IndexPath::new(&cli.path))
        .max_depth(cli.depth)
        .index(connection.index.clone())
        .status_index(connection.status_index.clone())
        .order(cli.order)
        .failure_policy(if cli.skip_failed {
            FailurePolicy::SkipNode
        } else {
            FailurePolicy::Abort
        })
        .threads(cli.threads)
        .build()
        .context("Invalid walk configuration")?;

    let gateway = ElasticGateway::new(&connection);
    let mut emitter = open_emitter(&cli.output, cli.format, Detail::from_brief(cli.brief))?;

    eprintln!("Reporting on {} ({} level(s))...", walk_config.root, walk_config.max_depth);

    let walked = run_walk(&gateway, &gateway, &walk_config, |report| emitter.emit(&report));
    // Keep whatever was written before a failure.
    emitter.finish().context("Failed to flush report output")?;
    let (snapshot, stats) = walked.with_context(|| format!("Report on {} failed", cli.path))?;

    eprintln!(
        "Reported {} director{} from scan {} ({} unindexed bucket(s), {} warning(s), {} failed)",
        stats.nodes_reported,
        if stats.nodes_reported == 1 { "y" } else { "ies" },
        snapshot.scan_id,
        stats.unindexed_buckets,
        stats.warnings,
        stats.nodes_failed,
    );

    Ok(())
}

/// Install the stderr subscriber: `--log-level`, then `RUST_LOG`, then `warn`.
fn init_tracing(log_level: Option<&str>) {
    let filter = log_level
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    let stderr_is_tty = io::IsTerminal::is_terminal(&io::stderr());
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(stderr_is_tty)
                .without_time()
                .compact(),
        )
        .init();
}

/// Load connection settings from `path` or the default location.
fn load_connection(path: Option<&Path>) -> Result<ConnectionConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => ConnectionConfig::default_path()
            .ok_or_else(|| eyre!("No --config given and no user config directory found"))?,
    };
    let config = ConnectionConfig::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    debug!(path = %path.display(), hosts = config.es_hosts.len(), "loaded connection config");
    Ok(config)
}

/// Open the emitter for `output`, where `-` is stdout.
fn open_emitter(
    output: &Path,
    format: OutputFormat,
    detail: Detail,
) -> Result<Box<dyn ReportEmitter>> {
    if output == Path::new("-") {
        return Ok(emitter_for(format, detail, io::stdout()));
    }
    let file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    Ok(emitter_for(format, detail, file))
}
