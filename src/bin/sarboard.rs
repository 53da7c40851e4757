//! CLI entry point for the `sarboard` dashboard host.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use sar_crossfilter::cli::commands::{self, FilterArgs};
use sar_crossfilter::view::{DashboardConfig, SortOrder};
use sar_crossfilter::{XfError, XfResult, DEFAULT_PAGE_SIZE};

#[derive(Parser)]
#[command(
    name = "sarboard",
    about = "Cross-filtered search-and-rescue incident dashboard, rendered as text or JSON"
)]
struct Cli {
    /// Output format: "text" (default) or "json"
    #[arg(long, default_value = "text")]
    format: String,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,

    /// Rows per table page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Hide zero-count chart entries
    #[arg(long)]
    hide_empty: bool,

    /// Table sort column: SourceAgency, Date, Category or Environment
    #[arg(long, default_value = "Date")]
    sort: String,

    /// Sort the table descending
    #[arg(long)]
    desc: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every view with no filters
    Summary {
        /// Path to the incidents CSV
        file: PathBuf,
    },
    /// Apply filters, then show every view
    Filter {
        /// Path to the incidents CSV
        file: PathBuf,
        /// Comma-separated categories to select
        #[arg(long)]
        category: Option<String>,
        /// Comma-separated environments to select
        #[arg(long)]
        environment: Option<String>,
        /// First month, YYYY-MM (inclusive)
        #[arg(long)]
        from: Option<String>,
        /// Last month, YYYY-MM (inclusive)
        #[arg(long)]
        to: Option<String>,
        /// Map area: south,west,north,east
        #[arg(long, allow_hyphen_values = true)]
        area: Option<String>,
        /// Zero-based table page
        #[arg(long, default_value = "0")]
        page: usize,
    },
}

fn split_list(value: Option<String>) -> Vec<String> {
    value
        .map(|s| {
            s.split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn run(cli: Cli) -> XfResult<()> {
    let json = cli.format == "json";
    let config = DashboardConfig {
        page_size: cli.page_size,
        keep_empty_groups: !cli.hide_empty,
        sort_column: cli.sort,
        sort_order: if cli.desc {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        },
    };

    match cli.command {
        Commands::Summary { file } => commands::cmd_summary(&file, config, json),
        Commands::Filter {
            file,
            category,
            environment,
            from,
            to,
            area,
            page,
        } => {
            let args = FilterArgs {
                categories: split_list(category),
                environments: split_list(environment),
                from: from.as_deref().map(commands::parse_month).transpose()?,
                to: to.as_deref().map(commands::parse_month).transpose()?,
                area: area.as_deref().map(commands::parse_bounds).transpose()?,
                page,
            };
            commands::cmd_filter(&file, config, &args, json)
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        let code = match &e {
            XfError::Io(_) | XfError::Csv(_) => 1,
            XfError::Ingest { .. } => 2,
            XfError::InvalidFilter(_) => 3,
            _ => 5,
        };
        process::exit(code);
    }
}
