mod commands;
mod output;
mod source;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tables")]
#[command(version, about = "Tabular data validation against Table Schema", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a CSV file against a schema
    Validate {
        /// Path to the CSV data file
        data: String,

        /// Path to the schema descriptor (JSON, YAML or TOML)
        #[arg(short, long)]
        schema: String,

        /// Path to a checklist descriptor (JSON, YAML or TOML)
        #[arg(short, long)]
        checklist: Option<String>,

        /// Path to a dialect descriptor (JSON, YAML or TOML)
        #[arg(short, long)]
        dialect: Option<String>,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Stop after this many errors (0 disables the limit)
        #[arg(long, default_value_t = tables_core::DEFAULT_LIMIT_ERRORS)]
        limit_errors: usize,

        /// Stop after this many data rows
        #[arg(long)]
        limit_rows: Option<usize>,

        /// Only report these error types or #tags
        #[arg(long, value_delimiter = ',')]
        pick_errors: Vec<String>,

        /// Do not report these error types or #tags
        #[arg(long, value_delimiter = ',')]
        skip_errors: Vec<String>,

        /// Match schema fields to header labels by name
        #[arg(long)]
        schema_sync: bool,

        /// Compare header labels case-sensitively (overrides the dialect)
        #[arg(long, action = ArgAction::Set)]
        header_case: Option<bool>,

        /// Field delimiter of the CSV file
        #[arg(long, default_value_t = ',')]
        delimiter: char,
    },

    /// Check a schema descriptor without reading any data
    Check {
        /// Path to the schema descriptor (JSON, YAML or TOML)
        schema: String,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(log_level))
        .init();

    // Execute command
    match cli.command {
        Commands::Validate {
            data,
            schema,
            checklist,
            dialect,
            format,
            limit_errors,
            limit_rows,
            pick_errors,
            skip_errors,
            schema_sync,
            header_case,
            delimiter,
        } => {
            let options = commands::validate::ValidateOptions {
                checklist,
                dialect,
                limit_errors,
                limit_rows,
                pick_errors,
                skip_errors,
                schema_sync,
                header_case,
                delimiter,
            };
            commands::validate::execute(&data, &schema, &options, &format).await
        }

        Commands::Check { schema, format } => commands::check::execute(&schema, &format).await,
    }
}
