use anyhow::Result;
use clap::{Parser, Subcommand};

/// lunchmenu - school lunch menus as JSON and embeddable widgets
#[derive(Parser)]
#[command(name = "lunchmenu")]
#[command(about = "Serve the Nutrislice school menu as JSON and HTML widgets", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Server host address (overrides config file)
        #[arg(long)]
        host: Option<String>,

        /// Server port (overrides config file)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Fetch a view once and print the JSON the API would return
    Show {
        /// week, remainder, today or tomorrow
        #[arg(long)]
        view: Option<String>,

        /// Anchor date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = lunchmenu::Config::load(cli.config.clone())?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    lunchmenu::observability::init_observability(
        "lunchmenu",
        env!("CARGO_PKG_VERSION"),
        &config.observability.log_level,
    )?;

    match cli.command {
        Commands::Serve { host, port } => lunchmenu::cli::serve(config, host, port).await,
        Commands::Show { view, date } => lunchmenu::cli::show(config, view, date).await,
    }
}
