use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use microvision::client::{self, AnalyzeOptions, DEFAULT_SERVER};
use microvision::config::Config;
use microvision::interpret::Section;
use microvision::AppState;

#[derive(Parser)]
#[command(name = "microvision", about = "AI-assisted microscopy analysis")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the analysis server
    Serve {
        /// Address to bind, overrides MICROVISION_ADDR
        #[arg(long)]
        addr: Option<String>,
    },
    /// Upload an image to a running server and show the result
    Analyze {
        /// Microscopy image to analyze
        image: PathBuf,
        /// Base URL of the server
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,
        /// Expand a section (confidence, organism, features, uncertainty)
        #[arg(long = "open", value_name = "SECTION")]
        open: Vec<Section>,
        /// Expand every section
        #[arg(long)]
        all: bool,
        /// Print the model's raw text instead of sections
        #[arg(long)]
        raw: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("microvision=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { addr }) => serve(addr).await,
        Some(Commands::Analyze {
            image,
            server,
            open,
            all,
            raw,
        }) => {
            let options = AnalyzeOptions {
                server,
                open,
                all,
                raw,
            };
            client::run_analyze(&image, &options).await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

async fn serve(addr_override: Option<String>) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let addr = addr_override.unwrap_or_else(|| config.addr.clone());
    tracing::debug!(?config, "loaded configuration");

    let state = Arc::new(AppState::from_config(&config));
    let app = microvision::app(state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        provider = ?config.provider,
        model = %config.model,
        encoding = %config.encoding,
        "MicroVision AI listening on http://{addr}"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
