use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use vigil_core::VigilConfig;
use vigil_review::github::GitHubClient;
use vigil_review::llm::LlmClient;
use vigil_review::pipeline::ReviewPipeline;
use vigil_webhook::AppState;

#[derive(Parser)]
#[command(
    name = "vigil",
    version,
    about = "AI-powered pull request reviewer",
    long_about = "Vigil reviews pull requests as they are opened or updated.\n\n\
                   It listens for GitHub webhook deliveries, sends each changed file's\n\
                   diff to a language model, and posts the resulting feedback back onto\n\
                   the pull request — per-line comments when the model anchors its\n\
                   findings, or a single overview comment when nothing file-specific\n\
                   was warranted.\n\n\
                   Examples:\n  \
                     vigil                         Serve using vigil.toml and env vars\n  \
                     vigil --config team.toml      Serve with an explicit config file\n  \
                     vigil --port 8080             Override the listen port\n\n\
                   Environment:\n  \
                     GITHUB_TOKEN        GitHub personal access token\n  \
                     VIGIL_LLM_API_KEY   API key for the review model\n  \
                     RUST_LOG            Log filter (default: info)"
)]
struct Cli {
    /// Path to configuration file (default: vigil.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the listen port
    #[arg(long)]
    port: Option<u16>,

    /// Override the bind address
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => VigilConfig::from_file(path).into_diagnostic()?,
        None => {
            let default_path = std::path::Path::new("vigil.toml");
            if default_path.exists() {
                VigilConfig::from_file(default_path).into_diagnostic()?
            } else {
                VigilConfig::default()
            }
        }
    };
    config.apply_env();
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(bind) = &cli.bind {
        config.server.bind = bind.clone();
    }

    let github = Arc::new(GitHubClient::new(&config.github).into_diagnostic()?);
    let llm = Arc::new(LlmClient::new(&config.llm).into_diagnostic()?);

    info!(model = %config.llm.model, "starting vigil");

    let pipeline = ReviewPipeline::new(github.clone(), llm, github);
    let state = Arc::new(AppState { pipeline });

    vigil_webhook::serve(&config.server.bind, config.server.port, state)
        .await
        .into_diagnostic()?;

    Ok(())
}
