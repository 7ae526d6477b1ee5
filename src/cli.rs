//! Command-line interface.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use console::style;
use tokio::sync::mpsc;

use likeflow::config::{load_settings, Settings};
use likeflow::transport::CsrfSource;
use likeflow::{ContentId, HttpLikeTransport, LikeEvent, LikeRegistry, LikeState};

#[derive(Parser)]
#[command(name = "likeflow", version, about = "Optimistic like toggling for portfolio sites")]
pub struct Cli {
    /// Config file (TOML). Without it, standard locations are searched.
    #[arg(long, global = true, env = "LIKEFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Site root, e.g. https://portfolio.example.com
    #[arg(long, global = true, env = "LIKEFLOW_BASE_URL")]
    pub base_url: Option<String>,

    /// Request timeout in seconds (at least 1)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Fixed CSRF token, overriding the configured source
    #[arg(long, global = true, env = "LIKEFLOW_CSRF_TOKEN", hide_env_values = true)]
    pub csrf_token: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Toggle the like on one content item
    Toggle {
        /// Content identifier
        id: String,
        /// The item is currently liked
        #[arg(long)]
        liked: bool,
        /// Currently displayed like count
        #[arg(long, default_value_t = 0)]
        count: u64,
    },
    /// Resolve the configured CSRF token and print it
    Csrf,
}

impl Cli {
    async fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = load_settings(self.config.as_deref()).await?;
        if let Some(ref base_url) = self.base_url {
            settings.base_url = base_url.clone();
        }
        if let Some(timeout) = self.timeout {
            settings.request_timeout = timeout;
        }
        if let Some(ref token) = self.csrf_token {
            settings.csrf = CsrfSource::Static {
                value: token.clone(),
            };
        }
        settings.validate()?;
        Ok(settings)
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = cli.settings().await?;
    match cli.command {
        Commands::Toggle { id, liked, count } => cmd_toggle(&settings, id, liked, count).await,
        Commands::Csrf => cmd_csrf(&settings).await,
    }
}

async fn cmd_toggle(
    settings: &Settings,
    id: String,
    liked: bool,
    count: u64,
) -> anyhow::Result<()> {
    let transport = HttpLikeTransport::from_settings(settings).await?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let registry = LikeRegistry::new(Arc::new(transport))
        .with_timeout(settings.request_timeout())
        .with_events(tx);

    let id = ContentId::new(id);
    registry.bind(id.clone(), liked, count).await;
    let result = registry.toggle(&id).await;

    while let Ok(event) = rx.try_recv() {
        print_event(&event);
    }

    result?;
    Ok(())
}

async fn cmd_csrf(settings: &Settings) -> anyhow::Result<()> {
    let transport = HttpLikeTransport::from_settings(settings).await?;
    match transport.current_csrf_token() {
        Some(token) => println!("{}", token),
        None => println!("{}", style("no CSRF token available").yellow()),
    }
    Ok(())
}

fn describe(state: &LikeState) -> String {
    let heart = if state.liked {
        style("liked").green().to_string()
    } else {
        style("not liked").dim().to_string()
    };
    format!("{} {}, {} likes", state.content_id, heart, state.count)
}

fn print_event(event: &LikeEvent) {
    match event {
        LikeEvent::Predicted(state) => {
            println!("{} {}", style("predicted ").cyan(), describe(state));
        }
        LikeEvent::Reconciled(state) => {
            println!("{} {}", style("confirmed ").green().bold(), describe(state));
        }
        LikeEvent::RolledBack { state, error } => {
            println!("{} {}", style("rolled back").red().bold(), describe(state));
            eprintln!("  {}", style(error).red());
        }
    }
}
