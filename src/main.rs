use clap::{Parser, Subcommand};
use log::warn;
use std::path::PathBuf;
use std::process::ExitCode;

use shadowgit_gateway::audit::AuditLogger;
use shadowgit_gateway::config::Config;
use shadowgit_gateway::error::AppResult;
use shadowgit_gateway::error_translation::OutcomeRenderer;
use shadowgit_gateway::{Checkpoint, CheckpointRequest, Gateway, GatewayRequest};

#[derive(Parser)]
#[command(name = "shadowgit-gateway")]
#[command(about = "Run vetted git commands against ShadowGit history stores")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/shadowgit-gateway/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured repositories
    Repos,
    /// Run a read-only git command
    Run {
        /// Repository name or absolute path
        repo: String,
        /// Git command without the leading "git", e.g. "log --oneline -5"
        command: String,
    },
    /// Commit all pending changes as one checkpoint
    Checkpoint {
        /// Repository name or absolute path
        repo: String,
        /// Short summary (at most 50 characters)
        #[arg(long)]
        title: String,
        /// Longer description
        #[arg(long)]
        message: Option<String>,
        /// Author name recorded on the commit
        #[arg(long)]
        author: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> AppResult<bool> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let mut gateway = Gateway::from_config(&config);
    if config.audit.enabled {
        let path = config.audit_log_path()?;
        match AuditLogger::with_path(&path) {
            Ok(audit) => gateway = gateway.with_audit(audit),
            Err(e) => warn!("Audit log disabled, cannot open {}: {}", path.display(), e),
        }
    }

    match cli.command {
        Commands::Repos => {
            let listing = gateway.list_repositories();
            if listing.is_empty() {
                println!("No repositories configured.");
            }
            for repo in listing {
                let status = if repo.available { "ok" } else { "unavailable" };
                println!("{}\t{}\t{}", repo.name, repo.path, status);
            }
            Ok(true)
        }
        Commands::Run { repo, command } => {
            let outcome = gateway
                .execute(GatewayRequest::external(repo, command))
                .await;
            println!("{}", OutcomeRenderer::render(&outcome));
            Ok(outcome.is_ok())
        }
        Commands::Checkpoint {
            repo,
            title,
            message,
            author,
        } => {
            let request = CheckpointRequest {
                repository: repo,
                title,
                message,
                author,
            };
            match Checkpoint::create(&gateway, request).await {
                Ok(outcome) => {
                    println!("{}", outcome);
                    Ok(true)
                }
                Err(e) => {
                    println!("{}", OutcomeRenderer::render_error(&e));
                    Ok(false)
                }
            }
        }
    }
}
