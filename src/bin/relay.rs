//! relay: relaygate CLI
//!
//! Routes a single prompt through the configured providers, or inspects
//! their usage counters. Counters only persist between invocations with the
//! redis store backend.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use relaygate::GenerationRequest;
use relaygate::config::{Config, Secrets};

/// relaygate CLI
#[derive(Parser)]
#[command(name = "relay")]
#[command(version)]
#[command(about = "Failover router for text-generation providers")]
struct Args {
    /// Config file (default: ~/.relaygate/config.toml, then /etc/relaygate/config.toml)
    #[arg(short, long, env = "RELAYGATE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a completion and print the result as JSON
    Generate {
        /// Prompt text (or omit to read from stdin)
        prompt: Option<String>,
        /// Use only this provider (no cache, no fallback)
        #[arg(short, long)]
        provider: Option<String>,
        #[arg(long)]
        temperature: Option<f32>,
        #[arg(long)]
        max_tokens: Option<u32>,
        #[arg(long)]
        top_p: Option<f32>,
        #[arg(long)]
        top_k: Option<u32>,
    },

    /// Print usage counters as JSON
    Stats {
        /// Single provider (default: all, in priority order)
        provider: Option<String>,
    },

    /// List providers in priority order with their current usability
    Providers,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    let secrets = Secrets::load()?;
    let router = config.router(&secrets).await?;

    match args.command {
        Command::Generate {
            prompt,
            provider,
            temperature,
            max_tokens,
            top_p,
            top_k,
        } => {
            let request = GenerationRequest {
                prompt: resolve_prompt(prompt)?,
                temperature,
                max_tokens,
                top_p,
                top_k,
                forced_provider: provider,
            };
            let result = router.route(&request).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Command::Stats { provider: Some(name) } => {
            let stats = router.provider_stats(&name).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }

        Command::Stats { provider: None } => {
            let stats = router.stats().await;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }

        Command::Providers => {
            for provider in router.providers() {
                let status = if provider.is_usable().await {
                    "usable"
                } else {
                    "unusable"
                };
                println!(
                    "{} (limit {}/min): {status}",
                    provider.name(),
                    provider.rate_limit()
                );
            }
        }
    }

    Ok(())
}

/// Resolve the prompt from an optional CLI argument and/or stdin.
///
/// - arg only → arg
/// - stdin only → stdin
/// - both → `"{arg}\n\n{stdin}"`
/// - neither → error
fn resolve_prompt(arg: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    let stdin_text = if io::stdin().is_terminal() {
        None
    } else {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        let trimmed = buf.trim().to_string();
        (!trimmed.is_empty()).then_some(trimmed)
    };

    match (arg, stdin_text) {
        (Some(a), Some(s)) => Ok(format!("{a}\n\n{s}")),
        (Some(a), None) => Ok(a),
        (None, Some(s)) => Ok(s),
        (None, None) => {
            Err("generate: no prompt provided (pass text as argument or via stdin)".into())
        }
    }
}
