mod cli;
mod commands;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use booksum_core::Config;

use crate::cli::{CliArgs, Command};

fn load_config(args: &CliArgs) -> Config {
    booksum_core::config::load_dotenv();
    let mut config = Config::for_profile(&args.profile);
    if let Some(kind) = args.tokenizer {
        config.tokenizer = kind;
    }
    config
}

fn emit(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = load_config(&args);
    config.log_summary();

    match &args.command {
        Command::Text { file, output } => {
            let summary = commands::summarize_text_file(&config, file).await?;
            emit(output.as_deref(), &summary)?;
        }
        Command::Book { file, output } => {
            let summary = commands::summarize_book_file(&config, file).await?;
            emit(output.as_deref(), &summary)?;
        }
        Command::Chunks {
            file,
            max_tokens,
            subdivide,
        } => {
            let counter = config
                .tokenizer
                .build()
                .context("failed to load the tokenizer")?;
            let report = commands::chunk_report(counter, file, *max_tokens, *subdivide)?;
            print!("{report}");
        }
        Command::Config => {
            println!("{}", commands::config_report(&config)?);
        }
    }

    Ok(())
}
