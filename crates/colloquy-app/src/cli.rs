use std::path::PathBuf;

use clap::Parser;

/// Colloquy: interactive chat over a token-level language model.
#[derive(Parser, Debug)]
#[command(name = "colloquy", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error, or a filter directive).
    #[arg(long)]
    pub log_level: Option<String>,

    /// System prompt, replacing the configured one.
    #[arg(short = 's', long)]
    pub system: Option<String>,

    /// Print each reply once it is complete instead of streaming it.
    #[arg(long)]
    pub no_stream: bool,

    /// Let the model reason before answering.
    #[arg(long)]
    pub think: bool,
}

pub fn parse() -> Args {
    Args::parse()
}
