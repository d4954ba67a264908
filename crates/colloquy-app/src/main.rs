mod cli;
mod driver;
mod signal;

use std::io;
use std::sync::Arc;

use colloquy_chat::{ChatSession, EchoCodec, GenerationParams, InterruptFlag, ThinkMarkers};
use colloquy_common::{ColloquyError, Result};
use colloquy_config::ColloquyConfig;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::driver::Driver;
use crate::signal::GeneratingGuard;

fn init_logging(args: &cli::Args, config: &ColloquyConfig) {
    let fallback = if config.logging.debug {
        "debug"
    } else {
        config.logging.level.as_directive()
    };
    let directive = args.log_level.as_deref().unwrap_or(fallback);
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                directive
                    .parse()
                    .unwrap_or_else(|_| LevelFilter::INFO.into()),
            ),
        )
        .init();
}

/// The backend named by `[model] name`. Only `echo` ships.
fn build_codec(config: &ColloquyConfig, params: &GenerationParams) -> Result<EchoCodec> {
    match config.model.name.as_str() {
        "echo" => Ok(
            EchoCodec::new(params.format.clone(), config.model.context_size as usize)
                .with_special(&config.prompt.think_open)
                .with_special(&config.prompt.think_close),
        ),
        other => Err(ColloquyError::Other(format!(
            "unknown model backend {other:?} (available: \"echo\")"
        ))),
    }
}

fn run(args: &cli::Args, mut config: ColloquyConfig) -> Result<()> {
    if let Some(system) = &args.system {
        config.prompt.system_prompt = system.clone();
    }
    if args.think {
        config.generation.thinking = true;
    }
    if config.logging.debug {
        tracing::debug!(config = %colloquy_config::config_to_json(&config), "Effective config");
    }

    let params = GenerationParams::from(&config);
    let codec = build_codec(&config, &params)?;

    let interrupt = InterruptFlag::new();
    let generating = GeneratingGuard::new();
    if let Err(e) = signal::install(interrupt.clone(), generating.clone()) {
        tracing::warn!("Failed to install Ctrl+C handler: {e}");
    }

    let session = ChatSession::new(Arc::new(codec), params)?
        .with_interrupt(Arc::new(interrupt.clone()));
    tracing::info!(
        "Session {} ready ({} of {} tokens available)",
        session.id(),
        session.tokens_available(),
        session.capacity()
    );

    let mut driver = Driver::new(session, config.display.clone(), io::stdin().lock(), io::stdout())
        .with_markers(ThinkMarkers::from(&config.prompt))
        .with_streaming(!args.no_stream)
        .with_interrupt(interrupt, generating);
    driver.run()
}

fn main() {
    let args = cli::parse();

    let loaded = colloquy_config::load_config_from(args.config.as_deref());
    let config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => ColloquyConfig::default(),
    };
    init_logging(&args, &config);

    tracing::info!("Colloquy v{} starting...", env!("CARGO_PKG_VERSION"));
    match loaded {
        Ok(_) => tracing::info!("Config loaded (model: {})", config.model.name),
        Err(e) => tracing::warn!("Config load failed, using defaults: {e}"),
    }

    if let Err(e) = run(&args, config) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
