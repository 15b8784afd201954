use postboard::cli::{parse_args, run_cli_command};
use postboard::config::BoardConfig;

use color_eyre::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log to stderr so listings on stdout stay clean. `RUST_LOG` overrides the level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("postboard=info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let command = match parse_args(std::env::args()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };
    let config = BoardConfig::from_env();
    tracing::debug!(api_url = %config.api_url, page_size = config.page_size, "Loaded configuration");

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_cli_command(command, config))
}
