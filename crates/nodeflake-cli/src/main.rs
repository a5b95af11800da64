mod commands;
mod config;
mod telemetry;

use clap::Parser;
use config::{AppConfig, CliArgs};
use telemetry::init_telemetry;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = AppConfig::try_from(args)?;

    init_telemetry()?;

    let stdout = std::io::stdout();
    commands::run(&config, &mut stdout.lock())
}
