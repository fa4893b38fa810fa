//! Relata CLI - Command-line interface for typed entity relationships.

use clap::Parser;
use relata_cli::commands;
use relata_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> relata_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    init_tracing(&config.logging.level);

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    let formatter = Formatter::new(format, color_enabled);

    let mut store_config = config.store.clone();
    if let Some(path) = cli.database {
        store_config.path = path;
    }
    let mut store = commands::open_store(&store_config)?;

    match cli.command {
        Command::Relate(args) => commands::execute_relate(args, &mut store, &formatter)?,
        Command::Find(args) => commands::execute_find(args, &store, &formatter)?,
        Command::Show(args) => commands::execute_show(args, &store, &formatter)?,
        Command::List(args) => commands::execute_list(args, &store, &formatter)?,
        Command::Attr(args) => commands::execute_attr(args, &mut store, &formatter)?,
        Command::Unrelate(args) => commands::execute_unrelate(args, &mut store, &formatter)?,
        Command::Related(args) => commands::execute_related(args, &store, &formatter)?,
        Command::Forget(args) => commands::execute_forget(args, &mut store, &formatter)?,
        Command::Types(args) => commands::execute_types(args, &mut store, &formatter)?,
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides the configured level.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}
