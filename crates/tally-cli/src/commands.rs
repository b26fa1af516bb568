use super::args::{Cli, Commands, ConfigCommand, RecordsCommand};
use super::handlers;
use crate::context::ExecutionContext;
use crate::types::LogLevel;
use anyhow::Result;
use tally_runtime::resolve_data_path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.log_level);

    let data_dir = resolve_data_path(cli.data_dir.as_deref())?;
    tracing::debug!(data_dir = %data_dir.display(), format = %cli.format, "starting");
    let ctx = ExecutionContext::new(data_dir, cli.format);

    match cli.command {
        Commands::Replay {
            file,
            stream,
            no_store,
            flush,
        } => handlers::replay::handle(&ctx, &file, stream, !no_store, flush),

        Commands::Monitor {
            stream,
            interval_ms,
            no_store,
            flush,
        } => handlers::monitor::handle(&ctx, stream, interval_ms, !no_store, flush),

        Commands::Records { command } => match command {
            RecordsCommand::List { stream, limit } => {
                handlers::records::list(&ctx, stream, limit)
            }
            RecordsCommand::Day { date, stream } => handlers::records::day(&ctx, date, stream),
            RecordsCommand::Dates { stream } => handlers::records::dates(&ctx, stream),
            RecordsCommand::Stats { date, stream } => handlers::records::stats(&ctx, date, stream),
            RecordsCommand::Vacuum => handlers::records::vacuum(&ctx),
        },

        Commands::Config { command } => match command {
            ConfigCommand::Show => handlers::config::show(&ctx),
            ConfigCommand::Init { force } => handlers::config::init(&ctx, force),
        },
    }
}

/// Diagnostics go to stderr so stdout stays parseable.
fn init_logging(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
