use chrono::NaiveDate;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Feed a recorded `time,count` CSV through the aggregator")]
    Replay {
        file: PathBuf,

        /// Stream tag for stored records (defaults to monitor.stream_id)
        #[arg(long)]
        stream: Option<String>,

        /// Print records without writing them to the store
        #[arg(long)]
        no_store: bool,

        /// Close the session still open at the end of the file
        #[arg(long)]
        flush: bool,
    },

    #[command(about = "Aggregate live counts read from stdin, one integer per line")]
    Monitor {
        #[arg(long)]
        stream: Option<String>,

        /// Pause between reads (defaults to monitor.sample_interval_ms)
        #[arg(long)]
        interval_ms: Option<u64>,

        #[arg(long)]
        no_store: bool,

        /// Close the open session when input ends or on Ctrl-C
        #[arg(long)]
        flush: bool,
    },

    #[command(about = "Browse stored session records")]
    Records {
        #[command(subcommand)]
        command: RecordsCommand,
    },

    #[command(about = "Show or create the configuration file")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
pub enum RecordsCommand {
    #[command(about = "Most recent records first")]
    List {
        #[arg(long)]
        stream: Option<String>,

        #[arg(long, default_value = "50")]
        limit: usize,
    },

    #[command(about = "Records that ended on a given day (UTC)")]
    Day {
        date: NaiveDate,

        #[arg(long)]
        stream: Option<String>,
    },

    #[command(about = "Days that have at least one record")]
    Dates {
        #[arg(long)]
        stream: Option<String>,
    },

    #[command(about = "Object and record totals for a day and overall")]
    Stats {
        /// Day to report (defaults to today, UTC)
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        stream: Option<String>,
    },

    #[command(about = "Compact the database file")]
    Vacuum,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Print the effective configuration")]
    Show,

    #[command(about = "Write a default config.toml")]
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
