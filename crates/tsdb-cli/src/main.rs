#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
//! `tsdb` CLI - append, query, and export rows from a tsdb-core database.
//!
//! Usage:
//!   `tsdb append ./data readings --timestamp 1 --value 98.6`
//!   `tsdb locate ./data readings --timestamp 1000`
//!   `tsdb reduce ./data readings --start 0 --end 10000 --dt 50`
//!   `tsdb export ./data readings --out readings.csv`

mod config;
mod export;
mod record;

use clap::{Parser, Subcommand};
use config::CliConfig;
use record::Reading;
use std::path::PathBuf;
use tsdb_core::Database;

#[derive(Parser)]
#[command(name = "tsdb")]
#[command(author, version, about = "CLI for the tsdb-core time-series store")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append one reading to a table.
    Append {
        /// Path to the database directory.
        db: PathBuf,
        /// Table name.
        table: String,
        /// Row timestamp. Must exceed every timestamp already in the table.
        #[arg(long)]
        timestamp: u64,
        /// Row value.
        #[arg(long)]
        value: f64,
        /// Optional tag recorded alongside the value.
        #[arg(long, default_value_t = 0)]
        tag: u32,
    },

    /// Print the index of the first row at or after a timestamp.
    Locate {
        /// Path to the database directory.
        db: PathBuf,
        /// Table name.
        table: String,
        /// Query timestamp.
        #[arg(long)]
        timestamp: u64,
    },

    /// Print a thinned view of rows in a timestamp range.
    Reduce {
        /// Path to the database directory.
        db: PathBuf,
        /// Table name.
        table: String,
        /// Start of the timestamp range, inclusive.
        #[arg(long)]
        start: u64,
        /// End of the timestamp range, inclusive.
        #[arg(long)]
        end: u64,
        /// Minimum timestamp gap between consecutive returned rows.
        #[arg(long)]
        dt: u64,
    },

    /// Export every row of a table to a CSV file.
    Export {
        /// Path to the database directory.
        db: PathBuf,
        /// Table name.
        table: String,
        /// Destination CSV path.
        #[arg(long)]
        out: PathBuf,
    },

    /// Print the row count of a table.
    Info {
        /// Path to the database directory.
        db: PathBuf,
        /// Table name.
        table: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = CliConfig::load()?;
    let options = config.storage.into();

    match cli.command {
        Commands::Append {
            db,
            table,
            timestamp,
            value,
            tag,
        } => {
            let database = Database::with_options(db, options);
            let handle = database.get_table::<Reading>(&table);
            let mut handle = handle.lock();
            let size_before = handle.size();
            handle.append(timestamp, Reading { tag, value });
            if handle.size() == size_before {
                println!("rejected: timestamp {timestamp} does not exceed the table's last timestamp");
            } else {
                println!("appended row {index}", index = size_before);
            }
            drop(handle);
            database.sync();
        }

        Commands::Locate { db, table, timestamp } => {
            let database = Database::with_options(db, options);
            let handle = database.get_table::<Reading>(&table);
            let handle = handle.lock();
            if handle.size() == 0 {
                println!("table is empty");
            } else {
                println!("{index}", index = handle.locate(timestamp));
            }
        }

        Commands::Reduce { db, table, start, end, dt } => {
            let database = Database::with_options(db, options);
            let handle = database.get_table::<Reading>(&table);
            let handle = handle.lock();
            if handle.size() == 0 {
                println!("table is empty");
            } else {
                for entry in handle.reduce(start, end, dt) {
                    println!("{}\t{}\t{}", entry.timestamp, entry.value.tag, entry.value.value);
                }
            }
        }

        Commands::Export { db, table, out } => {
            let database = Database::with_options(db, options);
            let handle = database.get_table::<Reading>(&table);
            let handle = handle.lock();
            export::write_csv(&handle, &out)?;
            println!("wrote {count} rows to {out:?}", count = handle.size());
        }

        Commands::Info { db, table } => {
            let database = Database::with_options(db, options);
            let handle = database.get_table::<Reading>(&table);
            println!("{size}", size = handle.lock().size());
        }
    }

    Ok(())
}
