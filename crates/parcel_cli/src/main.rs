//! Parcel tracker command-line harness.
//!
//! # Responsibility
//! - Expose `ParcelService` use cases over a local SQLite file.
//! - Keep output plain and line-oriented for scripting.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use parcel_core::{
    default_log_level, init_logging, open_db, ClientId, Parcel, ParcelNumber, ParcelService,
    ParcelStore,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "parcel")]
#[command(version)]
#[command(about = "Register and track parcels in a local SQLite database")]
struct Cli {
    /// Path to the database file
    #[arg(short, long, global = true, default_value = "tracker.db")]
    db: PathBuf,

    /// Log level (trace|debug|info|warn|error); defaults by build mode
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new parcel
    Register {
        #[arg(short, long)]
        client: ClientId,
        #[arg(short, long)]
        address: String,
    },
    /// Show one parcel
    Show { number: ParcelNumber },
    /// List every parcel of a client
    List {
        #[arg(short, long)]
        client: ClientId,
    },
    /// Advance a parcel to its next status
    NextStatus { number: ParcelNumber },
    /// Change the address of a registered parcel
    SetAddress {
        number: ParcelNumber,
        address: String,
    },
    /// Delete a registered parcel
    Delete { number: ParcelNumber },
    /// Print core linkage info
    Ping,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).context("failed to initialize logging")?;
    }

    if let Commands::Ping = cli.command {
        println!("parcel_core ping={}", parcel_core::ping());
        println!("parcel_core version={}", parcel_core::core_version());
        return Ok(());
    }

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;
    let service = ParcelService::new(ParcelStore::new(&conn));

    match cli.command {
        Commands::Register { client, address } => {
            let parcel = service.register(client, address)?;
            println!("{}", format_parcel(&parcel));
        }
        Commands::Show { number } => {
            let parcel = service.parcel(number)?;
            println!("{}", format_parcel(&parcel));
        }
        Commands::List { client } => {
            for parcel in service.client_parcels(client)? {
                println!("{}", format_parcel(&parcel));
            }
        }
        Commands::NextStatus { number } => {
            let status = service.next_status(number)?;
            println!("parcel {number} status={status}");
        }
        Commands::SetAddress { number, address } => {
            service.change_address(number, &address)?;
            println!("parcel {number} address={address}");
        }
        Commands::Delete { number } => {
            service.delete(number)?;
            println!("parcel {number} deleted");
        }
        Commands::Ping => {}
    }

    Ok(())
}

fn format_parcel(parcel: &Parcel) -> String {
    let number = parcel
        .number
        .map_or_else(|| "-".to_string(), |number| number.to_string());
    format!(
        "number={number} client={} status={} address={:?} created_at={}",
        parcel.client, parcel.status, parcel.address, parcel.created_at
    )
}
