//! userstore CLI
//!
//! Command-line interface operating directly on a store directory.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use userstore::{Config, Context, IdAssignment, Store, StoreError, UserRecord};
use uuid::Uuid;

/// userstore CLI
#[derive(Parser, Debug)]
#[command(name = "userstore-cli")]
#[command(about = "CLI for the userstore embedded record store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./userstore_data")]
    data_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a record
    Create {
        /// Record name
        #[arg(short, long)]
        name: String,

        /// Data payload
        #[arg(short = 'D', long, default_value = "")]
        data: String,

        /// Permission bits
        #[arg(short, long, default_value = "0")]
        permissions: u16,

        /// Identifier to use; a random one is generated when omitted
        #[arg(long)]
        id: Option<Uuid>,
    },

    /// Read a record by id
    Read {
        /// The record id
        id: Uuid,
    },

    /// Delete a record by id
    Delete {
        /// The record id
        id: Uuid,
    },

    /// Search live records by substring
    Search {
        /// The substring to look for
        query: String,
    },

    /// Show store statistics
    Stats,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,userstore=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(StoreError::NotFound) => {
            eprintln!("not found");
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> userstore::Result<()> {
    let id_assignment = match &args.command {
        Commands::Create { id: None, .. } => IdAssignment::Generate,
        _ => IdAssignment::CallerSupplied,
    };

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .id_assignment(id_assignment)
        .build();

    let store = Store::open(config)?;
    let ctx = Context::background();

    match args.command {
        Commands::Create {
            name,
            data,
            permissions,
            id,
        } => {
            let record = UserRecord::new(id.unwrap_or_else(Uuid::nil), name, data, permissions);
            let id = store.create(&ctx, record)?;
            println!("{}", id);
        }
        Commands::Read { id } => {
            let record = store.read(&ctx, &id)?;
            print_record(&record);
        }
        Commands::Delete { id } => {
            store.delete(&ctx, &id)?;
            println!("deleted {}", id);
        }
        Commands::Search { query } => {
            let mut found = 0usize;
            for record in store.search(&ctx, query)? {
                print_record(&record);
                found += 1;
            }
            println!("{} match(es)", found);
        }
        Commands::Stats => {
            println!("data dir:       {}", store.data_dir().display());
            println!("live records:   {}", store.live_count());
            println!("heap records:   {}", store.record_count());
            println!("heap bytes:     {}", store.heap_len());
            println!("log replayed:   {}", store.recovery().entries_replayed);
            println!("log discarded:  {} bytes", store.recovery().discarded_bytes);
        }
    }

    store.close()
}

fn print_record(record: &UserRecord) {
    println!(
        "{}\tname={}\tdata={}\tpermissions={:#06x}",
        record.id,
        record.name_lossy(),
        record.data_lossy(),
        record.permissions
    );
}
