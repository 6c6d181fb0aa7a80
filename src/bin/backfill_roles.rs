use std::{
    path::Path,
    process::exit,
    sync::{Arc, Mutex},
};

use clap::Parser;
use rusqlite::Connection;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use bill_tracker::{BillStore, Role, SQLiteBillStore, initialize_db};

/// Give every bill saved before roles existed the default role.
///
/// Safe to run more than once, later runs will not change any bills.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "DATABASE_PATH", default_value = "bill-tracker.db")]
    db_path: String,
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    if !Path::new(&args.db_path).is_file() {
        tracing::error!("No database found at {:?}", args.db_path);
        exit(1);
    }

    match backfill(&args.db_path) {
        Ok(modified) => {
            tracing::info!(
                "Set the role to \"{}\" on {modified} bill(s)",
                Role::LEGACY_DEFAULT
            );
        }
        Err(error) => {
            tracing::error!("Backfill failed: {error}");
            exit(1);
        }
    }
}

fn backfill(db_path: &str) -> Result<usize, Box<dyn std::error::Error>> {
    let connection = Connection::open(db_path)?;
    initialize_db(&connection)?;

    let store = SQLiteBillStore::new(Arc::new(Mutex::new(connection)));

    Ok(store.backfill_missing_roles()?)
}
