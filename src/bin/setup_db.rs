use std::path::PathBuf;

use clap::Parser;

use customer_console::config::DbConfig;
use customer_console::setup::{self, BATCH_SIZE, LoaderOptions, MAX_BATCH_SIZE, SetupPaths};

#[derive(Parser, Debug)]
#[command(
    name = "setup_db",
    about = "Recreate the customer tables and bulk load them from CSV"
)]
struct Args {
    /// CSV file with one customer per row.
    #[arg(long, default_value = "users.csv")]
    users_csv: PathBuf,

    /// CSV file with one order per row; loaded after the customers.
    #[arg(long, default_value = "orders.csv")]
    orders_csv: PathBuf,

    /// Rows per INSERT statement.
    #[arg(long, default_value_t = BATCH_SIZE, value_parser = parse_batch_size)]
    batch_size: usize,
}

fn parse_batch_size(value: &str) -> Result<usize, String> {
    let size: usize = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a whole number"))?;
    if (1..=MAX_BATCH_SIZE).contains(&size) {
        Ok(size)
    } else {
        Err(format!("must be between 1 and {MAX_BATCH_SIZE}"))
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    let config = DbConfig::from_env();
    let paths = SetupPaths {
        users_csv: args.users_csv,
        orders_csv: args.orders_csv,
    };
    let options = LoaderOptions {
        batch_size: args.batch_size,
    };

    log::info!("setting up database {config}");

    match setup::setup_database(&config, &paths, &options).await {
        Ok(report) => {
            log::info!(
                "database setup completed: {} customers, {} orders",
                report.customers.rows_inserted,
                report.orders.rows_inserted
            );
        }
        Err(err) => {
            log::error!("database setup failed: {err}");
            std::process::exit(1);
        }
    }
}
