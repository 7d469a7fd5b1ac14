//! `lavanderia`: maintenance CLI for the laundry store.
//!
//! Usage:
//!   lavanderia [--config <file>] [--data-dir <dir>] <command>
//!
//! Works directly on the redb file; run it while nothing else writes.

mod commands;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use laundry::LaundryService;
use lavanderia_core::ServiceConfig;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "lavanderia", about = "Laundry store maintenance")]
struct Cli {
    /// TOML config file. Flags below override its values.
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Directory holding laundry.redb.
    #[arg(long = "data-dir", global = true)]
    data_dir: Option<PathBuf>,

    /// Explicit database file.
    #[arg(long = "db", global = true)]
    db: Option<PathBuf>,

    /// Key namespace.
    #[arg(long = "namespace", global = true)]
    namespace: Option<String>,

    /// Operator recorded in history.
    #[arg(long = "operator", global = true)]
    operator: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Seed default settings, main branch and admin user.
    Init,

    /// Report broken references. Exits non-zero if any are found.
    Verify,

    /// Recompute id counters from the stored records.
    FixCounters,

    /// Write a JSON backup.
    Export {
        /// Output file (default: stdout).
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,
    },

    /// Overwrite collections from a JSON backup.
    Import {
        file: PathBuf,
        /// Recompute counters after importing.
        #[arg(long = "fix-counters")]
        fix_counters: bool,
    },

    /// Export the history log as CSV.
    History {
        #[arg(long)]
        client: Option<u64>,
        /// Action label, e.g. `entrega`.
        #[arg(long)]
        action: Option<String>,
        #[arg(long = "by")]
        operator: Option<String>,
        /// First day, YYYY-MM-DD.
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day, YYYY-MM-DD.
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,
    },

    /// Print dashboard figures as JSON.
    Stats,

    /// Simulate an RFID scan.
    Scan,
}

impl Cli {
    fn service_config(&self) -> anyhow::Result<ServiceConfig> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                ServiceConfig::load(path)?
            }
            None => ServiceConfig::default(),
        };
        if let Some(dir) = &self.data_dir {
            config.data_dir = Some(dir.clone());
        }
        if let Some(db) = &self.db {
            config.db_path = Some(db.clone());
        }
        if let Some(ns) = &self.namespace {
            config.namespace = ns.clone();
        }
        if let Some(op) = &self.operator {
            config.operator = op.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.service_config()?;
    let svc = LaundryService::open(&config)?;

    match cli.command {
        Commands::Init => commands::init(&svc)?,
        Commands::Verify => commands::verify(&svc)?,
        Commands::FixCounters => commands::fix_counters(&svc)?,
        Commands::Export { out } => commands::export(&svc, out.as_deref())?,
        Commands::Import { file, fix_counters } => commands::import(&svc, &file, fix_counters)?,
        Commands::History {
            client,
            action,
            operator,
            from,
            to,
            out,
        } => {
            let filter = commands::history_filter(client, action.as_deref(), operator, from, to)?;
            commands::history(&svc, &filter, out.as_deref())?;
        }
        Commands::Stats => commands::stats(&svc)?,
        Commands::Scan => println!("{}", svc.scan_rfid()?),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_flag_is_validated() {
        let cli = Cli::try_parse_from(["lavanderia", "--namespace", "a:b", "verify"]).unwrap();
        let err = cli.service_config().unwrap_err();
        assert!(err.to_string().contains("invalid namespace"));

        let cli = Cli::try_parse_from(["lavanderia", "--namespace", "sucursal2", "stats"]).unwrap();
        assert_eq!(cli.service_config().unwrap().namespace, "sucursal2");
    }
}
