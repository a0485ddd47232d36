//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `staffbook_core` linkage and print store stats for a database.
//!
//! Usage: `staffbook_cli [db-path [log-dir]]`. Without a db path an in-memory
//! database is used; without a log dir logging stays off. A relative log dir
//! is resolved against the working directory.

use staffbook_core::db::{open_db, open_db_in_memory};
use staffbook_core::{init_logging, LogConfig, RecordStore, SqliteBackend, StoreConfig};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("staffbook_core ping={}", staffbook_core::ping());
    println!("staffbook_core version={}", staffbook_core::core_version());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cwd = std::env::current_dir().unwrap_or_default();
    if let Some(config) = log_config_from_arg(args.get(1).map(String::as_str), &cwd) {
        match init_logging(&config) {
            Ok(()) => println!("logging dir={}", config.log_dir.display()),
            Err(err) => eprintln!("logging disabled: {err}"),
        }
    }

    let conn = match args.first().map(String::as_str) {
        Some(path) => open_db(path),
        None => open_db_in_memory(),
    };
    let conn = match conn {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("failed to open database: {err}");
            return ExitCode::FAILURE;
        }
    };
    let backend = match SqliteBackend::try_new(&conn) {
        Ok(backend) => backend,
        Err(err) => {
            eprintln!("failed to attach backend: {err}");
            return ExitCode::FAILURE;
        }
    };

    let store = RecordStore::open(backend, StoreConfig::default());
    if store.load_outcome().is_reset() {
        println!("store load=reset");
    }
    store.show_stats();
    let stats = store.get_stats();
    println!(
        "store persons={} active={} internal={} external={} evaluations={}",
        stats.total_persons,
        stats.active_persons,
        stats.internal_persons,
        stats.external_persons,
        stats.total_evaluations
    );
    ExitCode::SUCCESS
}

fn log_config_from_arg(arg: Option<&str>, cwd: &Path) -> Option<LogConfig> {
    let raw = arg.map(str::trim).filter(|raw| !raw.is_empty())?;
    let dir = Path::new(raw);
    if dir.is_absolute() {
        Some(LogConfig::new(dir))
    } else {
        Some(LogConfig::new(cwd.join(dir)))
    }
}
