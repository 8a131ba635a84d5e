//! CLI command tests

use std::io::Write;

use clap::Parser;
use tempfile::TempDir;

use crate::cli::{Cli, Commands};
use crate::commands;

use outlay_core::db::Database;
use outlay_core::models::TransactionStatus;

fn temp_db_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("test.db")
}

#[test]
fn parse_import_command() {
    let cli = Cli::parse_from(["outlay", "import", "--file", "statement.csv", "--no-match"]);
    match cli.command {
        Commands::Import { file, no_match } => {
            assert_eq!(file, std::path::PathBuf::from("statement.csv"));
            assert!(no_match);
        }
        _ => panic!("expected import command"),
    }
}

#[test]
fn parse_serve_defaults() {
    let cli = Cli::parse_from(["outlay", "serve"]);
    match cli.command {
        Commands::Serve { host, port, .. } => {
            assert_eq!(host, "127.0.0.1");
            assert_eq!(port, 8081);
        }
        _ => panic!("expected serve command"),
    }
}

#[test]
fn init_creates_database_with_categories() {
    let dir = TempDir::new().unwrap();
    let db_path = temp_db_path(&dir);

    commands::cmd_init(&db_path).unwrap();

    let db = Database::open(db_path.to_str().unwrap()).unwrap();
    assert_eq!(db.list_categories().unwrap().len(), 10);
}

#[test]
fn import_saves_and_matches() {
    let dir = TempDir::new().unwrap();
    let db_path = temp_db_path(&dir);
    commands::cmd_init(&db_path).unwrap();

    let csv_path = dir.path().join("statement.csv");
    let mut file = std::fs::File::create(&csv_path).unwrap();
    writeln!(file, "Date,Description,Amount").unwrap();
    writeln!(file, "01/15/2024,Coffee Shop,4.50").unwrap();
    writeln!(file, "01/16/2024,Bookstore,20.00").unwrap();

    commands::cmd_import(&db_path, &csv_path, true).unwrap();

    let db = Database::open(db_path.to_str().unwrap()).unwrap();
    assert_eq!(db.count_transactions(None).unwrap(), 2);
    assert_eq!(
        db.count_transactions(Some(TransactionStatus::Unmatched))
            .unwrap(),
        2
    );

    // Re-import is a no-op thanks to duplicate detection
    commands::cmd_import(&db_path, &csv_path, true).unwrap();
    assert_eq!(db.count_transactions(None).unwrap(), 2);
}

#[test]
fn status_runs_on_empty_database() {
    let dir = TempDir::new().unwrap();
    let db_path = temp_db_path(&dir);
    commands::cmd_init(&db_path).unwrap();

    commands::cmd_status(&db_path).unwrap();
}
