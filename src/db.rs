use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::info;

use crate::errors::AppResult;

pub struct DatabaseContext {
    pub connection: Connection,
    pub path: PathBuf,
}

pub fn bootstrap<P: AsRef<Path>>(data_dir: P, database_file: &str) -> AppResult<DatabaseContext> {
    let data_dir = data_dir.as_ref();
    std::fs::create_dir_all(data_dir)?;
    let db_path = data_dir.join(database_file);
    let connection = Connection::open(&db_path)?;
    apply_pragmas(&connection)?;
    run_migrations(&connection)?;

    info!(
        target: "database_bootstrap",
        path = %db_path.display(),
        "database context established"
    );

    Ok(DatabaseContext {
        connection,
        path: db_path,
    })
}

fn apply_pragmas(connection: &Connection) -> AppResult<()> {
    connection.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA foreign_keys = ON;
        "#,
    )?;
    Ok(())
}

fn run_migrations(connection: &Connection) -> AppResult<()> {
    connection.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS import_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            city TEXT NOT NULL,
            processed_count INTEGER NOT NULL DEFAULT 0,
            completed_types TEXT NOT NULL DEFAULT '[]',
            next_page_tokens TEXT NOT NULL DEFAULT '{}',
            status TEXT NOT NULL DEFAULT 'in_progress'
                CHECK (status IN ('in_progress', 'completed', 'failed')),
            started_at TEXT NOT NULL DEFAULT (DATETIME('now')),
            last_processed_at TEXT NOT NULL DEFAULT (DATETIME('now'))
        );

        CREATE TABLE IF NOT EXISTS workspaces (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            google_place_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            address TEXT,
            lat REAL NOT NULL,
            lng REAL NOT NULL,
            amenities TEXT NOT NULL DEFAULT '{}',
            attributes TEXT NOT NULL DEFAULT '{}',
            opening_hours TEXT NOT NULL DEFAULT '[]',
            photo_urls TEXT NOT NULL DEFAULT '[]',
            city TEXT NOT NULL,
            is_public INTEGER NOT NULL DEFAULT 1 CHECK (is_public IN (0, 1)),
            created_at TEXT NOT NULL DEFAULT (DATETIME('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_city_status
            ON import_sessions(city, status);
        CREATE INDEX IF NOT EXISTS idx_workspaces_place_id
            ON workspaces(google_place_id);
        "#,
    )?;
    Ok(())
}
