use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use tracing::{debug, info};

use crate::batch::NewWorkspace;
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "in_progress" => Ok(SessionStatus::InProgress),
            "completed" => Ok(SessionStatus::Completed),
            "failed" => Ok(SessionStatus::Failed),
            _ => Err(AppError::Config(format!("invalid session status: {value}"))),
        }
    }
}

/// The persisted progress record for one city's import effort.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSession {
    pub id: i64,
    pub city: String,
    pub processed_count: i64,
    pub completed_types: Vec<String>,
    /// Continuation tokens per category. Stored when the provider returns
    /// one; the single-page-per-category pass never consumes them.
    pub next_page_tokens: BTreeMap<String, String>,
    pub status: SessionStatus,
    pub last_processed_at: String,
}

#[derive(Clone)]
pub struct SessionStore {
    db: Arc<Mutex<Connection>>,
}

impl SessionStore {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    /// Returns the in-progress session for `city` when `resume` is set,
    /// otherwise starts a fresh session. City matching ignores case and
    /// surrounding whitespace; the stored string keeps the caller's spelling.
    pub fn get_or_create(&self, city: &str, resume: bool) -> AppResult<ImportSession> {
        let conn = self.db.lock();
        if resume {
            let existing = conn
                .query_row(
                    "SELECT id, city, processed_count, completed_types, next_page_tokens,
                            status, last_processed_at
                    FROM import_sessions
                    WHERE LOWER(TRIM(city)) = LOWER(TRIM(?1)) AND status = 'in_progress'
                    ORDER BY id DESC LIMIT 1",
                    [city],
                    parse_session,
                )
                .optional()?;
            if let Some(row) = existing {
                let session = row?;
                debug!(city, session_id = session.id, "resuming import session");
                return Ok(session);
            }
        }

        conn.execute(
            "INSERT INTO import_sessions (city) VALUES (TRIM(?1))",
            [city],
        )?;
        let id = conn.last_insert_rowid();
        info!(city, session_id = id, "created import session");
        self.fetch(&conn, id)
    }

    pub fn get(&self, id: i64) -> AppResult<ImportSession> {
        let conn = self.db.lock();
        self.fetch(&conn, id)
    }

    /// Snapshot of every previously imported external ID, across all cities.
    pub fn known_place_ids(&self) -> AppResult<HashSet<String>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare("SELECT google_place_id FROM workspaces")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(ids)
    }

    /// Inserts the category's records and advances the session's progress in
    /// a single transaction, so a crash can never leave the bookkeeping ahead
    /// of the data.
    pub fn complete_category(
        &self,
        session_id: i64,
        category: &str,
        records: &[NewWorkspace],
        next_page_token: Option<&str>,
    ) -> AppResult<usize> {
        let mut conn = self.db.lock();
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO workspaces
                    (google_place_id, name, description, address, lat, lng,
                     amenities, attributes, opening_hours, photo_urls, city, is_public)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.google_place_id,
                    record.name,
                    record.description,
                    record.address,
                    record.lat,
                    record.lng,
                    serde_json::to_string(&record.amenities)?,
                    serde_json::to_string(&record.attributes)?,
                    serde_json::to_string(&record.opening_hours)?,
                    serde_json::to_string(&record.photo_urls)?,
                    record.city,
                    record.is_public,
                ])?;
            }
        }

        let (mut completed_types, mut tokens): (Vec<String>, BTreeMap<String, String>) = {
            let (raw_types, raw_tokens): (String, String) = tx.query_row(
                "SELECT completed_types, next_page_tokens FROM import_sessions WHERE id = ?1",
                [session_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            (
                serde_json::from_str(&raw_types)?,
                serde_json::from_str(&raw_tokens)?,
            )
        };
        if !completed_types.iter().any(|done| done == category) {
            completed_types.push(category.to_string());
        }
        if let Some(token) = next_page_token {
            tokens.insert(category.to_string(), token.to_string());
        }

        tx.execute(
            "UPDATE import_sessions
            SET processed_count = processed_count + ?2,
                completed_types = ?3,
                next_page_tokens = ?4,
                last_processed_at = DATETIME('now')
            WHERE id = ?1",
            params![
                session_id,
                records.len() as i64,
                serde_json::to_string(&completed_types)?,
                serde_json::to_string(&tokens)?,
            ],
        )?;
        tx.commit()?;

        info!(
            session_id,
            category,
            inserted = records.len(),
            "category completed"
        );
        Ok(records.len())
    }

    pub fn mark_completed(&self, session_id: i64) -> AppResult<ImportSession> {
        let conn = self.db.lock();
        conn.execute(
            "UPDATE import_sessions
            SET status = 'completed', last_processed_at = DATETIME('now')
            WHERE id = ?1",
            [session_id],
        )?;
        self.fetch(&conn, session_id)
    }

    fn fetch(&self, conn: &Connection, id: i64) -> AppResult<ImportSession> {
        conn.query_row(
            "SELECT id, city, processed_count, completed_types, next_page_tokens,
                    status, last_processed_at
            FROM import_sessions WHERE id = ?1",
            [id],
            parse_session,
        )?
    }
}

fn parse_session(row: &Row<'_>) -> rusqlite::Result<AppResult<ImportSession>> {
    let id: i64 = row.get(0)?;
    let city: String = row.get(1)?;
    let processed_count: i64 = row.get(2)?;
    let raw_types: String = row.get(3)?;
    let raw_tokens: String = row.get(4)?;
    let raw_status: String = row.get(5)?;
    let last_processed_at: String = row.get(6)?;

    Ok(build_session(
        id,
        city,
        processed_count,
        raw_types,
        raw_tokens,
        raw_status,
        last_processed_at,
    ))
}

fn build_session(
    id: i64,
    city: String,
    processed_count: i64,
    raw_types: String,
    raw_tokens: String,
    raw_status: String,
    last_processed_at: String,
) -> AppResult<ImportSession> {
    Ok(ImportSession {
        id,
        city,
        processed_count,
        completed_types: serde_json::from_str(&raw_types)?,
        next_page_tokens: serde_json::from_str(&raw_tokens)?,
        status: SessionStatus::parse(&raw_status)?,
        last_processed_at,
    })
}
