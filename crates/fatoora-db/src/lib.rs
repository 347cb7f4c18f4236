// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use fatoora_app::{DraftId, DraftStore, FormKind, InvoiceDraft, SavedDraft};
use rusqlite::{Connection, OptionalExtension, Row, params};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

pub const APP_NAME: &str = "fatoora";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const USER_TABLES_SQL: &str =
    "SELECT COUNT(*) FROM sqlite_schema WHERE type = 'table' AND name NOT LIKE 'sqlite_%'";

/// Columns a pre-existing `drafts` table must carry before we write to it.
const DRAFT_TABLE_COLUMNS: [&str; 9] = [
    "id",
    "kind",
    "customer_name",
    "mobile",
    "email",
    "amount",
    "payload",
    "checksum",
    "created_at",
];

const DRAFT_COLUMNS: &str = "id, payload, checksum, created_at";

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        validate_db_path(&path.to_string_lossy())?;
        Self::tuned(
            Connection::open(path)
                .with_context(|| format!("open draft database {}", path.display()))?,
        )
    }

    pub fn open_memory() -> Result<Self> {
        Self::tuned(Connection::open_in_memory().context("open in-memory draft database")?)
    }

    fn tuned(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)
            .context("enable foreign keys")?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
            .context("set journal mode")?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .context("set synchronous mode")?;
        conn.busy_timeout(BUSY_TIMEOUT).context("set busy timeout")?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    /// Creates the schema in an empty database, or checks that an existing
    /// one has a usable `drafts` table. Indexes are (re)created either way.
    pub fn bootstrap(&self) -> Result<()> {
        match self.existing_drafts_columns()? {
            None if self.is_empty()? => self
                .conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create draft schema")?,
            None => bail!(
                "database has no `drafts` table; point storage.db_path at a fatoora drafts database"
            ),
            Some(columns) => {
                let missing: Vec<&str> = DRAFT_TABLE_COLUMNS
                    .into_iter()
                    .filter(|column| !columns.contains(*column))
                    .collect();
                if !missing.is_empty() {
                    bail!(
                        "`drafts` table lacks columns {}; move the old database aside and relaunch",
                        missing.join(", ")
                    );
                }
            }
        }
        self.conn
            .execute_batch(include_str!("sql/indexes.sql"))
            .context("create draft indexes")
    }

    fn is_empty(&self) -> Result<bool> {
        let tables: i64 = self
            .conn
            .query_row(USER_TABLES_SQL, [], |row| row.get(0))
            .context("inspect database tables")?;
        Ok(tables == 0)
    }

    fn existing_drafts_columns(&self) -> Result<Option<HashSet<String>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info('drafts')")
            .context("prepare drafts column lookup")?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .context("look up drafts columns")?
            .collect::<rusqlite::Result<HashSet<_>>>()
            .context("read drafts columns")?;
        Ok((!columns.is_empty()).then_some(columns))
    }

    /// Persists `draft`, returning the id of an identical earlier draft
    /// instead of inserting a duplicate.
    pub fn insert_draft(&self, draft: &InvoiceDraft) -> Result<DraftId> {
        let payload = serde_json::to_string(draft).context("encode draft")?;
        let checksum = checksum_sha256(payload.as_bytes());

        if let Some(existing) = self
            .conn
            .query_row(
                "SELECT id FROM drafts WHERE checksum = ?",
                params![checksum],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .context("look up draft checksum")?
        {
            debug!(draft_id = existing, "identical draft already saved");
            return Ok(DraftId::new(existing));
        }

        let created_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .context("format draft timestamp")?;
        self.conn
            .execute(
                "
                INSERT INTO drafts (
                  kind, customer_name, mobile, email, amount, payload, checksum, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    kind_key(draft.kind),
                    draft.customer_name,
                    draft.mobile,
                    draft.email,
                    draft.amount,
                    payload,
                    checksum,
                    created_at,
                ],
            )
            .context("insert draft")?;
        Ok(DraftId::new(self.conn.last_insert_rowid()))
    }

    /// Newest first.
    pub fn list_drafts(&self) -> Result<Vec<SavedDraft>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {DRAFT_COLUMNS} FROM drafts ORDER BY id DESC"))
            .context("prepare draft list query")?;
        let rows = stmt.query_map([], read_draft_row).context("query drafts")?;
        let mut drafts = Vec::new();
        for row in rows {
            drafts.push(decode_draft(row.context("read draft row")?)?);
        }
        Ok(drafts)
    }

    pub fn get_draft(&self, id: DraftId) -> Result<SavedDraft> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {DRAFT_COLUMNS} FROM drafts WHERE id = ?"),
                params![id.get()],
                read_draft_row,
            )
            .optional()
            .with_context(|| format!("load draft {}", id.get()))?
            .ok_or_else(|| anyhow!("draft {} not found", id.get()))?;
        decode_draft(row)
    }

    pub fn delete_draft(&self, id: DraftId) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM drafts WHERE id = ?", params![id.get()])
            .with_context(|| format!("delete draft {}", id.get()))?;
        if changed == 0 {
            bail!("draft {} not found -- it may already be deleted", id.get());
        }
        Ok(())
    }

    pub fn count_drafts(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM drafts", [], |row| row.get(0))
            .context("count drafts")
    }
}

impl DraftStore for Store {
    fn save_draft(&mut self, draft: &InvoiceDraft) -> Result<DraftId> {
        self.insert_draft(draft)
    }
}

struct DraftRow {
    id: i64,
    payload: String,
    checksum: String,
    created_at: String,
}

fn read_draft_row(row: &Row<'_>) -> rusqlite::Result<DraftRow> {
    Ok(DraftRow {
        id: row.get(0)?,
        payload: row.get(1)?,
        checksum: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn decode_draft(row: DraftRow) -> Result<SavedDraft> {
    let draft: InvoiceDraft = serde_json::from_str(&row.payload)
        .with_context(|| format!("decode draft {} payload", row.id))?;
    let created_at = OffsetDateTime::parse(&row.created_at, &Rfc3339)
        .with_context(|| format!("parse draft {} timestamp {:?}", row.id, row.created_at))?;
    Ok(SavedDraft {
        id: DraftId::new(row.id),
        draft,
        checksum: row.checksum,
        created_at,
    })
}

const fn kind_key(kind: FormKind) -> &'static str {
    match kind {
        FormKind::OneOff => "one_off",
        FormKind::Recurring => "recurring",
    }
}

/// `FATOORA_DB_PATH`, else `drafts.db` in the platform data directory.
pub fn default_db_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os("FATOORA_DB_PATH") {
        return Ok(path.into());
    }
    let Some(data_dir) = dirs::data_local_dir() else {
        bail!("no data directory on this platform; set FATOORA_DB_PATH to a writable file");
    };
    let dir = data_dir.join(APP_NAME);
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir.join("drafts.db"))
}

/// Rejects URI-shaped paths. SQLite would otherwise interpret them as
/// connection strings rather than files.
pub fn validate_db_path(path: &str) -> Result<()> {
    match path {
        "" => bail!("database path must not be empty"),
        ":memory:" => Ok(()),
        _ if path.starts_with("file:") => {
            bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path")
        }
        _ if path.contains('?') => {
            bail!("database path {path:?} has a query string; pass a plain filesystem path")
        }
        _ => match uri_scheme(path) {
            Some(scheme) => bail!(
                "database path {path:?} looks like a URI ({scheme}://); use a filesystem path"
            ),
            None => Ok(()),
        },
    }
}

fn uri_scheme(path: &str) -> Option<&str> {
    let (scheme, _) = path.split_once("://")?;
    (!scheme.is_empty() && scheme.chars().all(|ch| ch.is_ascii_alphabetic())).then_some(scheme)
}

fn checksum_sha256(data: &[u8]) -> String {
    Sha256::digest(data)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}
