use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::canon::CanonicalIndex;

pub const DB_SCHEMA_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftRecord {
    pub draft_id: String,
    pub canon_sha256: String,
    pub canon_length: usize,
    pub updated_at: String,
}

/// SQLite persistence for canonical arrays, one row per filled position.
pub struct DraftStore {
    connection: Connection,
}

impl DraftStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        let connection = Connection::open(db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        configure_connection(&connection)?;
        Self::from_connection(connection)
    }

    pub fn from_connection(connection: Connection) -> Result<Self> {
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    pub fn draft(&self, draft_id: &str) -> Result<Option<DraftRecord>> {
        self.connection
            .query_row(
                "SELECT draft_id, canon_sha256, canon_length, updated_at FROM drafts WHERE draft_id = ?1",
                params![draft_id],
                |row| {
                    Ok(DraftRecord {
                        draft_id: row.get(0)?,
                        canon_sha256: row.get(1)?,
                        canon_length: row.get::<_, i64>(2)? as usize,
                        updated_at: row.get(3)?,
                    })
                },
            )
            .optional()
            .with_context(|| format!("failed to read draft {draft_id}"))
    }

    /// Stored array for `draft_id`, sized to the length it was saved with.
    pub fn load_array(&self, draft_id: &str) -> Result<Option<Vec<String>>> {
        let Some(record) = self.draft(draft_id)? else {
            return Ok(None);
        };

        let mut array = vec![String::new(); record.canon_length];
        let mut statement = self
            .connection
            .prepare("SELECT position, text FROM verses WHERE draft_id = ?1 ORDER BY position")
            .context("failed to prepare verse query")?;
        let rows = statement
            .query_map(params![draft_id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })
            .with_context(|| format!("failed to query verses for draft {draft_id}"))?;

        for row in rows {
            let (position, text) =
                row.with_context(|| format!("failed to read verse row for draft {draft_id}"))?;
            if let Some(slot) = usize::try_from(position)
                .ok()
                .and_then(|position| array.get_mut(position))
            {
                *slot = text;
            }
        }

        Ok(Some(array))
    }

    /// Replaces the stored array for `draft_id`. Blank slots are not stored.
    pub fn save_array(
        &mut self,
        draft_id: &str,
        array: &[String],
        index: &CanonicalIndex,
        canon_sha256: &str,
        updated_at: &str,
    ) -> Result<usize> {
        let tx = self
            .connection
            .transaction()
            .context("failed to start draft transaction")?;

        tx.execute(
            "INSERT INTO drafts (draft_id, canon_sha256, canon_length, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(draft_id) DO UPDATE SET
               canon_sha256 = excluded.canon_sha256,
               canon_length = excluded.canon_length,
               updated_at = excluded.updated_at",
            params![draft_id, canon_sha256, array.len() as i64, updated_at],
        )
        .with_context(|| format!("failed to upsert draft {draft_id}"))?;

        tx.execute("DELETE FROM verses WHERE draft_id = ?1", params![draft_id])
            .with_context(|| format!("failed to clear verses for draft {draft_id}"))?;

        let mut written = 0usize;
        {
            let mut insert = tx
                .prepare(
                    "INSERT INTO verses (draft_id, position, reference, text) VALUES (?1, ?2, ?3, ?4)",
                )
                .context("failed to prepare verse insert")?;

            for (position, text) in array.iter().enumerate() {
                if text.is_empty() {
                    continue;
                }
                let reference = index
                    .reference_at(position)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                insert
                    .execute(params![draft_id, position as i64, reference, text])
                    .with_context(|| {
                        format!("failed to insert verse {position} for draft {draft_id}")
                    })?;
                written += 1;
            }
        }

        tx.commit().context("failed to commit draft transaction")?;
        Ok(written)
    }

    pub fn draft_ids(&self) -> Result<Vec<String>> {
        let mut statement = self
            .connection
            .prepare("SELECT draft_id FROM drafts ORDER BY draft_id")
            .context("failed to prepare draft listing")?;
        let rows = statement
            .query_map([], |row| row.get::<_, String>(0))
            .context("failed to list drafts")?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row.context("failed to read draft id")?);
        }
        Ok(ids)
    }
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS drafts (
          draft_id TEXT PRIMARY KEY,
          canon_sha256 TEXT NOT NULL,
          canon_length INTEGER NOT NULL,
          updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS verses (
          draft_id TEXT NOT NULL,
          position INTEGER NOT NULL,
          reference TEXT NOT NULL,
          text TEXT NOT NULL,
          PRIMARY KEY(draft_id, position),
          FOREIGN KEY(draft_id) REFERENCES drafts(draft_id)
        );
        ",
        )
        .context("failed to create draft schema")?;

    connection
        .execute(
            "INSERT INTO metadata (key, value) VALUES ('db_schema_version', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![DB_SCHEMA_VERSION],
        )
        .context("failed to record schema version")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_store() -> DraftStore {
        let connection = Connection::open_in_memory().expect("in-memory sqlite should open");
        DraftStore::from_connection(connection).expect("schema should apply")
    }

    fn sample_index() -> CanonicalIndex {
        CanonicalIndex::build(["GEN 1:1", "GEN 1:2", "GEN 1:3"]).expect("canon should build")
    }

    #[test]
    fn load_array_of_unknown_draft_is_none() {
        let store = memory_store();
        assert!(store.load_array("missing").expect("query should run").is_none());
    }

    #[test]
    fn save_and_load_round_trip_keeps_positions() {
        let mut store = memory_store();
        let index = sample_index();
        let array = vec!["In.".to_string(), String::new(), " ".to_string()];

        let written = store
            .save_array("draft-a", &array, &index, "abc123", "2026-01-01T00:00:00Z")
            .expect("save should succeed");

        assert_eq!(written, 2);
        assert_eq!(
            store.load_array("draft-a").expect("load should succeed"),
            Some(array)
        );

        let record = store
            .draft("draft-a")
            .expect("draft query should run")
            .expect("draft should exist");
        assert_eq!(record.canon_length, 3);
        assert_eq!(record.canon_sha256, "abc123");
    }

    #[test]
    fn save_replaces_previous_rows() {
        let mut store = memory_store();
        let index = sample_index();

        store
            .save_array(
                "draft-a",
                &["a.".to_string(), "b.".to_string(), "c.".to_string()],
                &index,
                "abc",
                "t1",
            )
            .expect("first save should succeed");
        store
            .save_array(
                "draft-a",
                &["a.".to_string(), String::new(), "c.".to_string()],
                &index,
                "abc",
                "t2",
            )
            .expect("second save should succeed");

        let loaded = store
            .load_array("draft-a")
            .expect("load should succeed")
            .expect("draft should exist");
        assert_eq!(loaded, vec!["a.", "", "c."]);
        assert_eq!(store.draft_ids().expect("listing should run"), vec!["draft-a"]);
    }
}
