use rusqlite::{params, Connection};

use crate::error::StoreError;

/// SQLite-backed key-value store. The plan and history stores are the
/// only modules allowed to touch it; they use disjoint keys.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path.replace("sqlite://", ""))?;
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(Database { conn })
    }

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM kv_store WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        if let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            return Ok(Some(value));
        }
        Ok(None)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
             value = excluded.value,
             updated_at = excluded.updated_at",
            params![key, value, now_unix()],
        )?;
        Ok(())
    }

    /// Writes several keys so that either all land or none do.
    pub fn kv_set_many(&mut self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        for (key, value) in entries {
            tx.execute(
                "INSERT INTO kv_store (key, value, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                 value = excluded.value,
                 updated_at = excluded.updated_at",
                params![key, value, now_unix()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn now_unix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_delete_roundtrip() {
        let db = Database::open_in_memory().expect("open in-memory db");
        assert_eq!(db.kv_get("workout_plan").expect("get"), None);

        db.kv_set("workout_plan", "{}").expect("set");
        assert_eq!(
            db.kv_get("workout_plan").expect("get"),
            Some("{}".to_string())
        );

        db.kv_set("workout_plan", "[]").expect("overwrite");
        assert_eq!(
            db.kv_get("workout_plan").expect("get"),
            Some("[]".to_string())
        );

        db.kv_delete("workout_plan").expect("delete");
        assert_eq!(db.kv_get("workout_plan").expect("get"), None);
    }

    #[test]
    fn set_many_writes_all_keys() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        db.kv_set_many(&[("workout_plan", "{}"), ("workout_level", "\"Nivel 2: Medio\"")])
            .expect("transactional write");
        assert!(db.kv_get("workout_plan").expect("get").is_some());
        assert!(db.kv_get("workout_level").expect("get").is_some());
    }
}
