use crate::config::Config;
use crate::error::StoreError;
use crate::model::{Blink, NewBlink};
use crate::repository::BlinkRepository;
use anyhow::Result;
use libsql::{Builder, Connection, Database as LibsqlDatabase};
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;

const SYSTEM_MIGRATIONS: &[(&str, &str)] =
    &[("system/000_migrations_table.sql", include_str!("migrations/system/000_migrations_table.sql"))];

const MIGRATIONS: &[(&str, &str)] = &[("001_blinks.sql", include_str!("migrations/001_blinks.sql"))];

const BLINK_COLUMNS: &str = "unique_blink_id, codename, email, solana_key, description, image_url";

pub struct Database {
    db: LibsqlDatabase,
    conn: Connection,
    write_lock: Mutex<()>,
    replica: bool,
}

impl Database {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn is_replica(turso_url: &Option<String>, turso_auth_token: &Option<String>) -> bool {
        turso_url.is_some() && turso_auth_token.is_some()
    }

    pub async fn sync(&self) -> Result<()> {
        if self.replica {
            self.db
                .sync()
                .await
                .map_err(|e| anyhow::anyhow!("sync failed: {}", e))?;
        }
        Ok(())
    }

    async fn is_migration_applied(conn: &Connection, name: &str) -> Result<bool> {
        let query = "SELECT 1 FROM _migrations WHERE name = ?";
        match conn.query(query, libsql::params![name]).await {
            Ok(mut rows) => Ok(rows.next().await?.is_some()),
            Err(e) => {
                if e.to_string().contains("no such table") {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn record_migration(conn: &Connection, name: &str) -> Result<()> {
        let query = r#"
            INSERT INTO _migrations (name, applied_at)
            VALUES (?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#;
        conn.execute(query, libsql::params![name]).await?;
        Ok(())
    }

    async fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
        if Self::is_migration_applied(conn, name).await? {
            tracing::debug!(migration = name, "migration already applied, skipping");
            return Ok(());
        }

        tracing::info!(migration = name, "applying migration");
        conn.execute_batch(sql)
            .await
            .map_err(|e| anyhow::anyhow!("failed to execute migration {name}: {e}"))?;

        Self::record_migration(conn, name).await?;
        Ok(())
    }

    /// Opens the configured database under `data_dir`, as an embedded replica
    /// when Turso credentials are present.
    pub async fn new(cfg: &Config, data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(cfg.app.get_db());
        let turso_url = cfg.app.turso_url.clone();
        let turso_auth_token = cfg.app.turso_auth_token.clone();
        let replica = Self::is_replica(&turso_url, &turso_auth_token);

        let db = match (turso_url, turso_auth_token) {
            (Some(url), Some(token)) => {
                tracing::info!("[db] running in synced database mode (offline writes)");
                let sync_interval = Duration::from_secs(cfg.app.sync_interval_seconds);
                Builder::new_synced_database(&path, url, token)
                    .sync_interval(sync_interval)
                    .build()
                    .await?
            }
            _ => {
                tracing::info!(path = ?path, "[db] running in local mode");
                Builder::new_local(&path).build().await?
            }
        };

        Self::setup(db, replica).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        Self::setup(db, false).await
    }

    async fn setup(db: LibsqlDatabase, replica: bool) -> Result<Self> {
        let conn = db.connect()?;
        conn.query("SELECT 1", ()).await?;

        for (filename, sql) in SYSTEM_MIGRATIONS.iter().chain(MIGRATIONS) {
            Self::run_migration(&conn, filename, sql).await?;
        }

        Ok(Database {
            db,
            conn,
            write_lock: Mutex::new(()),
            replica,
        })
    }

    fn row_to_blink(row: &libsql::Row) -> Result<Blink, StoreError> {
        Ok(Blink {
            unique_blink_id: row.get(0)?,
            codename: row.get(1)?,
            email: row.get(2)?,
            solana_key: row.get(3)?,
            description: row.get::<Option<String>>(4)?.unwrap_or_default(),
            image_url: row.get::<Option<String>>(5)?,
        })
    }
}

#[async_trait::async_trait]
impl BlinkRepository for Database {
    async fn find_unique(&self, unique_blink_id: &str) -> Result<Option<Blink>, StoreError> {
        let query = format!("SELECT {BLINK_COLUMNS} FROM blinks WHERE unique_blink_id = ? LIMIT 1");
        let mut rows = self.conn.query(&query, libsql::params![unique_blink_id]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_blink(&row)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, new: NewBlink) -> Result<Blink, StoreError> {
        let _guard = self.write_lock.lock().await;

        let query = format!(
            "INSERT INTO blinks ({BLINK_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?) RETURNING {BLINK_COLUMNS}"
        );
        let mut rows = self
            .conn
            .query(
                &query,
                libsql::params![
                    new.unique_blink_id.as_str(),
                    new.codename.as_str(),
                    new.email.as_str(),
                    new.solana_key.as_str(),
                    new.description.as_str(),
                    new.image_url.as_deref()
                ],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Self::row_to_blink(&row),
            None => Err(StoreError::NothingReturned(new.unique_blink_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_blink(id: &str) -> NewBlink {
        NewBlink {
            unique_blink_id: id.to_string(),
            codename: "Neo".to_string(),
            email: "neo@matrix.io".to_string(),
            solana_key: "5Gh...".to_string(),
            description: String::new(),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let db = Database::open_in_memory().await.unwrap();

        let created = db.create(new_blink("abc123")).await.unwrap();
        assert_eq!(created, Blink::from(new_blink("abc123")));

        let found = db.find_unique("abc123").await.unwrap();
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn test_find_missing_returns_none() {
        let db = Database::open_in_memory().await.unwrap();
        assert_eq!(db.find_unique("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unique_constraint_rejects_second_insert() {
        let db = Database::open_in_memory().await.unwrap();
        db.create(new_blink("abc123")).await.unwrap();

        let err = db.create(new_blink("abc123")).await.unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));
        assert!(crate::unpack_error(&err).contains("UNIQUE"));
    }

    #[tokio::test]
    async fn test_image_url_round_trips() {
        let db = Database::open_in_memory().await.unwrap();
        let mut blink = new_blink("with-image");
        blink.image_url = Some("https://example.com/neo.png".to_string());
        blink.description = "the one".to_string();
        db.create(blink).await.unwrap();

        let found = db.find_unique("with-image").await.unwrap().unwrap();
        assert_eq!(found.image_url.as_deref(), Some("https://example.com/neo.png"));
        assert_eq!(found.description, "the one");
    }

    #[tokio::test]
    async fn test_migrations_are_recorded_once() {
        let db = Database::open_in_memory().await.unwrap();
        for (filename, sql) in SYSTEM_MIGRATIONS.iter().chain(MIGRATIONS) {
            Database::run_migration(db.connection(), filename, sql).await.unwrap();
        }

        let mut rows = db
            .connection()
            .query("SELECT COUNT(*) FROM _migrations", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let count: i64 = row.get(0).unwrap();
        assert_eq!(count as usize, SYSTEM_MIGRATIONS.len() + MIGRATIONS.len());
    }
}
