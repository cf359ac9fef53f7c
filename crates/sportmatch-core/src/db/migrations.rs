//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        apply(conn, 1, V1_ACCOUNTS_AND_SWIPES).await?;
    }
    if version < 2 {
        apply(conn, 2, V2_MATCHES_AND_MESSAGES).await?;
    }

    Ok(())
}

/// Get the current schema version (0 for a fresh database)
async fn get_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists = match rows.next().await? {
        Some(row) => row.get::<i32>(0)? != 0,
        None => false,
    };
    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;
    match rows.next().await? {
        Some(row) => Ok(row.get(0)?),
        None => Ok(0),
    }
}

/// Run one migration's statements inside a transaction and record its version.
async fn apply(conn: &Connection, version: i32, statements: &[&str]) -> Result<()> {
    conn.execute("BEGIN TRANSACTION", ()).await?;

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn
        .execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            libsql::params![version],
        )
        .await
    {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    tracing::info!("Migrated database to version {version} (latest {CURRENT_VERSION})");
    Ok(())
}

const V1_ACCOUNTS_AND_SWIPES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER PRIMARY KEY
    )",
    "CREATE TABLE IF NOT EXISTS accounts (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        age INTEGER NOT NULL DEFAULT 0,
        birth_date TEXT,
        bio TEXT NOT NULL DEFAULT '',
        gender TEXT NOT NULL DEFAULT '',
        interests TEXT NOT NULL DEFAULT '[]',
        photos TEXT NOT NULL DEFAULT '[]',
        latitude REAL,
        longitude REAL,
        preferred_gender TEXT,
        max_distance_km INTEGER NOT NULL DEFAULT 50,
        experience_level TEXT NOT NULL DEFAULT '',
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_accounts_gender ON accounts(gender COLLATE NOCASE)",
    // One row per (actor, target); later swipes overwrite earlier ones.
    "CREATE TABLE IF NOT EXISTS swipes (
        actor_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
        target_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
        decision TEXT NOT NULL CHECK (decision IN ('like', 'pass', 'super_like')),
        swiped_at INTEGER NOT NULL,
        PRIMARY KEY (actor_id, target_id),
        CHECK (actor_id <> target_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_swipes_target ON swipes(target_id)",
];

const V2_MATCHES_AND_MESSAGES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS matches (
        id TEXT PRIMARY KEY,
        first_user_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
        second_user_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
        created_at INTEGER NOT NULL,
        CHECK (first_user_id < second_user_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_matches_first ON matches(first_user_id)",
    "CREATE INDEX IF NOT EXISTS idx_matches_second ON matches(second_user_id)",
    "CREATE TABLE IF NOT EXISTS messages (
        id TEXT PRIMARY KEY,
        match_id TEXT NOT NULL REFERENCES matches(id) ON DELETE CASCADE,
        sender_id TEXT NOT NULL,
        text TEXT,
        image_url TEXT,
        sent_at INTEGER NOT NULL,
        seen INTEGER NOT NULL DEFAULT 0,
        CHECK (text IS NOT NULL OR image_url IS NOT NULL)
    )",
    "CREATE INDEX IF NOT EXISTS idx_messages_match_sent ON messages(match_id, sent_at)",
];

#[cfg(test)]
mod tests {
    use super::*;
    use libsql::Builder;

    async fn setup() -> Connection {
        let db = Builder::new_local(":memory:").build().await.unwrap();
        db.connect().unwrap()
    }

    async fn table_exists(conn: &Connection, name: &str) -> bool {
        let mut rows = conn
            .query(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
                [name],
            )
            .await
            .unwrap();
        rows.next()
            .await
            .unwrap()
            .is_some_and(|row| row.get::<i32>(0).unwrap() != 0)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migrations() {
        let conn = setup().await;
        run(&conn).await.unwrap();

        assert_eq!(get_version(&conn).await.unwrap(), CURRENT_VERSION);
        for table in ["accounts", "swipes", "matches", "messages"] {
            assert!(table_exists(&conn, table).await, "missing {table}");
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migrations_idempotent() {
        let conn = setup().await;
        run(&conn).await.unwrap();
        run(&conn).await.unwrap();

        assert_eq!(get_version(&conn).await.unwrap(), CURRENT_VERSION);
    }
}
