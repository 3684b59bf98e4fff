use chrono::Utc;
use once_cell::sync::Lazy;
use rusqlite::{params, Connection, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

// Database connection singleton
static DB: Lazy<Mutex<Option<Connection>>> = Lazy::new(|| Mutex::new(None));

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Conversation {
    pub id: String,
    pub title: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoredMessage {
    pub id: String,
    pub conversation_id: String,
    pub role: String,
    pub content: String,
    pub model: Option<String>,
    pub timestamp: String,
}

pub fn init_database(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let conn = Connection::open(db_path)?;

    conn.execute_batch(
        "
        -- Chat sessions
        CREATE TABLE IF NOT EXISTS conversations (
            id TEXT PRIMARY KEY,
            title TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        -- Messages with the model that produced them
        CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            conversation_id TEXT NOT NULL,
            role TEXT NOT NULL,
            content TEXT NOT NULL,
            model TEXT,
            timestamp TEXT NOT NULL,
            FOREIGN KEY (conversation_id) REFERENCES conversations(id)
        );

        -- Tracked analytics events
        CREATE TABLE IF NOT EXISTS analytics_events (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            properties TEXT,
            session_id TEXT,
            timestamp TEXT NOT NULL
        );
        ",
    )?;

    let mut db = DB.lock().unwrap();
    *db = Some(conn);

    Ok(())
}

fn with_connection<F, T>(f: F) -> Result<T>
where
    F: FnOnce(&Connection) -> Result<T>,
{
    let db = DB.lock().unwrap();
    let conn = db.as_ref().expect("Database not initialized");
    f(conn)
}

/// Whether init_database has run. Routes that persist opportunistically check
/// this instead of panicking inside with_connection.
pub fn is_initialized() -> bool {
    DB.lock().unwrap().is_some()
}

// ============ Conversations ============

pub fn create_conversation(title: Option<&str>) -> Result<Conversation> {
    let now = Utc::now().to_rfc3339();
    let id = Uuid::new_v4().to_string();
    with_connection(|conn| {
        conn.execute(
            "INSERT INTO conversations (id, title, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![id, title, now, now],
        )?;
        Ok(Conversation {
            id: id.clone(),
            title: title.map(|t| t.to_string()),
            created_at: now.clone(),
            updated_at: now.clone(),
        })
    })
}

pub fn get_recent_conversations(limit: usize) -> Result<Vec<Conversation>> {
    with_connection(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, title, created_at, updated_at
             FROM conversations
             ORDER BY updated_at DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(Conversation {
                id: row.get(0)?,
                title: row.get(1)?,
                created_at: row.get(2)?,
                updated_at: row.get(3)?,
            })
        })?;
        rows.collect()
    })
}

/// Append a message and bump the conversation's updated_at.
pub fn append_message(
    conversation_id: &str,
    role: &str,
    content: &str,
    model: Option<&str>,
) -> Result<StoredMessage> {
    let now = Utc::now().to_rfc3339();
    let id = Uuid::new_v4().to_string();
    with_connection(|conn| {
        conn.execute(
            "INSERT INTO messages (id, conversation_id, role, content, model, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, conversation_id, role, content, model, now],
        )?;
        conn.execute(
            "UPDATE conversations SET updated_at = ?1 WHERE id = ?2",
            params![now, conversation_id],
        )?;
        Ok(StoredMessage {
            id: id.clone(),
            conversation_id: conversation_id.to_string(),
            role: role.to_string(),
            content: content.to_string(),
            model: model.map(|m| m.to_string()),
            timestamp: now.clone(),
        })
    })
}

pub fn get_conversation_messages(conversation_id: &str) -> Result<Vec<StoredMessage>> {
    with_connection(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, conversation_id, role, content, model, timestamp
             FROM messages
             WHERE conversation_id = ?1
             ORDER BY timestamp ASC",
        )?;
        let rows = stmt.query_map(params![conversation_id], |row| {
            Ok(StoredMessage {
                id: row.get(0)?,
                conversation_id: row.get(1)?,
                role: row.get(2)?,
                content: row.get(3)?,
                model: row.get(4)?,
                timestamp: row.get(5)?,
            })
        })?;
        rows.collect()
    })
}

// ============ Analytics ============

pub fn record_event(name: &str, properties: Option<&str>, session_id: Option<&str>) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    with_connection(|conn| {
        conn.execute(
            "INSERT INTO analytics_events (name, properties, session_id, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, properties, session_id, now],
        )?;
        Ok(())
    })
}

pub fn count_events() -> Result<i64> {
    with_connection(|conn| {
        conn.query_row("SELECT COUNT(*) FROM analytics_events", [], |row| row.get(0))
    })
}

pub fn count_events_by_name(name: &str) -> Result<i64> {
    with_connection(|conn| {
        conn.query_row(
            "SELECT COUNT(*) FROM analytics_events WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
    })
}

pub fn event_counts() -> Result<Vec<(String, i64)>> {
    with_connection(|conn| {
        let mut stmt = conn.prepare(
            "SELECT name, COUNT(*) FROM analytics_events
             GROUP BY name
             ORDER BY COUNT(*) DESC",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect()
    })
}
