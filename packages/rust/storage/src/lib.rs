//! libSQL storage layer for chat history (offline, local file).
//!
//! The [`Storage`] struct wraps a libSQL database holding chats and their
//! messages. The interactive chat session is the sole writer; `history`
//! commands may open the same file with [`Storage::open_readonly`].

mod migrations;

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database, params};
use unibot_shared::{Chat, ChatId, Message, Result, Sender, UnibotError};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

/// One row of the chat list.
#[derive(Debug, Clone)]
pub struct ChatSummary {
    pub id: ChatId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: u64,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| UnibotError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| UnibotError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| UnibotError::Storage(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open a database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(UnibotError::Storage(format!(
                "no chat history at {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| UnibotError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| UnibotError::Storage(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        UnibotError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(UnibotError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Chat operations
    // -----------------------------------------------------------------------

    /// Insert a chat record along with any messages it already holds.
    pub async fn insert_chat(&self, chat: &Chat) -> Result<()> {
        self.check_writable()?;
        let created = stamp(&chat.timestamp);
        self.conn
            .execute(
                "INSERT INTO chats (id, title, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    chat.id.to_string(),
                    chat.title.as_str(),
                    created.as_str(),
                    created.as_str()
                ],
            )
            .await
            .map_err(|e| UnibotError::Storage(e.to_string()))?;

        for message in &chat.messages {
            self.insert_message(&chat.id, message).await?;
        }
        Ok(())
    }

    /// Change a chat's title.
    pub async fn rename_chat(&self, id: &ChatId, title: &str) -> Result<()> {
        self.check_writable()?;
        let now = stamp(&Utc::now());
        self.conn
            .execute(
                "UPDATE chats SET title = ?1, updated_at = ?2 WHERE id = ?3",
                params![title, now.as_str(), id.to_string()],
            )
            .await
            .map_err(|e| UnibotError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Update a chat's `updated_at` timestamp.
    pub async fn touch_chat(&self, id: &ChatId) -> Result<()> {
        self.check_writable()?;
        let now = stamp(&Utc::now());
        self.conn
            .execute(
                "UPDATE chats SET updated_at = ?1 WHERE id = ?2",
                params![now.as_str(), id.to_string()],
            )
            .await
            .map_err(|e| UnibotError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Load a chat and its messages, oldest message first.
    pub async fn get_chat(&self, id: &ChatId) -> Result<Option<Chat>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, title, created_at FROM chats WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(|e| UnibotError::Storage(e.to_string()))?;

        let (title, timestamp) = match rows.next().await {
            Ok(Some(row)) => (
                row.get::<String>(1)
                    .map_err(|e| UnibotError::Storage(e.to_string()))?,
                parse_timestamp(
                    &row.get::<String>(2)
                        .map_err(|e| UnibotError::Storage(e.to_string()))?,
                )?,
            ),
            Ok(None) => return Ok(None),
            Err(e) => return Err(UnibotError::Storage(e.to_string())),
        };
        drop(rows);

        let messages = self.list_messages(id).await?;
        Ok(Some(Chat {
            id: id.clone(),
            title,
            timestamp,
            messages,
        }))
    }

    /// List all chats, most recently updated first.
    pub async fn list_chats(&self) -> Result<Vec<ChatSummary>> {
        let mut rows = self
            .conn
            .query(
                "SELECT c.id, c.title, c.created_at, c.updated_at, COUNT(m.seq)
                 FROM chats c
                 LEFT JOIN messages m ON m.chat_id = c.id
                 GROUP BY c.id
                 ORDER BY c.updated_at DESC, c.id DESC",
                params![],
            )
            .await
            .map_err(|e| UnibotError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| UnibotError::Storage(e.to_string()))?
        {
            let id: String = row
                .get(0)
                .map_err(|e| UnibotError::Storage(e.to_string()))?;
            let created: String = row
                .get(2)
                .map_err(|e| UnibotError::Storage(e.to_string()))?;
            let updated: String = row
                .get(3)
                .map_err(|e| UnibotError::Storage(e.to_string()))?;
            results.push(ChatSummary {
                id: parse_chat_id(&id)?,
                title: row
                    .get::<String>(1)
                    .map_err(|e| UnibotError::Storage(e.to_string()))?,
                created_at: parse_timestamp(&created)?,
                updated_at: parse_timestamp(&updated)?,
                message_count: row.get::<i64>(4).unwrap_or(0).max(0) as u64,
            });
        }
        Ok(results)
    }

    /// Delete a chat and its messages. Returns `false` if the chat did not exist.
    pub async fn delete_chat(&self, id: &ChatId) -> Result<bool> {
        self.check_writable()?;
        let id = id.to_string();
        self.conn
            .execute("DELETE FROM messages WHERE chat_id = ?1", params![id.as_str()])
            .await
            .map_err(|e| UnibotError::Storage(e.to_string()))?;
        let removed = self
            .conn
            .execute("DELETE FROM chats WHERE id = ?1", params![id.as_str()])
            .await
            .map_err(|e| UnibotError::Storage(e.to_string()))?;
        Ok(removed > 0)
    }

    // -----------------------------------------------------------------------
    // Message operations
    // -----------------------------------------------------------------------

    /// Append a message to an existing chat and bump the chat's `updated_at`.
    pub async fn append_message(&self, chat_id: &ChatId, message: &Message) -> Result<()> {
        self.check_writable()?;
        self.insert_message(chat_id, message).await?;
        self.touch_chat(chat_id).await
    }

    async fn insert_message(&self, chat_id: &ChatId, message: &Message) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO messages (id, chat_id, sender, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    message.id.as_str(),
                    chat_id.to_string(),
                    message.sender.as_str(),
                    message.content.as_str(),
                    stamp(&message.timestamp),
                ],
            )
            .await
            .map_err(|e| UnibotError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn list_messages(&self, chat_id: &ChatId) -> Result<Vec<Message>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, sender, content, created_at FROM messages
                 WHERE chat_id = ?1 ORDER BY seq",
                params![chat_id.to_string()],
            )
            .await
            .map_err(|e| UnibotError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| UnibotError::Storage(e.to_string()))?
        {
            results.push(row_to_message(&row)?);
        }
        Ok(results)
    }
}

/// Fixed-width RFC 3339 so stored timestamps sort as text.
fn stamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_chat_id(s: &str) -> Result<ChatId> {
    s.parse()
        .map_err(|e| UnibotError::Storage(format!("invalid chat id '{s}': {e}")))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| UnibotError::Storage(format!("invalid date: {e}")))
}

/// Convert a database row to a [`Message`].
fn row_to_message(row: &libsql::Row) -> Result<Message> {
    let sender: String = row
        .get(1)
        .map_err(|e| UnibotError::Storage(e.to_string()))?;
    Ok(Message {
        id: row
            .get::<String>(0)
            .map_err(|e| UnibotError::Storage(e.to_string()))?,
        sender: sender.parse::<Sender>().map_err(UnibotError::Storage)?,
        content: row
            .get::<String>(2)
            .map_err(|e| UnibotError::Storage(e.to_string()))?,
        timestamp: parse_timestamp(
            &row.get::<String>(3)
                .map_err(|e| UnibotError::Storage(e.to_string()))?,
        )?,
    })
}
