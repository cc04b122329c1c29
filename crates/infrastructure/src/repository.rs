use application::repository::{MessageRepository, UserRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    DirectedMessage, Message, MessageDraft, MessageId, PasswordHash, Profile, RepositoryError,
    RosterEntry, Timestamp, User, Username,
};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        // 用户名竞争由存储层的唯一约束裁决
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict;
        }
        // 私信两端的外键约束
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound;
        }
    }
    RepositoryError::storage(err.to_string())
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

#[derive(Debug, FromRow)]
struct UserRecord {
    username: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    phone: String,
    join_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserRecord> for User {
    type Error = RepositoryError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        let username =
            Username::parse(value.username).map_err(|err| invalid_data(err.to_string()))?;
        let password_hash =
            PasswordHash::new(value.password_hash).map_err(|err| invalid_data(err.to_string()))?;

        Ok(User {
            username,
            password_hash,
            first_name: value.first_name,
            last_name: value.last_name,
            phone: value.phone,
            join_at: value.join_at,
            last_login_at: value.last_login_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RosterRecord {
    username: String,
    first_name: String,
    last_name: String,
}

impl TryFrom<RosterRecord> for RosterEntry {
    type Error = RepositoryError;

    fn try_from(value: RosterRecord) -> Result<Self, Self::Error> {
        Ok(RosterEntry {
            username: Username::parse(value.username)
                .map_err(|err| invalid_data(err.to_string()))?,
            first_name: value.first_name,
            last_name: value.last_name,
        })
    }
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: i64,
    from_username: String,
    to_username: String,
    body: String,
    sent_at: DateTime<Utc>,
    read_at: Option<DateTime<Utc>>,
}

impl TryFrom<MessageRecord> for Message {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        Ok(Message {
            id: MessageId::from(value.id),
            from_username: Username::parse(value.from_username)
                .map_err(|err| invalid_data(err.to_string()))?,
            to_username: Username::parse(value.to_username)
                .map_err(|err| invalid_data(err.to_string()))?,
            body: domain::MessageBody::new(value.body)
                .map_err(|err| invalid_data(err.to_string()))?,
            sent_at: value.sent_at,
            read_at: value.read_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct DirectedMessageRecord {
    id: i64,
    from_username: String,
    to_username: String,
    body: String,
    sent_at: DateTime<Utc>,
    read_at: Option<DateTime<Utc>>,
    counterparty_username: String,
    counterparty_first_name: String,
    counterparty_last_name: String,
    counterparty_phone: String,
}

impl TryFrom<DirectedMessageRecord> for DirectedMessage {
    type Error = RepositoryError;

    fn try_from(value: DirectedMessageRecord) -> Result<Self, Self::Error> {
        let counterparty = Profile {
            username: Username::parse(value.counterparty_username)
                .map_err(|err| invalid_data(err.to_string()))?,
            first_name: value.counterparty_first_name,
            last_name: value.counterparty_last_name,
            phone: value.counterparty_phone,
        };
        let message = Message::try_from(MessageRecord {
            id: value.id,
            from_username: value.from_username,
            to_username: value.to_username,
            body: value.body,
            sent_at: value.sent_at,
            read_at: value.read_at,
        })?;

        Ok(DirectedMessage {
            message,
            counterparty,
        })
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (username, password_hash, first_name, last_name, phone, join_at, last_login_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING username, password_hash, first_name, last_name, phone, join_at, last_login_at
            "#,
        )
        .bind(user.username.as_str())
        .bind(user.password_hash.as_str())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(user.join_at)
        .bind(user.last_login_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        User::try_from(record)
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT username, password_hash, first_name, last_name, phone, join_at, last_login_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn touch_last_login(
        &self,
        username: &Username,
        at: Timestamp,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(r#"UPDATE users SET last_login_at = $2 WHERE username = $1"#)
            .bind(username.as_str())
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_roster(&self) -> Result<Vec<RosterEntry>, RepositoryError> {
        let records = sqlx::query_as::<_, RosterRecord>(
            r#"SELECT username, first_name, last_name FROM users ORDER BY username"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(RosterEntry::try_from).collect()
    }
}

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(&self, draft: MessageDraft) -> Result<Message, RepositoryError> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            INSERT INTO messages (from_username, to_username, body, sent_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, from_username, to_username, body, sent_at, read_at
            "#,
        )
        .bind(draft.from_username.as_str())
        .bind(draft.to_username.as_str())
        .bind(draft.body.as_str())
        .bind(draft.sent_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Message::try_from(record)
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, from_username, to_username, body, sent_at, read_at
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(i64::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Message::try_from).transpose()
    }

    async fn mark_read(
        &self,
        id: MessageId,
        at: Timestamp,
    ) -> Result<Option<Message>, RepositoryError> {
        // COALESCE 保证幂等；GREATEST 保证 read_at 不早于 sent_at
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            UPDATE messages
            SET read_at = COALESCE(read_at, GREATEST(sent_at, $2))
            WHERE id = $1
            RETURNING id, from_username, to_username, body, sent_at, read_at
            "#,
        )
        .bind(i64::from(id))
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Message::try_from).transpose()
    }

    async fn list_sent(
        &self,
        username: &Username,
    ) -> Result<Vec<DirectedMessage>, RepositoryError> {
        let records = sqlx::query_as::<_, DirectedMessageRecord>(
            r#"
            SELECT m.id,
                   m.from_username,
                   m.to_username,
                   m.body,
                   m.sent_at,
                   m.read_at,
                   u.username   AS counterparty_username,
                   u.first_name AS counterparty_first_name,
                   u.last_name  AS counterparty_last_name,
                   u.phone      AS counterparty_phone
            FROM messages AS m
            JOIN users AS u ON m.to_username = u.username
            WHERE m.from_username = $1
            ORDER BY m.sent_at ASC, m.id ASC
            "#,
        )
        .bind(username.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(DirectedMessage::try_from).collect()
    }

    async fn list_received(
        &self,
        username: &Username,
    ) -> Result<Vec<DirectedMessage>, RepositoryError> {
        let records = sqlx::query_as::<_, DirectedMessageRecord>(
            r#"
            SELECT m.id,
                   m.from_username,
                   m.to_username,
                   m.body,
                   m.sent_at,
                   m.read_at,
                   u.username   AS counterparty_username,
                   u.first_name AS counterparty_first_name,
                   u.last_name  AS counterparty_last_name,
                   u.phone      AS counterparty_phone
            FROM messages AS m
            JOIN users AS u ON m.from_username = u.username
            WHERE m.to_username = $1
            ORDER BY m.sent_at ASC, m.id ASC
            "#,
        )
        .bind(username.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(DirectedMessage::try_from).collect()
    }
}

/// 打包好的 PostgreSQL 存储实现。
pub struct PgStorage {
    pub user_repository: PgUserRepository,
    pub message_repository: PgMessageRepository,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self {
            user_repository: PgUserRepository::new(pool.clone()),
            message_repository: PgMessageRepository::new(pool),
        }
    }
}
