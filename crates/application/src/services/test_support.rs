//! 服务单元测试使用的内存版依赖实现。

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use domain::{
    DirectedMessage, Message, MessageDraft, MessageId, PasswordHash, Profile, RepositoryError,
    RosterEntry, Timestamp, User, Username,
};
use tokio::sync::RwLock;

use crate::clock::{Clock, SystemClock};
use crate::password::{PasswordHasher, PasswordHasherError};
use crate::repository::{MessageRepository, UserRepository};
use crate::services::{
    MessageService, MessageServiceDependencies, UserService, UserServiceDependencies,
};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let mut guard = self.users.write().await;
        let key = user.username.as_str().to_owned();
        if guard.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(key, user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, RepositoryError> {
        let guard = self.users.read().await;
        Ok(guard.get(username.as_str()).cloned())
    }

    async fn touch_last_login(
        &self,
        username: &Username,
        at: Timestamp,
    ) -> Result<bool, RepositoryError> {
        let mut guard = self.users.write().await;
        match guard.get_mut(username.as_str()) {
            Some(user) => {
                user.last_login_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_roster(&self) -> Result<Vec<RosterEntry>, RepositoryError> {
        let guard = self.users.read().await;
        let mut entries: Vec<RosterEntry> = guard
            .values()
            .map(|user| RosterEntry {
                username: user.username.clone(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.username.as_str().cmp(b.username.as_str()));
        Ok(entries)
    }
}

pub struct InMemoryMessageRepository {
    users: Arc<InMemoryUserRepository>,
    messages: RwLock<Vec<Message>>,
    next_id: AtomicI64,
}

impl InMemoryMessageRepository {
    pub fn new(users: Arc<InMemoryUserRepository>) -> Self {
        Self {
            users,
            messages: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    async fn profile_of(&self, username: &Username) -> Result<Profile, RepositoryError> {
        self.users
            .find_by_username(username)
            .await?
            .map(|user| user.profile())
            .ok_or_else(|| RepositoryError::storage("dangling message endpoint"))
    }

    async fn enrich(
        &self,
        items: Vec<Message>,
        counterparty_of: fn(&Message) -> &Username,
    ) -> Result<Vec<DirectedMessage>, RepositoryError> {
        let mut out = Vec::with_capacity(items.len());
        for message in items {
            let counterparty = self.profile_of(counterparty_of(&message)).await?;
            out.push(DirectedMessage {
                message,
                counterparty,
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn create(&self, draft: MessageDraft) -> Result<Message, RepositoryError> {
        // 模拟两端的外键约束
        if self
            .users
            .find_by_username(&draft.from_username)
            .await?
            .is_none()
            || self
                .users
                .find_by_username(&draft.to_username)
                .await?
                .is_none()
        {
            return Err(RepositoryError::NotFound);
        }

        let message = Message {
            id: MessageId::new(self.next_id.fetch_add(1, Ordering::SeqCst)),
            from_username: draft.from_username,
            to_username: draft.to_username,
            body: draft.body,
            sent_at: draft.sent_at,
            read_at: None,
        };
        self.messages.write().await.push(message.clone());
        Ok(message)
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        let guard = self.messages.read().await;
        Ok(guard.iter().find(|m| m.id == id).cloned())
    }

    async fn mark_read(
        &self,
        id: MessageId,
        at: Timestamp,
    ) -> Result<Option<Message>, RepositoryError> {
        let mut guard = self.messages.write().await;
        match guard.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.mark_read(at);
                Ok(Some(message.clone()))
            }
            None => Ok(None),
        }
    }

    async fn list_sent(
        &self,
        username: &Username,
    ) -> Result<Vec<DirectedMessage>, RepositoryError> {
        let items = {
            let guard = self.messages.read().await;
            let mut items: Vec<Message> = guard
                .iter()
                .filter(|m| m.from_username == *username)
                .cloned()
                .collect();
            items.sort_by(|a, b| a.sent_at.cmp(&b.sent_at).then(a.id.cmp(&b.id)));
            items
        };
        self.enrich(items, |m| &m.to_username).await
    }

    async fn list_received(
        &self,
        username: &Username,
    ) -> Result<Vec<DirectedMessage>, RepositoryError> {
        let items = {
            let guard = self.messages.read().await;
            let mut items: Vec<Message> = guard
                .iter()
                .filter(|m| m.to_username == *username)
                .cloned()
                .collect();
            items.sort_by(|a, b| a.sent_at.cmp(&b.sent_at).then(a.id.cmp(&b.id)));
            items
        };
        self.enrich(items, |m| &m.from_username).await
    }
}

pub struct PlainPasswordHasher;

#[async_trait]
impl PasswordHasher for PlainPasswordHasher {
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHasherError> {
        PasswordHash::new(format!("plain${plaintext}"))
            .map_err(|err| PasswordHasherError::hash_error(err.to_string()))
    }

    async fn verify(
        &self,
        plaintext: &str,
        hashed: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        Ok(hashed.as_str() == format!("plain${plaintext}"))
    }
}

pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

pub struct TestBackend {
    pub user_service: UserService,
    pub message_service: MessageService,
}

pub fn test_backend() -> TestBackend {
    test_backend_with_clock(Arc::new(SystemClock))
}

pub fn test_backend_with_clock(clock: Arc<dyn Clock>) -> TestBackend {
    let users = Arc::new(InMemoryUserRepository::new());
    let messages = Arc::new(InMemoryMessageRepository::new(users.clone()));
    let password_hasher: Arc<dyn PasswordHasher> = Arc::new(PlainPasswordHasher);

    let user_service = UserService::new(UserServiceDependencies {
        user_repository: users.clone(),
        password_hasher,
        clock: clock.clone(),
    });

    let message_service = MessageService::new(MessageServiceDependencies {
        message_repository: messages,
        user_repository: users,
        clock,
    });

    TestBackend {
        user_service,
        message_service,
    }
}
