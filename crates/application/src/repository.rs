use async_trait::async_trait;
use domain::{
    DirectedMessage, Message, MessageDraft, MessageId, RepositoryError, RosterEntry, Timestamp,
    User, Username,
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> Result<User, RepositoryError>;
    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, RepositoryError>;
    /// 尽力而为地更新最后登录时间；用户不存在时返回 false。
    async fn touch_last_login(
        &self,
        username: &Username,
        at: Timestamp,
    ) -> Result<bool, RepositoryError>;
    async fn list_roster(&self) -> Result<Vec<RosterEntry>, RepositoryError>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    // 保存私信，id 由存储层分配
    async fn create(&self, draft: MessageDraft) -> Result<Message, RepositoryError>;

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, RepositoryError>;

    /// 置位 read_at（若尚未置位）；私信不存在时返回 None。
    async fn mark_read(
        &self,
        id: MessageId,
        at: Timestamp,
    ) -> Result<Option<Message>, RepositoryError>;

    // 发出的全部私信，连同收件人资料，按 (sent_at, id) 升序
    async fn list_sent(&self, username: &Username)
        -> Result<Vec<DirectedMessage>, RepositoryError>;

    // 收到的全部私信，连同发件人资料，按 (sent_at, id) 升序
    async fn list_received(
        &self,
        username: &Username,
    ) -> Result<Vec<DirectedMessage>, RepositoryError>;
}
