use std::sync::Arc;

use domain::{DomainError, MessageBody, MessageDraft, MessageId, Username};

use crate::{
    clock::Clock,
    dto::{DirectedMessageDto, MessageDto},
    error::ApplicationError,
    repository::{MessageRepository, UserRepository},
};

#[derive(Debug, Clone)]
pub struct SendMessageRequest {
    pub from_username: String,
    pub to_username: String,
    pub body: String,
}

pub struct MessageServiceDependencies {
    pub message_repository: Arc<dyn MessageRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub clock: Arc<dyn Clock>,
}

pub struct MessageService {
    deps: MessageServiceDependencies,
}

impl MessageService {
    pub fn new(deps: MessageServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn send(&self, request: SendMessageRequest) -> Result<MessageDto, ApplicationError> {
        let from_username = Username::parse(request.from_username)?;
        let to_username = Username::parse(request.to_username)?;
        let body = MessageBody::new(request.body)?;

        // 收件人必须存在；发件人由存储层的外键约束兜底
        if self
            .deps
            .user_repository
            .find_by_username(&to_username)
            .await?
            .is_none()
        {
            return Err(ApplicationError::Domain(DomainError::UserNotFound));
        }

        let draft = MessageDraft::new(from_username, to_username, body, self.deps.clock.now());
        let stored = self.deps.message_repository.create(draft).await?;
        Ok(MessageDto::from(&stored))
    }

    pub async fn sent_by(
        &self,
        username: &str,
    ) -> Result<Vec<DirectedMessageDto>, ApplicationError> {
        let username = self.known_username(username).await?;
        let items = self.deps.message_repository.list_sent(&username).await?;
        Ok(items.iter().map(DirectedMessageDto::from).collect())
    }

    pub async fn received_by(
        &self,
        username: &str,
    ) -> Result<Vec<DirectedMessageDto>, ApplicationError> {
        let username = self.known_username(username).await?;
        let items = self
            .deps
            .message_repository
            .list_received(&username)
            .await?;
        Ok(items.iter().map(DirectedMessageDto::from).collect())
    }

    /// 仅私信双方可以查看详情。
    pub async fn message(&self, id: i64, viewer: &str) -> Result<MessageDto, ApplicationError> {
        let viewer = Username::parse(viewer)?;
        let message = self
            .deps
            .message_repository
            .find_by_id(MessageId::new(id))
            .await?
            .ok_or(ApplicationError::Domain(DomainError::MessageNotFound))?;

        if message.from_username != viewer && message.to_username != viewer {
            return Err(ApplicationError::Authorization);
        }

        Ok(MessageDto::from(&message))
    }

    /// 仅收件人可以标记已读；重复标记是无操作。
    pub async fn mark_read(&self, id: i64, reader: &str) -> Result<MessageDto, ApplicationError> {
        let reader = Username::parse(reader)?;
        let id = MessageId::new(id);

        let message = self
            .deps
            .message_repository
            .find_by_id(id)
            .await?
            .ok_or(ApplicationError::Domain(DomainError::MessageNotFound))?;

        if message.to_username != reader {
            return Err(ApplicationError::Authorization);
        }

        let updated = self
            .deps
            .message_repository
            .mark_read(id, self.deps.clock.now())
            .await?
            .ok_or(ApplicationError::Domain(DomainError::MessageNotFound))?;

        Ok(MessageDto::from(&updated))
    }

    async fn known_username(&self, username: &str) -> Result<Username, ApplicationError> {
        let username = Username::parse(username)?;
        if self
            .deps
            .user_repository
            .find_by_username(&username)
            .await?
            .is_none()
        {
            return Err(ApplicationError::Domain(DomainError::UserNotFound));
        }
        Ok(username)
    }
}
