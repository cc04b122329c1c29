use serde::{Deserialize, Serialize};

use crate::user::Profile;
use crate::value_objects::{MessageBody, MessageId, Timestamp, Username};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub from_username: Username,
    pub to_username: Username,
    pub body: MessageBody,
    pub sent_at: Timestamp,
    pub read_at: Option<Timestamp>,
}

impl Message {
    /// 标记已读。重复调用不改变首次已读时间；read_at 不会早于 sent_at。
    pub fn mark_read(&mut self, now: Timestamp) {
        if self.read_at.is_none() {
            self.read_at = Some(now.max(self.sent_at));
        }
    }

    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

/// 待持久化的私信草稿，id 由存储层分配。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub from_username: Username,
    pub to_username: Username,
    pub body: MessageBody,
    pub sent_at: Timestamp,
}

impl MessageDraft {
    pub fn new(
        from_username: Username,
        to_username: Username,
        body: MessageBody,
        now: Timestamp,
    ) -> Self {
        Self {
            from_username,
            to_username,
            body,
            sent_at: now,
        }
    }
}

/// 台账查询结果：私信连同对端的资料摘要。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectedMessage {
    pub message: Message,
    pub counterparty: Profile,
}
