use serde::{Deserialize, Serialize};

use crate::value_objects::{PasswordHash, Timestamp, Username};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: Username,
    #[serde(skip_serializing)] // 密码字段不暴露给客户端
    pub password_hash: PasswordHash,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub join_at: Timestamp,
    pub last_login_at: Option<Timestamp>,
}

impl User {
    pub fn register(
        username: Username,
        password_hash: PasswordHash,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        phone: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            username,
            password_hash,
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone: phone.into(),
            join_at: now,
            last_login_at: None,
        }
    }

    pub fn record_login(&mut self, now: Timestamp) {
        self.last_login_at = Some(now);
    }

    pub fn profile(&self) -> Profile {
        Profile {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// 私信对端的用户资料摘要。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username: Username,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// 用户名录条目。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub username: Username,
    pub first_name: String,
    pub last_name: String,
}
