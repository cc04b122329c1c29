use domain::{DirectedMessage, Message, Profile, RosterEntry, Timestamp, User};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub join_at: Timestamp,
    pub last_login_at: Option<Timestamp>,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.as_str().to_owned(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            join_at: user.join_at,
            last_login_at: user.last_login_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntryDto {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&RosterEntry> for RosterEntryDto {
    fn from(entry: &RosterEntry) -> Self {
        Self {
            username: entry.username.as_str().to_owned(),
            first_name: entry.first_name.clone(),
            last_name: entry.last_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDto {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

impl From<&Profile> for ProfileDto {
    fn from(profile: &Profile) -> Self {
        Self {
            username: profile.username.as_str().to_owned(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            phone: profile.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: i64,
    pub from_username: String,
    pub to_username: String,
    pub body: String,
    pub sent_at: Timestamp,
    pub read_at: Option<Timestamp>,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.into(),
            from_username: message.from_username.as_str().to_owned(),
            to_username: message.to_username.as_str().to_owned(),
            body: message.body.as_str().to_owned(),
            sent_at: message.sent_at,
            read_at: message.read_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectedMessageDto {
    pub id: i64,
    pub counterparty: ProfileDto,
    pub body: String,
    pub sent_at: Timestamp,
    pub read_at: Option<Timestamp>,
}

impl From<&DirectedMessage> for DirectedMessageDto {
    fn from(directed: &DirectedMessage) -> Self {
        Self {
            id: directed.message.id.into(),
            counterparty: ProfileDto::from(&directed.counterparty),
            body: directed.message.body.as_str().to_owned(),
            sent_at: directed.message.sent_at,
            read_at: directed.message.read_at,
        }
    }
}
