pub mod clock;
pub mod dto;
pub mod error;
pub mod password;
pub mod repository;
pub mod services;

pub use clock::{Clock, SystemClock};
pub use dto::{DirectedMessageDto, MessageDto, ProfileDto, RosterEntryDto, UserDto};
pub use error::ApplicationError;
pub use password::{PasswordHasher, PasswordHasherError};
pub use repository::{MessageRepository, UserRepository};
