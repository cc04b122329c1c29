pub mod message_service;
pub mod user_service;

pub use message_service::{MessageService, MessageServiceDependencies, SendMessageRequest};
pub use user_service::{
    AuthenticateUserRequest, RegisterUserRequest, UserService, UserServiceDependencies,
};

#[cfg(test)]
mod message_service_tests;
#[cfg(test)]
pub(crate) mod test_support;
