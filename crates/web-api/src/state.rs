use std::sync::Arc;

use application::services::{MessageService, UserService};

use crate::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub message_service: Arc<MessageService>,
    pub jwt_service: Arc<JwtService>,
}

impl AppState {
    pub fn new(
        user_service: Arc<UserService>,
        message_service: Arc<MessageService>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            user_service,
            message_service,
            jwt_service,
        }
    }
}
