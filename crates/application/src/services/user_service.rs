use std::sync::Arc;

use domain::{DomainError, User, Username};

use crate::{
    clock::Clock,
    dto::{RosterEntryDto, UserDto},
    error::ApplicationError,
    password::PasswordHasher,
    repository::UserRepository,
};

#[derive(Debug, Clone)]
pub struct RegisterUserRequest {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct AuthenticateUserRequest {
    pub username: String,
    pub password: String,
}

pub struct UserServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
}

pub struct UserService {
    deps: UserServiceDependencies,
}

impl UserService {
    pub fn new(deps: UserServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn register(&self, request: RegisterUserRequest) -> Result<UserDto, ApplicationError> {
        let username = Username::parse(request.username)?;
        validate_password(&request.password)?;

        if self
            .deps
            .user_repository
            .find_by_username(&username)
            .await?
            .is_some()
        {
            return Err(ApplicationError::Domain(DomainError::UserAlreadyExists));
        }

        let password_hash = self.deps.password_hasher.hash(&request.password).await?;

        let now = self.deps.clock.now();
        let user = User::register(
            username,
            password_hash,
            request.first_name,
            request.last_name,
            request.phone,
            now,
        );

        let stored = self.deps.user_repository.create(user).await?;
        Ok(UserDto::from(&stored))
    }

    /// 对外仅以 Authentication 一种结果暴露登录失败；
    /// 未知用户与密码错误的区别只保留在内部日志中。
    pub async fn authenticate(
        &self,
        request: AuthenticateUserRequest,
    ) -> Result<UserDto, ApplicationError> {
        let username = match Username::parse(request.username) {
            Ok(username) => username,
            Err(err) => {
                tracing::debug!(reason = %err, "login rejected: malformed username");
                return Err(ApplicationError::Authentication);
            }
        };

        let Some(mut user) = self
            .deps
            .user_repository
            .find_by_username(&username)
            .await?
        else {
            tracing::debug!(username = %username, "login rejected: unknown username");
            return Err(ApplicationError::Authentication);
        };

        let password_ok = self
            .deps
            .password_hasher
            .verify(&request.password, &user.password_hash)
            .await?;
        if !password_ok {
            tracing::debug!(username = %username, "login rejected: wrong password");
            return Err(ApplicationError::Authentication);
        }

        // 尽力而为：更新失败不会使登录失败
        let now = self.deps.clock.now();
        match self
            .deps
            .user_repository
            .touch_last_login(&username, now)
            .await
        {
            Ok(true) => user.record_login(now),
            Ok(false) => {
                tracing::warn!(username = %username, "last-login update skipped: user no longer exists")
            }
            Err(err) => {
                tracing::warn!(username = %username, error = %err, "last-login update failed")
            }
        }

        Ok(UserDto::from(&user))
    }

    pub async fn roster(&self) -> Result<Vec<RosterEntryDto>, ApplicationError> {
        let entries = self.deps.user_repository.list_roster().await?;
        Ok(entries.iter().map(RosterEntryDto::from).collect())
    }

    pub async fn profile(&self, username: &str) -> Result<UserDto, ApplicationError> {
        let username = Username::parse(username)?;
        let user = self
            .deps
            .user_repository
            .find_by_username(&username)
            .await?
            .ok_or(ApplicationError::Domain(DomainError::UserNotFound))?;
        Ok(UserDto::from(&user))
    }
}

fn validate_password(password: &str) -> Result<(), DomainError> {
    if password.is_empty() {
        return Err(DomainError::invalid_argument("password", "cannot be empty"));
    }
    if password.len() < 6 {
        return Err(DomainError::invalid_argument(
            "password",
            "at least 6 characters",
        ));
    }
    if password.len() > 128 {
        return Err(DomainError::invalid_argument("password", "too long"));
    }
    if password.chars().any(|c| c.is_control()) {
        return Err(DomainError::invalid_argument(
            "password",
            "control characters are not allowed",
        ));
    }
    Ok(())
}
