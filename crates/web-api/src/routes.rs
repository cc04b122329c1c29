use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use application::services::{AuthenticateUserRequest, RegisterUserRequest, SendMessageRequest};
use application::{DirectedMessageDto, MessageDto, RosterEntryDto, UserDto};

use crate::{auth::TokenResponse, error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
struct RegisterPayload {
    username: String,
    password: String,
    first_name: String,
    last_name: String,
    phone: String,
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct SendMessagePayload {
    to_username: String,
    body: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/users", get(roster))
        .route("/users/{username}", get(user_profile))
        .route("/users/{username}/messages/from", get(messages_from))
        .route("/users/{username}/messages/to", get(messages_to))
        .route("/messages", post(send_message))
        .route("/messages/{id}", get(message_detail))
        .route("/messages/{id}/read", post(mark_read))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// 注册成功即视为登录，直接返回 token
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .user_service
        .register(RegisterUserRequest {
            username: payload.username,
            password: payload.password,
            first_name: payload.first_name,
            last_name: payload.last_name,
            phone: payload.phone,
        })
        .await?;

    let token = state.jwt_service.issue(&user.username)?;
    Ok(Json(TokenResponse { token }))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .user_service
        .authenticate(AuthenticateUserRequest {
            username: payload.username,
            password: payload.password,
        })
        .await?;

    let token = state.jwt_service.issue(&user.username)?;
    Ok(Json(TokenResponse { token }))
}

async fn roster(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<RosterEntryDto>>, ApiError> {
    state.jwt_service.authenticated_username(&headers)?;
    let entries = state.user_service.roster().await?;
    Ok(Json(entries))
}

async fn user_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Result<Json<UserDto>, ApiError> {
    state.jwt_service.authenticated_username(&headers)?;
    let user = state.user_service.profile(&username).await?;
    Ok(Json(user))
}

/// 台账查询只对本人开放
async fn messages_from(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<DirectedMessageDto>>, ApiError> {
    let subject = state.jwt_service.authenticated_username(&headers)?;
    if subject.as_str() != username {
        return Err(ApiError::forbidden("cannot read another user's messages"));
    }
    let items = state.message_service.sent_by(&username).await?;
    Ok(Json(items))
}

async fn messages_to(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<DirectedMessageDto>>, ApiError> {
    let subject = state.jwt_service.authenticated_username(&headers)?;
    if subject.as_str() != username {
        return Err(ApiError::forbidden("cannot read another user's messages"));
    }
    let items = state.message_service.received_by(&username).await?;
    Ok(Json(items))
}

/// 发件人取自 token 主体
async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SendMessagePayload>,
) -> Result<(StatusCode, Json<MessageDto>), ApiError> {
    let subject = state.jwt_service.authenticated_username(&headers)?;
    let message = state
        .message_service
        .send(SendMessageRequest {
            from_username: subject.as_str().to_owned(),
            to_username: payload.to_username,
            body: payload.body,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

async fn message_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<MessageDto>, ApiError> {
    let subject = state.jwt_service.authenticated_username(&headers)?;
    let message = state.message_service.message(id, subject.as_str()).await?;
    Ok(Json(message))
}

async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<MessageDto>, ApiError> {
    let subject = state.jwt_service.authenticated_username(&headers)?;
    let message = state
        .message_service
        .mark_read(id, subject.as_str())
        .await?;
    Ok(Json(message))
}
