//! JWT 认证和授权模块
//!
//! 提供 JWT token 签发、验证

use axum::http::HeaderMap;
use config::JwtConfig;
use domain::Username;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// JWT Claims 结构
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// 主体：用户名
    pub sub: String,
    /// 令牌唯一标识
    pub jti: String,
    /// 签发时间 (Unix timestamp)
    pub iat: i64,
    /// 过期时间 (Unix timestamp)
    pub exp: i64,
}

/// JWT Token 服务
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_ref());
        let decoding_key = DecodingKey::from_secret(config.secret.as_ref());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 签发绑定用户名的 JWT token
    pub fn issue(&self, username: &str) -> Result<String, ApiError> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::hours(self.config.expiration_hours);

        let claims = Claims {
            sub: username.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|err| {
            ApiError::internal_server_error(format!("token generation failed: {}", err))
        })
    }

    /// 验证并解析 JWT token；篡改、格式损坏、过期都归为同一种失败
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|token_data| token_data.claims)
            .map_err(|_| ApiError::invalid_token("invalid or expired token"))
    }

    /// 从 headers 中提取并验证 token，返回主体用户名
    pub fn authenticated_username(&self, headers: &HeaderMap) -> Result<Username, ApiError> {
        let auth_header = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .ok_or_else(|| ApiError::invalid_token("missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::invalid_token("invalid authorization header format"))?;

        let claims = self.verify(token)?;
        Username::parse(claims.sub).map_err(|_| ApiError::invalid_token("invalid token subject"))
    }
}

/// 登录/注册响应结构
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}
