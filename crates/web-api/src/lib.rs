pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

pub use auth::{Claims, JwtService, TokenResponse};
pub use config::JwtConfig;
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
