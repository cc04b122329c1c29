pub mod password;
pub mod repository;

pub use password::BcryptPasswordHasher;
pub use repository::{create_pg_pool, PgMessageRepository, PgStorage, PgUserRepository};

/// 内嵌的数据库迁移，供主程序和集成测试共用。
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
