//! 主应用程序入口
//!
//! 启动 Axum Web API 服务。

use std::sync::Arc;

use application::services::{
    MessageService, MessageServiceDependencies, UserService, UserServiceDependencies,
};
use application::SystemClock;
use config::AppConfig;
use infrastructure::{
    create_pg_pool, BcryptPasswordHasher, PgMessageRepository, PgUserRepository, MIGRATOR,
};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 加载并校验配置
    let config = AppConfig::from_env_with_defaults();
    config.validate()?;

    tracing::info!(
        "connecting database: {}",
        config.database.url.split('@').last().unwrap_or("unknown")
    );

    let pg_pool = create_pg_pool(&config.database.url, config.database.max_connections).await?;

    // 运行迁移
    MIGRATOR.run(&pg_pool).await?;

    let user_repository = Arc::new(PgUserRepository::new(pg_pool.clone()));
    let message_repository = Arc::new(PgMessageRepository::new(pg_pool));

    let password_hasher: Arc<dyn application::PasswordHasher> =
        Arc::new(BcryptPasswordHasher::new(config.server.bcrypt_cost));
    let clock: Arc<dyn application::Clock> = Arc::new(SystemClock);

    // 创建应用层服务
    let user_service = Arc::new(UserService::new(UserServiceDependencies {
        user_repository: user_repository.clone(),
        password_hasher,
        clock: clock.clone(),
    }));

    let message_service = Arc::new(MessageService::new(MessageServiceDependencies {
        message_repository,
        user_repository,
        clock,
    }));

    // JWT 服务由显式配置构造，不依赖全局状态
    let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));

    let state = AppState::new(user_service, message_service, jwt_service);

    // 启动 Web 服务器
    let app = router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("messagely server listening on http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
