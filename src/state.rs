use crate::config::AppConfig;
use crate::users::{
    memory::InMemoryUserRepository,
    repo::{PgUserRepository, UserRepository},
    services::UserService,
};
use anyhow::Context;
use axum::extract::FromRef;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
}

impl AppState {
    /// Connects to PostgreSQL when configured, otherwise falls back to the
    /// in-memory repository.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let repo: Arc<dyn UserRepository> = match &config.database {
            Some(db) => {
                let pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(db.max_connections)
                    .connect(&db.url)
                    .await
                    .context("connect to database")?;
                let repo = PgUserRepository::new(pool);
                repo.ensure_schema().await.context("create users table")?;
                Arc::new(repo)
            }
            None => {
                tracing::warn!("DATABASE_URL not set; users are kept in memory only");
                Arc::new(InMemoryUserRepository::new())
            }
        };

        Ok(Self::from_parts(&config, repo))
    }

    pub fn from_parts(config: &AppConfig, repo: Arc<dyn UserRepository>) -> Self {
        Self {
            users: UserService::new(repo, config.bcrypt_cost),
        }
    }

    #[cfg(test)]
    pub fn fake(repo: Arc<dyn UserRepository>) -> Self {
        let config = AppConfig {
            database: None,
            bcrypt_cost: crate::users::password::TEST_HASH_COST,
            host: "127.0.0.1".into(),
            port: 0,
        };
        Self::from_parts(&config, repo)
    }
}

impl FromRef<AppState> for UserService {
    fn from_ref(state: &AppState) -> Self {
        state.users.clone()
    }
}
