//! Application state shared across handlers

use sqlx::PgPool;

use crate::{
    config::AppConfig,
    repositories::{TaskRepository, UserRepository},
    session::SessionStore,
    telegram::TelegramAuthVerifier,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: AppConfig,
    pub verifier: TelegramAuthVerifier,
    pub sessions: SessionStore,
    pub user_repository: UserRepository,
    pub task_repository: TaskRepository,
}
