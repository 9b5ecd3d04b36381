use std::sync::Arc;

use tracing::error;

use museum_db::Database;

use crate::error::{ApiError, ApiResult};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    /// Usernames that are granted the admin role when they register.
    pub admin_usernames: Vec<String>,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: impl Into<String>) -> Self {
        Self {
            db,
            jwt_secret: jwt_secret.into(),
            admin_usernames: Vec::new(),
        }
    }

    pub fn with_admins(mut self, usernames: Vec<String>) -> Self {
        self.admin_usernames = usernames;
        self
    }

    pub fn is_bootstrap_admin(&self, username: &str) -> bool {
        self.admin_usernames.iter().any(|name| name == username)
    }
}

/// Runs blocking store work (SQLite, password hashing) off the async runtime.
pub async fn run_blocking<F, T>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&AppStateInner) -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("blocking task failed: {}", e))
        })?
}
