use common_auth::AuthGate;
use sqlx::SqlitePool;

/// Shared application state used by handlers and the per-route auth layers.
#[derive(Clone)]
pub struct AppState {
    pub(crate) db: SqlitePool,
    pub(crate) gate: AuthGate,
}

impl AppState {
    pub fn new(db: SqlitePool, gate: AuthGate) -> Self {
        Self { db, gate }
    }

    pub fn gate(&self) -> &AuthGate {
        &self.gate
    }
}
