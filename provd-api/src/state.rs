use provd_core::JobQueue;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub queue: JobQueue,
}

impl AppState {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            queue: JobQueue::new(pool),
        }
    }
}
