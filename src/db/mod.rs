mod from_row;
mod schema;
pub mod queries;

pub use from_row::FromRow;
pub use schema::init_db;

use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Intake round currently running (see `Config::current_round`)
    pub current_round: i64,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL;")
    });
    Pool::builder().max_size(10).build(manager)
}
