use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::publish::Publisher;
use crate::storage::ObjectStorage;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Collaborators and limits shared by every worker.
pub struct AppState {
    pub storage: Arc<dyn ObjectStorage>,
    pub publisher: Arc<dyn Publisher>,
    pub max_upload_bytes: u64,
}

pub mod config;
pub mod error;
pub mod helper;
pub mod middleware;
pub mod models;
pub mod publish;
pub mod routes;
pub mod setup;
pub mod storage;
