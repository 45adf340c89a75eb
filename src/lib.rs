use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::lock::LockHub;
use crate::notify::LeadNotifier;

pub type DbPool = Pool<SqliteConnectionManager>;

pub struct AppState {
    pub lock_hub: Arc<LockHub>,
    pub notifier: Arc<dyn LeadNotifier>,
}

pub mod config;
pub mod helper;
pub mod lock;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod routes;
pub mod seo;
pub mod setup;
pub mod tools;
