pub mod content_db_operations;
pub mod leads_db_operations;
pub mod users_db_operations;
