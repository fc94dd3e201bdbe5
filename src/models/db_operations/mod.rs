pub mod users_db_operations;
pub mod videos_db_operations;
