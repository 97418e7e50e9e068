pub mod auction;
pub mod config;
pub mod database;
pub mod scheduler;
pub mod store;
