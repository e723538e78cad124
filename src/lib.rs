pub mod ai;
pub mod cli;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod search;

pub use db::Database;
