pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod http;
pub mod models;
pub mod queries;
pub mod views;

pub use db::Store;
pub use error::AppError;
pub use http::{router, AppContext};
