//! Common utilities: HTTP error envelope and logging setup

pub mod error;
pub mod logger;

pub use error::{AppError, AppResponse, AppResult, ok};
pub use logger::{init_logger, init_logger_with_file};
