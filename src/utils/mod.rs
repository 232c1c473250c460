pub mod datetime;
pub mod error_log;
pub mod validation;
