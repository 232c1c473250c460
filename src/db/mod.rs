pub mod postgres;
#[cfg(test)]
pub mod memory;

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::fmt;

use crate::models::NewRecord;
use crate::reports::ReportTable;

const MAX_CONNECTIONS: u32 = 5;

/// Failure reported by the backing store: connection loss, constraint
/// violation, failed commit or a broken report query.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreError {
    message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::new(err.to_string())
    }
}

/// Process-wide handle to the relational store. Built once at startup and
/// shared by every request.
#[allow(async_fn_in_trait)]
pub trait Store {
    type Session: Session;

    /// Opens a request-scoped session. Dropping the session releases it and
    /// discards anything queued but not committed.
    async fn session(&self) -> Result<Self::Session, StoreError>;

    /// Hires per department and job, split by quarter of `year`.
    async fn hired_per_quarter(&self, year: i32) -> Result<ReportTable, StoreError>;

    /// Departments that hired more than the average department in `year`.
    async fn departments_above_average(&self, year: i32) -> Result<ReportTable, StoreError>;
}

#[allow(async_fn_in_trait)]
pub trait Session {
    /// Queues a record for the next commit.
    fn add(&mut self, record: NewRecord);

    /// Writes every queued record in one transaction and returns how many
    /// were written. The queue is empty afterwards whether or not the commit
    /// succeeded.
    async fn commit(&mut self) -> Result<usize, StoreError>;
}

pub async fn create_pool(database_url: &str) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Creates the three tables when they are missing. Existing tables are left
/// untouched.
pub async fn init_schema(pool: &PgPool) -> Result<(), StoreError> {
    let statements = [
        "CREATE TABLE IF NOT EXISTS jobs (
            id SERIAL PRIMARY KEY,
            job VARCHAR(50) NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS departments (
            id SERIAL PRIMARY KEY,
            department VARCHAR(50) NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS hired_employees (
            id INTEGER PRIMARY KEY,
            name VARCHAR(50) NOT NULL,
            datetime TIMESTAMP NOT NULL,
            department_id INTEGER NOT NULL REFERENCES departments (id),
            job_id INTEGER NOT NULL REFERENCES jobs (id)
        )",
    ];

    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
