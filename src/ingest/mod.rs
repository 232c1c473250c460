pub mod parser;

use log::{error, info, warn};
use serde::Serialize;
use std::fmt;

use crate::db::{Session, StoreError};
use crate::errors::AppError;
use crate::utils::error_log::ErrorLog;
use parser::{EntityKind, RowError};

/// Raw text of the three upload files.
#[derive(Debug, Clone, Default)]
pub struct CsvUpload {
    pub jobs: String,
    pub departments: String,
    pub employees: String,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct IngestSummary {
    pub status: &'static str,
    pub message: &'static str,
    pub jobs_loaded: usize,
    pub departments_loaded: usize,
    pub employees_loaded: usize,
    pub employees_skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Jobs,
    Departments,
    Employees,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Jobs => write!(f, "jobs"),
            Stage::Departments => write!(f, "departments"),
            Stage::Employees => write!(f, "employees"),
        }
    }
}

#[derive(Debug)]
pub enum IngestError {
    Validation { stage: Stage, source: RowError },
    Store { stage: Stage, source: StoreError },
}

impl IngestError {
    pub fn stage(&self) -> Stage {
        match self {
            IngestError::Validation { stage, .. } | IngestError::Store { stage, .. } => *stage,
        }
    }
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::Validation { stage, source } => {
                write!(f, "Error processing {}: {}", stage, source)
            }
            IngestError::Store { stage, source } => {
                write!(f, "Error storing {}: {}", stage, source)
            }
        }
    }
}

impl std::error::Error for IngestError {}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Validation { .. } => AppError::BadRequest(err.to_string()),
            IngestError::Store { .. } => AppError::DatabaseError(err.to_string()),
        }
    }
}

/// Loads jobs, then departments, then employees through one session.
///
/// Jobs and departments are all-or-nothing per file and the first bad row
/// stops the whole upload. Employee rows that fail to parse are skipped,
/// the rest are committed, and each skipped row is appended to `error_log`.
/// Files committed before a failure stay committed.
pub async fn ingest<S: Session>(
    session: &mut S,
    upload: &CsvUpload,
    error_log: &ErrorLog,
) -> Result<IngestSummary, IngestError> {
    let jobs_loaded = load_reference(session, Stage::Jobs, EntityKind::Job, &upload.jobs).await?;
    let departments_loaded = load_reference(
        session,
        Stage::Departments,
        EntityKind::Department,
        &upload.departments,
    )
    .await?;

    let batch = parser::collect_employee_rows(&upload.employees);
    let employees_skipped = batch.skipped.len();
    let diagnostics = batch.diagnostics();

    for employee in batch.records {
        session.add(employee.into());
    }
    let employees_loaded = session
        .commit()
        .await
        .map_err(|source| IngestError::Store { stage: Stage::Employees, source })?;
    info!("Loaded {} employee(s), skipped {}", employees_loaded, employees_skipped);

    for diagnostic in &diagnostics {
        warn!("{}", diagnostic);
    }
    if let Err(err) = error_log.append(&diagnostics).await {
        error!(
            "Failed to append {} row error(s) to {}: {}",
            diagnostics.len(),
            error_log.path().display(),
            err
        );
    }

    Ok(IngestSummary {
        status: "success",
        message: "CSV files processed successfully",
        jobs_loaded,
        departments_loaded,
        employees_loaded,
        employees_skipped,
    })
}

async fn load_reference<S: Session>(
    session: &mut S,
    stage: Stage,
    kind: EntityKind,
    content: &str,
) -> Result<usize, IngestError> {
    let records = parser::parse_reference_rows(kind, content)
        .map_err(|source| IngestError::Validation { stage, source })?;

    for record in records {
        session.add(record);
    }
    let loaded = session
        .commit()
        .await
        .map_err(|source| IngestError::Store { stage, source })?;

    info!("Loaded {} {}", loaded, stage);
    Ok(loaded)
}
