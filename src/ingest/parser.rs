//! Row parsing for the three upload files.
//!
//! Reference data (jobs, departments) goes through a strict validator that
//! stops at the first bad row. Employees go through a lenient collector that
//! skips bad rows and keeps a diagnostic for each.

use csv::{ReaderBuilder, StringRecord};
use std::fmt;

use crate::models::department::NewDepartment;
use crate::models::employee::HiredEmployee;
use crate::models::job::NewJob;
use crate::models::{NewRecord, MAX_NAME_LEN};
use crate::utils::datetime::parse_hire_datetime;

pub const EMPTY_HIRE_DATE: &str = "Fecha de ingreso vacía";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Job,
    Department,
    Employee,
}

impl EntityKind {
    fn label(self) -> &'static str {
        match self {
            EntityKind::Job => "Job",
            EntityKind::Department => "Department",
            EntityKind::Employee => "Employee",
        }
    }
}

/// Why a single row was rejected. `row` is 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

impl RowError {
    fn new(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            message: message.into(),
        }
    }

    /// Line written to the error log for a skipped row.
    pub fn diagnostic(&self) -> String {
        format!("Fila {}: Error {}", self.row, self.message)
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}", self.row, self.message)
    }
}

impl std::error::Error for RowError {}

/// Result of the lenient employee pass.
#[derive(Debug, Default)]
pub struct EmployeeBatch {
    pub records: Vec<HiredEmployee>,
    pub skipped: Vec<RowError>,
}

impl EmployeeBatch {
    pub fn diagnostics(&self) -> Vec<String> {
        self.skipped.iter().map(RowError::diagnostic).collect()
    }
}

/// Converts one row into a record of `kind`.
pub fn parse_row(kind: EntityKind, record: &StringRecord, row: usize) -> Result<NewRecord, RowError> {
    match kind {
        EntityKind::Job => parse_name(kind, record)
            .map(|name| NewJob { name }.into())
            .map_err(|message| RowError::new(row, message)),
        EntityKind::Department => parse_name(kind, record)
            .map(|name| NewDepartment { name }.into())
            .map_err(|message| RowError::new(row, message)),
        EntityKind::Employee => parse_employee_row(record, row).map(NewRecord::from),
    }
}

pub fn parse_employee_row(record: &StringRecord, row: usize) -> Result<HiredEmployee, RowError> {
    parse_employee(record).map_err(|message| RowError::new(row, message))
}

/// Strict pass: every row must be valid, otherwise nothing is returned.
pub fn parse_reference_rows(kind: EntityKind, content: &str) -> Result<Vec<NewRecord>, RowError> {
    let mut reader = reader(content);
    let mut records = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let row = index + 1;
        let record = result.map_err(|err| RowError::new(row, err.to_string()))?;
        records.push(parse_row(kind, &record, row)?);
    }
    Ok(records)
}

/// Lenient pass: bad rows are skipped and reported, good rows are kept.
pub fn collect_employee_rows(content: &str) -> EmployeeBatch {
    let mut reader = reader(content);
    let mut batch = EmployeeBatch::default();

    for (index, result) in reader.records().enumerate() {
        let row = index + 1;
        let parsed = result
            .map_err(|err| RowError::new(row, err.to_string()))
            .and_then(|record| parse_employee_row(&record, row));

        match parsed {
            Ok(employee) => batch.records.push(employee),
            Err(err) => batch.skipped.push(err),
        }
    }
    batch
}

fn reader(content: &str) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes())
}

fn parse_name(kind: EntityKind, record: &StringRecord) -> Result<String, String> {
    let name = record
        .get(1)
        .ok_or_else(|| format!("{} name column is missing", kind.label()))?
        .trim();
    check_name(kind, name)?;
    Ok(name.to_string())
}

fn check_name(kind: EntityKind, name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err(format!("{} name cannot be empty", kind.label()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(format!(
            "{} name exceeds {} characters",
            kind.label(),
            MAX_NAME_LEN
        ));
    }
    Ok(())
}

fn parse_employee(record: &StringRecord) -> Result<HiredEmployee, String> {
    let id = parse_int(column(record, 0, "id")?, "id")?;
    let name = column(record, 1, "name")?.trim();
    let hire_date = column(record, 2, "datetime")?.trim();
    let department_id = parse_int(column(record, 3, "department_id")?, "department_id")?;
    let job_id = parse_int(column(record, 4, "job_id")?, "job_id")?;

    if hire_date.is_empty() {
        return Err(EMPTY_HIRE_DATE.to_string());
    }
    let hired_at = parse_hire_datetime(hire_date)
        .map_err(|err| format!("invalid datetime '{}': {}", hire_date, err))?;

    check_name(EntityKind::Employee, name)?;

    Ok(HiredEmployee {
        id,
        name: name.to_string(),
        hired_at,
        department_id,
        job_id,
    })
}

fn column<'r>(record: &'r StringRecord, index: usize, name: &str) -> Result<&'r str, String> {
    record
        .get(index)
        .ok_or_else(|| format!("missing column {}", name))
}

fn parse_int(value: &str, name: &str) -> Result<i32, String> {
    let value = value.trim();
    value
        .parse::<i32>()
        .map_err(|_| format!("invalid integer for {}: '{}'", name, value))
}
