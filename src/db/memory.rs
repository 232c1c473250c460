//! In-process store used by the handler and ingestion tests. Enforces the
//! same keys as the Postgres schema so partial-failure behaviour matches.

use chrono::Datelike;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Session, Store, StoreError};
use crate::models::department::Department;
use crate::models::employee::HiredEmployee;
use crate::models::job::Job;
use crate::models::{NewRecord, MAX_NAME_LEN};
use crate::reports::{ReportTable, ReportValue, ABOVE_AVERAGE_COLUMNS, QUARTERLY_COLUMNS};

#[derive(Default, Clone)]
struct Tables {
    jobs: Vec<Job>,
    departments: Vec<Department>,
    employees: Vec<HiredEmployee>,
}

impl Tables {
    fn apply(&mut self, record: NewRecord) -> Result<(), StoreError> {
        match record {
            NewRecord::Job(job) => {
                check_varchar("jobs.job", &job.name)?;
                let id = self.jobs.len() as i32 + 1;
                self.jobs.push(Job { id, name: job.name });
            }
            NewRecord::Department(department) => {
                check_varchar("departments.department", &department.name)?;
                let id = self.departments.len() as i32 + 1;
                self.departments.push(Department { id, name: department.name });
            }
            NewRecord::Employee(employee) => {
                check_varchar("hired_employees.name", &employee.name)?;
                if self.employees.iter().any(|existing| existing.id == employee.id) {
                    return Err(StoreError::new(format!(
                        "duplicate key value violates unique constraint: hired_employees.id = {}",
                        employee.id
                    )));
                }
                if !self.departments.iter().any(|d| d.id == employee.department_id) {
                    return Err(StoreError::new(format!(
                        "foreign key violation: department {} does not exist",
                        employee.department_id
                    )));
                }
                if !self.jobs.iter().any(|j| j.id == employee.job_id) {
                    return Err(StoreError::new(format!(
                        "foreign key violation: job {} does not exist",
                        employee.job_id
                    )));
                }
                self.employees.push(employee);
            }
        }
        Ok(())
    }

    fn department_name(&self, id: i32) -> String {
        self.departments
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.name.clone())
            .unwrap_or_default()
    }

    fn job_name(&self, id: i32) -> String {
        self.jobs
            .iter()
            .find(|j| j.id == id)
            .map(|j| j.name.clone())
            .unwrap_or_default()
    }

    fn hired_in(&self, year: i32) -> impl Iterator<Item = &HiredEmployee> {
        self.employees.iter().filter(move |e| e.hired_at.year() == year)
    }
}

/// Mirrors the `VARCHAR(50) NOT NULL` name columns.
fn check_varchar(column: &str, value: &str) -> Result<(), StoreError> {
    if value.chars().count() > MAX_NAME_LEN {
        return Err(StoreError::new(format!(
            "value too long for type character varying({}): {}",
            MAX_NAME_LEN, column
        )));
    }
    Ok(())
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    open_sessions: Arc<AtomicUsize>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose sessions and queries all fail, like a lost connection.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn jobs(&self) -> Vec<Job> {
        self.lock().jobs.clone()
    }

    pub fn departments(&self) -> Vec<Department> {
        self.lock().departments.clone()
    }

    pub fn employees(&self) -> Vec<HiredEmployee> {
        self.lock().employees.clone()
    }

    pub fn employee(&self, id: i32) -> Option<HiredEmployee> {
        self.lock().employees.iter().find(|e| e.id == id).cloned()
    }

    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::new("connection refused"));
        }
        Ok(())
    }
}

impl Store for MemoryStore {
    type Session = MemorySession;

    async fn session(&self) -> Result<MemorySession, StoreError> {
        self.check_available()?;
        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(MemorySession {
            store: self.clone(),
            pending: Vec::new(),
        })
    }

    async fn hired_per_quarter(&self, year: i32) -> Result<ReportTable, StoreError> {
        self.check_available()?;
        let tables = self.lock();

        let mut counts: BTreeMap<(String, String), [i64; 4]> = BTreeMap::new();
        for employee in tables.hired_in(year) {
            let key = (
                tables.department_name(employee.department_id),
                tables.job_name(employee.job_id),
            );
            counts.entry(key).or_default()[employee.quarter() as usize - 1] += 1;
        }

        let mut table = ReportTable::new(&QUARTERLY_COLUMNS);
        for ((department, job), quarters) in counts {
            let mut row = vec![ReportValue::Text(department), ReportValue::Text(job)];
            row.extend(quarters.iter().copied().map(ReportValue::Integer));
            table.push_row(row);
        }
        Ok(table)
    }

    async fn departments_above_average(&self, year: i32) -> Result<ReportTable, StoreError> {
        self.check_available()?;
        let tables = self.lock();

        let mut counts: BTreeMap<i32, i64> = BTreeMap::new();
        for employee in tables.hired_in(year) {
            *counts.entry(employee.department_id).or_default() += 1;
        }

        let mut table = ReportTable::new(&ABOVE_AVERAGE_COLUMNS);
        if counts.is_empty() {
            return Ok(table);
        }

        let total: i64 = counts.values().sum();
        let average = total as f64 / counts.len() as f64;

        let mut above: Vec<(i32, i64)> = counts
            .into_iter()
            .filter(|(_, hired)| *hired as f64 > average)
            .collect();
        above.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        for (id, hired) in above {
            table.push_row(vec![
                ReportValue::Integer(id.into()),
                ReportValue::Text(tables.department_name(id)),
                ReportValue::Integer(hired),
            ]);
        }
        Ok(table)
    }
}

pub struct MemorySession {
    store: MemoryStore,
    pending: Vec<NewRecord>,
}

impl Session for MemorySession {
    fn add(&mut self, record: NewRecord) {
        self.pending.push(record);
    }

    async fn commit(&mut self) -> Result<usize, StoreError> {
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();

        let mut tables = self.store.lock();
        let mut staged = tables.clone();
        for record in pending {
            staged.apply(record)?;
        }
        *tables = staged;
        Ok(count)
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.store.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::department::NewDepartment;
    use crate::models::job::NewJob;
    use chrono::NaiveDate;

    fn employee(id: i32, month: u32, department_id: i32, job_id: i32) -> HiredEmployee {
        HiredEmployee {
            id,
            name: format!("employee {}", id),
            hired_at: NaiveDate::from_ymd_opt(2021, month, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            department_id,
            job_id,
        }
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        let mut session = store.session().await.unwrap();
        for name in ["Sales", "Support"] {
            session.add(NewDepartment { name: name.to_string() }.into());
        }
        session.add(NewJob { name: "Rep".to_string() }.into());
        session.commit().await.unwrap();
        store
    }

    #[tokio::test]
    async fn failed_commit_leaves_tables_untouched() {
        let store = seeded().await;
        let mut session = store.session().await.unwrap();
        session.add(employee(1, 3, 1, 1).into());
        session.add(employee(2, 3, 9, 1).into());

        let err = session.commit().await.unwrap_err();
        assert!(err.to_string().contains("department 9"));
        assert!(store.employees().is_empty());
    }

    #[tokio::test]
    async fn overlong_names_are_rejected_like_postgres() {
        let store = seeded().await;
        let mut session = store.session().await.unwrap();
        session.add(NewJob { name: "Analyst".to_string() }.into());
        session.add(NewJob { name: "x".repeat(51) }.into());

        let err = session.commit().await.unwrap_err();
        assert!(err.to_string().starts_with("value too long"));
        assert_eq!(store.jobs().len(), 1);

        let mut overlong = employee(1, 3, 1, 1);
        overlong.name = "y".repeat(51);
        session.add(overlong.into());
        assert!(session.commit().await.is_err());
        assert!(store.employees().is_empty());
    }

    #[tokio::test]
    async fn dropped_session_discards_queue() {
        let store = seeded().await;
        {
            let mut session = store.session().await.unwrap();
            session.add(employee(1, 3, 1, 1).into());
            assert_eq!(store.open_sessions(), 1);
        }
        assert_eq!(store.open_sessions(), 0);
        assert!(store.employees().is_empty());
    }

    #[tokio::test]
    async fn above_average_excludes_average_departments() {
        let store = seeded().await;
        let mut session = store.session().await.unwrap();
        session.add(employee(1, 1, 1, 1).into());
        session.add(employee(2, 5, 1, 1).into());
        session.add(employee(3, 8, 1, 1).into());
        session.add(employee(4, 2, 2, 1).into());
        session.commit().await.unwrap();

        let table = store.departments_above_average(2021).await.unwrap();
        assert_eq!(
            table.rows,
            vec![vec![
                ReportValue::Integer(1),
                ReportValue::Text("Sales".to_string()),
                ReportValue::Integer(3),
            ]]
        );
    }
}
