use log::info;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::types::BigDecimal;
use sqlx::{Column, Connection, Postgres, Row, TypeInfo};

use super::{Session, Store, StoreError};
use crate::models::NewRecord;
use crate::reports::{ReportTable, ReportValue, ABOVE_AVERAGE_COLUMNS, QUARTERLY_COLUMNS};

const HIRED_PER_QUARTER_SQL: &str = r#"
    SELECT
        d.department AS department,
        j.job AS job,
        SUM(CASE WHEN EXTRACT(QUARTER FROM he.datetime) = 1 THEN 1 ELSE 0 END) AS "Q1",
        SUM(CASE WHEN EXTRACT(QUARTER FROM he.datetime) = 2 THEN 1 ELSE 0 END) AS "Q2",
        SUM(CASE WHEN EXTRACT(QUARTER FROM he.datetime) = 3 THEN 1 ELSE 0 END) AS "Q3",
        SUM(CASE WHEN EXTRACT(QUARTER FROM he.datetime) = 4 THEN 1 ELSE 0 END) AS "Q4"
    FROM hired_employees he
    JOIN departments d ON he.department_id = d.id
    JOIN jobs j ON he.job_id = j.id
    WHERE he.datetime >= make_date($1, 1, 1)
      AND he.datetime < make_date($1 + 1, 1, 1)
    GROUP BY d.department, j.job
    ORDER BY d.department ASC, j.job ASC
"#;

const DEPARTMENTS_ABOVE_AVERAGE_SQL: &str = r#"
    SELECT
        d.id AS id,
        d.department AS department,
        COUNT(he.id) AS hired
    FROM hired_employees he
    JOIN departments d ON he.department_id = d.id
    WHERE he.datetime >= make_date($1, 1, 1)
      AND he.datetime < make_date($1 + 1, 1, 1)
    GROUP BY d.id, d.department
    HAVING COUNT(he.id) > (
        SELECT AVG(hired_count) FROM (
            SELECT COUNT(id) AS hired_count
            FROM hired_employees
            WHERE datetime >= make_date($1, 1, 1)
              AND datetime < make_date($1 + 1, 1, 1)
            GROUP BY department_id
        ) AS department_avg
    )
    ORDER BY hired DESC, d.id ASC
"#;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn report(
        &self,
        sql: &str,
        year: i32,
        columns: &[&str],
    ) -> Result<ReportTable, StoreError> {
        let rows = sqlx::query(sql).bind(year).fetch_all(&self.pool).await?;

        let mut table = ReportTable::new(columns);
        for row in &rows {
            let values = (0..row.len())
                .map(|index| decode_value(row, index))
                .collect::<Result<Vec<_>, _>>()?;
            table.push_row(values);
        }
        Ok(table)
    }
}

impl Store for PgStore {
    type Session = PgSession;

    async fn session(&self) -> Result<PgSession, StoreError> {
        let conn = self.pool.acquire().await?;
        Ok(PgSession {
            conn,
            pending: Vec::new(),
        })
    }

    async fn hired_per_quarter(&self, year: i32) -> Result<ReportTable, StoreError> {
        self.report(HIRED_PER_QUARTER_SQL, year, &QUARTERLY_COLUMNS).await
    }

    async fn departments_above_average(&self, year: i32) -> Result<ReportTable, StoreError> {
        self.report(DEPARTMENTS_ABOVE_AVERAGE_SQL, year, &ABOVE_AVERAGE_COLUMNS).await
    }
}

/// One pooled connection held for the lifetime of a request. The connection
/// goes back to the pool when the session is dropped.
pub struct PgSession {
    conn: PoolConnection<Postgres>,
    pending: Vec<NewRecord>,
}

impl Session for PgSession {
    fn add(&mut self, record: NewRecord) {
        self.pending.push(record);
    }

    async fn commit(&mut self) -> Result<usize, StoreError> {
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();

        // Rolled back on drop if any insert fails.
        let mut tx = Connection::begin(&mut *self.conn).await?;
        for record in pending {
            match record {
                NewRecord::Job(job) => {
                    sqlx::query("INSERT INTO jobs (job) VALUES ($1)")
                        .bind(&job.name)
                        .execute(&mut *tx)
                        .await?;
                }
                NewRecord::Department(department) => {
                    sqlx::query("INSERT INTO departments (department) VALUES ($1)")
                        .bind(&department.name)
                        .execute(&mut *tx)
                        .await?;
                }
                NewRecord::Employee(employee) => {
                    sqlx::query(
                        "INSERT INTO hired_employees (id, name, datetime, department_id, job_id) VALUES ($1, $2, $3, $4, $5)",
                    )
                    .bind(employee.id)
                    .bind(&employee.name)
                    .bind(employee.hired_at)
                    .bind(employee.department_id)
                    .bind(employee.job_id)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }
        tx.commit().await?;

        info!("Committed {} record(s)", count);
        Ok(count)
    }
}

fn decode_value(row: &PgRow, index: usize) -> Result<ReportValue, sqlx::Error> {
    let value = match row.column(index).type_info().name() {
        "INT2" => ReportValue::Integer(row.try_get::<i16, _>(index)?.into()),
        "INT4" => ReportValue::Integer(row.try_get::<i32, _>(index)?.into()),
        "INT8" => ReportValue::Integer(row.try_get::<i64, _>(index)?),
        "NUMERIC" => ReportValue::Decimal(row.try_get::<BigDecimal, _>(index)?),
        _ => ReportValue::Text(row.try_get::<String, _>(index)?),
    };
    Ok(value)
}
