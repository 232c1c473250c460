use actix_web::{web, HttpResponse};
use log::info;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::db::{Session, Store};
use crate::errors::AppError;
use crate::models::employee::HiredEmployee;
use crate::utils::datetime::parse_hire_datetime;
use crate::utils::validation::{validate_hire_datetime, validate_payload};

#[derive(Deserialize, Validate)]
pub struct EmployeeTransaction {
    id: i32,
    #[validate(length(min = 1, max = 50))]
    name: String,
    #[serde(alias = "datatime")]
    #[validate(custom = "validate_hire_datetime")]
    datetime: String,
    department_id: i32,
    job_id: i32,
}

impl EmployeeTransaction {
    fn into_employee(self) -> Result<HiredEmployee, AppError> {
        let hired_at = parse_hire_datetime(&self.datetime)
            .map_err(|err| AppError::BadRequest(format!("invalid datetime '{}': {}", self.datetime, err)))?;
        Ok(HiredEmployee {
            id: self.id,
            name: self.name,
            hired_at,
            department_id: self.department_id,
            job_id: self.job_id,
        })
    }
}

pub async fn insert_transactions<S: Store>(
    store: web::Data<S>,
    employees: web::Json<Vec<EmployeeTransaction>>,
) -> Result<HttpResponse, AppError> {
    for employee in employees.iter() {
        validate_payload(employee)?;
    }

    let employees = employees
        .into_inner()
        .into_iter()
        .map(EmployeeTransaction::into_employee)
        .collect::<Result<Vec<_>, _>>()?;

    let mut session = store.session().await?;
    for employee in employees {
        session.add(employee.into());
    }
    let inserted = session.commit().await?;
    info!("Inserted {} employee transaction(s)", inserted);

    Ok(HttpResponse::Ok().json(json!({
        "message": "Transactions inserted successfully",
    })))
}
