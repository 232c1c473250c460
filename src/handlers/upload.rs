use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::TryStreamExt;
use log::{error, info};
use std::collections::HashMap;

use crate::config::Settings;
use crate::db::Store;
use crate::errors::AppError;
use crate::ingest::{self, CsvUpload};
use crate::utils::error_log::ErrorLog;

const JOBS_PART: &str = "jobs_file";
const DEPARTMENTS_PART: &str = "departments_file";
const EMPLOYEES_PART: &str = "employees_file";

pub async fn upload_csv<S: Store>(
    store: web::Data<S>,
    settings: web::Data<Settings>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let upload = read_upload(payload, settings.max_upload_bytes).await?;
    let error_log = ErrorLog::new(&settings.error_log_path);

    let mut session = store.session().await?;
    let summary = ingest::ingest(&mut session, &upload, &error_log)
        .await
        .map_err(|err| {
            error!("Upload failed at the {} stage: {}", err.stage(), err);
            err
        })?;

    info!(
        "Upload processed: {} job(s), {} department(s), {} employee(s), {} skipped",
        summary.jobs_loaded, summary.departments_loaded, summary.employees_loaded, summary.employees_skipped
    );
    Ok(HttpResponse::Ok().json(summary))
}

async fn read_upload(mut payload: Multipart, limit: usize) -> Result<CsvUpload, AppError> {
    let mut parts: HashMap<String, String> = HashMap::new();

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|err| AppError::BadRequest(err.to_string()))?
    {
        let name = field
            .content_disposition()
            .get_name()
            .unwrap_or_default()
            .to_string();

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|err| AppError::BadRequest(err.to_string()))?
        {
            if bytes.len() + chunk.len() > limit {
                return Err(AppError::BadRequest(format!(
                    "{} exceeds the {} byte upload limit",
                    name, limit
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        if ![JOBS_PART, DEPARTMENTS_PART, EMPLOYEES_PART].contains(&name.as_str()) {
            continue;
        }

        let text = String::from_utf8(bytes)
            .map_err(|_| AppError::BadRequest(format!("{} is not valid UTF-8", name)))?;
        let text = text.trim_start_matches('\u{feff}').to_string();
        parts.insert(name, text);
    }

    Ok(CsvUpload {
        jobs: take_part(&mut parts, JOBS_PART)?,
        departments: take_part(&mut parts, DEPARTMENTS_PART)?,
        employees: take_part(&mut parts, EMPLOYEES_PART)?,
    })
}

fn take_part(parts: &mut HashMap<String, String>, name: &str) -> Result<String, AppError> {
    parts
        .remove(name)
        .ok_or_else(|| AppError::BadRequest(format!("Missing file part '{}'", name)))
}
