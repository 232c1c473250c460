use actix_web::http::header::ContentType;
use actix_web::{web, HttpResponse};
use log::error;

use crate::config::Settings;
use crate::db::{Store, StoreError};
use crate::reports::{render_error, render_html, ReportPage, ReportTable};

pub async fn hired_per_quarter<S: Store>(
    store: web::Data<S>,
    settings: web::Data<Settings>,
) -> HttpResponse {
    let title = format!("Employees Hired Per Quarter ({})", settings.report_year);
    let page = ReportPage {
        title: &title,
        table_width: "80%",
        header_color: "#4CAF50",
    };
    respond(&page, store.hired_per_quarter(settings.report_year).await)
}

pub async fn departments_above_average<S: Store>(
    store: web::Data<S>,
    settings: web::Data<Settings>,
) -> HttpResponse {
    let title = format!("Departments Above Average Hires ({})", settings.report_year);
    let page = ReportPage {
        title: &title,
        table_width: "60%",
        header_color: "#3498db",
    };
    respond(&page, store.departments_above_average(settings.report_year).await)
}

fn respond(page: &ReportPage<'_>, result: Result<ReportTable, StoreError>) -> HttpResponse {
    match result {
        Ok(table) => HttpResponse::Ok()
            .content_type(ContentType::html())
            .body(render_html(page, &table)),
        Err(err) => {
            error!("Report '{}' failed: {}", page.title, err);
            HttpResponse::InternalServerError()
                .content_type(ContentType::html())
                .body(render_error(&err.to_string()))
        }
    }
}
