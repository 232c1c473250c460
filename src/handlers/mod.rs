pub mod reports;
pub mod transactions;
pub mod upload;

use actix_web::web;

use crate::db::Store;

/// Registers every route against store `S`.
pub fn configure<S: Store + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/upload-csv/")
            .route(web::post().to(upload::upload_csv::<S>)),
    )
    .service(
        web::resource("/insert_transactions/")
            .route(web::post().to(transactions::insert_transactions::<S>)),
    )
    .service(
        web::resource("/employees/hired-per-quarter")
            .route(web::get().to(reports::hired_per_quarter::<S>)),
    )
    .service(
        web::resource("/departments/above-average-hired")
            .route(web::get().to(reports::departments_above_average::<S>)),
    );
}
