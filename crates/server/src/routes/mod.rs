pub mod health;
mod patient;

use axum::{Router, routing::get};

use crate::service::PatientService;

/// Build FHIR routes
pub fn fhir_routes() -> Router<PatientService> {
    Router::new()
        .route("/Patient", get(patient::search).post(patient::create))
        .route(
            "/Patient/{id}",
            get(patient::read)
                .put(patient::update)
                .patch(patient::patch)
                .delete(patient::delete),
        )
}
