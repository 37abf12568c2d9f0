//! Patient resource HTTP handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use patient_core::{Bundle, Patient, PatientError, PatientPatch, SearchParams};
use serde_json::Value as JsonValue;

use crate::error::AppError;
use crate::service::PatientService;

const BASE_PATH: &str = "/fhir/Patient";

/// Parse a request body into a Patient so schema errors become OperationOutcomes
fn parse_patient(body: JsonValue) -> Result<Patient, AppError> {
    serde_json::from_value(body).map_err(|e| AppError::from(PatientError::from(e)))
}

/// Weak ETag carrying the patient's versionId
fn etag_headers(patient: &Patient) -> Result<HeaderMap, AppError> {
    let mut headers = HeaderMap::new();
    if let Some(meta) = &patient.meta {
        headers.insert(
            header::ETAG,
            HeaderValue::from_str(&format!("W/\"{}\"", meta.version_id))?,
        );
    }
    Ok(headers)
}

/// POST /fhir/Patient - Create a new patient
pub async fn create(
    State(service): State<PatientService>,
    Json(body): Json<JsonValue>,
) -> Result<impl IntoResponse, AppError> {
    let patient = service.create(parse_patient(body)?).await?;

    let mut headers = etag_headers(&patient)?;
    headers.insert(
        header::LOCATION,
        HeaderValue::from_str(&format!("{}/{}", BASE_PATH, patient.id))?,
    );

    Ok((StatusCode::CREATED, headers, Json(patient)))
}

/// GET /fhir/Patient/{id} - Read a patient
pub async fn read(
    State(service): State<PatientService>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let patient = service.read(&id).await?;
    let headers = etag_headers(&patient)?;

    Ok((StatusCode::OK, headers, Json(patient)))
}

/// PUT /fhir/Patient/{id} - Replace a patient
pub async fn update(
    State(service): State<PatientService>,
    Path(id): Path<String>,
    Json(body): Json<JsonValue>,
) -> Result<impl IntoResponse, AppError> {
    let patient = service.update(&id, parse_patient(body)?).await?;
    let headers = etag_headers(&patient)?;

    Ok((StatusCode::OK, headers, Json(patient)))
}

/// PATCH /fhir/Patient/{id} - Partially update a patient
pub async fn patch(
    State(service): State<PatientService>,
    Path(id): Path<String>,
    Json(body): Json<JsonValue>,
) -> Result<impl IntoResponse, AppError> {
    let patch = PatientPatch::from_json(body)?;
    let patient = service.patch(&id, patch).await?;
    let headers = etag_headers(&patient)?;

    Ok((StatusCode::OK, headers, Json(patient)))
}

/// DELETE /fhir/Patient/{id} - Delete a patient
pub async fn delete(
    State(service): State<PatientService>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /fhir/Patient - Search patients
pub async fn search(
    State(service): State<PatientService>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let patients = service.search(&params).await?;
    Ok(Json(Bundle::searchset(BASE_PATH, patients)))
}
