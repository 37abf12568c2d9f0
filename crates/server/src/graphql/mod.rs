//! GraphQL adapter over [`PatientService`].
//!
//! - `POST /graphql` executes queries and mutations
//! - `GET /graphql` serves GraphiQL

mod types;

use async_graphql::http::GraphiQLSource;
use async_graphql::{Context, EmptySubscription, ErrorExtensions, Object, Schema};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{Extension, response::Html};
use patient_core::{PatientError, SearchParams};

use crate::service::PatientService;
pub use types::{PatientInput, PatientObject, PatientPatchInput};

pub type PatientSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the schema with the service injected as context data
pub fn build_schema(service: PatientService) -> PatientSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(service)
        .finish()
}

/// Map service errors to GraphQL errors with a machine-readable `code` extension
fn to_graphql_error(err: PatientError) -> async_graphql::Error {
    let code = match &err {
        PatientError::Validation(_) => "INVALID",
        PatientError::DuplicateIdentity(_) => "DUPLICATE",
        PatientError::NotFound(_) => "NOT_FOUND",
        PatientError::StoreUnavailable(_) => "UNAVAILABLE",
    };
    async_graphql::Error::new(err.to_string()).extend_with(|_, e| e.set("code", code))
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Fetch one patient; null when the id is unknown
    async fn patient(
        &self,
        ctx: &Context<'_>,
        id: String,
    ) -> async_graphql::Result<Option<PatientObject>> {
        let service = ctx.data::<PatientService>()?;
        match service.read(&id).await {
            Ok(patient) => Ok(Some(patient.into())),
            Err(PatientError::NotFound(_)) => Ok(None),
            Err(e) => Err(to_graphql_error(e)),
        }
    }

    /// Search patients with the same semantics as `GET /fhir/Patient`
    async fn patients(
        &self,
        ctx: &Context<'_>,
        name: Option<String>,
        identifier: Option<String>,
        gender: Option<String>,
        birthdate: Option<String>,
        #[graphql(default = 10)] count: u32,
        #[graphql(default)] offset: u32,
    ) -> async_graphql::Result<Vec<PatientObject>> {
        let service = ctx.data::<PatientService>()?;
        let params = SearchParams {
            name,
            identifier,
            gender,
            birthdate,
            count: count as usize,
            offset: offset as usize,
        };

        let patients = service.search(&params).await.map_err(to_graphql_error)?;
        Ok(patients.into_iter().map(Into::into).collect())
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_patient(
        &self,
        ctx: &Context<'_>,
        input: PatientInput,
    ) -> async_graphql::Result<PatientObject> {
        let service = ctx.data::<PatientService>()?;
        let patient = service.create(input.into()).await.map_err(to_graphql_error)?;
        Ok(patient.into())
    }

    async fn update_patient(
        &self,
        ctx: &Context<'_>,
        id: String,
        input: PatientInput,
    ) -> async_graphql::Result<PatientObject> {
        let service = ctx.data::<PatientService>()?;
        let patient = service
            .update(&id, input.into())
            .await
            .map_err(to_graphql_error)?;
        Ok(patient.into())
    }

    async fn patch_patient(
        &self,
        ctx: &Context<'_>,
        id: String,
        patch: PatientPatchInput,
    ) -> async_graphql::Result<PatientObject> {
        let service = ctx.data::<PatientService>()?;
        let patient = service
            .patch(&id, patch.into())
            .await
            .map_err(to_graphql_error)?;
        Ok(patient.into())
    }

    /// Returns true once the patient is gone
    async fn delete_patient(&self, ctx: &Context<'_>, id: String) -> async_graphql::Result<bool> {
        let service = ctx.data::<PatientService>()?;
        service.delete(&id).await.map_err(to_graphql_error)?;
        Ok(true)
    }
}

/// POST /graphql
pub async fn graphql_handler(
    Extension(schema): Extension<PatientSchema>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

/// GET /graphql
pub async fn graphiql() -> Html<String> {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}
