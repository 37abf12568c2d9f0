use async_trait::async_trait;
use deadpool_postgres::Pool;
use patient_core::{INDEXED_FIELDS, PatientError, PatientQuery, Predicate, StorageDocument};
use serde_json::{Map, Value as JsonValue};
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;

use super::PatientRepository;

const TABLE: &str = "patient_documents";

/// PostgreSQL document store: one JSONB document per row, keyed by patient id.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: Pool,
}

impl PostgresRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn client(&self) -> Result<deadpool_postgres::Object, PatientError> {
        self.pool.get().await.map_err(unavailable)
    }
}

fn unavailable(err: impl std::fmt::Display) -> PatientError {
    PatientError::StoreUnavailable(err.to_string())
}

fn decode(doc: JsonValue) -> Result<StorageDocument, PatientError> {
    StorageDocument::from_json(doc)
}

/// Escape LIKE metacharacters so user input is matched literally
fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// LIMIT/OFFSET bind value. Postgres takes BIGINT, so larger page bounds saturate.
fn sql_bound(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Render a predicate as a SQL boolean expression over the `doc` column.
///
/// Field names and values are both bound as parameters; `params` receives
/// them in placeholder order.
fn render_predicate(predicate: &Predicate, params: &mut Vec<String>) -> String {
    fn bind(params: &mut Vec<String>, value: String) -> String {
        params.push(value);
        format!("${}", params.len())
    }

    match predicate {
        Predicate::All => "TRUE".to_string(),
        Predicate::And(clauses) if clauses.is_empty() => "TRUE".to_string(),
        Predicate::Or(clauses) if clauses.is_empty() => "FALSE".to_string(),
        Predicate::And(clauses) => {
            let parts: Vec<String> = clauses.iter().map(|c| render_predicate(c, params)).collect();
            format!("({})", parts.join(" AND "))
        }
        Predicate::Or(clauses) => {
            let parts: Vec<String> = clauses.iter().map(|c| render_predicate(c, params)).collect();
            format!("({})", parts.join(" OR "))
        }
        Predicate::Eq { field, value } => {
            let field = bind(params, field.clone());
            let value = bind(params, value.clone());
            format!("doc->>({}::text) = {}", field, value)
        }
        // ILIKE case folding beyond ASCII follows the database LC_CTYPE
        Predicate::ContainsIgnoreCase { field, value } => {
            let field = bind(params, field.clone());
            let pattern = bind(params, format!("%{}%", escape_like(value)));
            format!("doc->>({}::text) ILIKE {} ESCAPE '\\'", field, pattern)
        }
    }
}

#[async_trait]
impl PatientRepository for PostgresRepository {
    async fn ensure_indexes(&self) -> Result<(), PatientError> {
        let client = self.client().await?;

        client
            .batch_execute(&format!(
                "CREATE TABLE IF NOT EXISTS {TABLE} (
                    id TEXT PRIMARY KEY,
                    doc JSONB NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )"
            ))
            .await
            .map_err(unavailable)?;

        for field in INDEXED_FIELDS {
            let index = format!("{TABLE}_{}_idx", field.to_lowercase());
            client
                .batch_execute(&format!(
                    "CREATE INDEX IF NOT EXISTS {index} ON {TABLE} ((doc->>'{field}'))"
                ))
                .await
                .map_err(unavailable)?;
        }

        Ok(())
    }

    async fn insert(&self, doc: &StorageDocument) -> Result<(), PatientError> {
        let client = self.client().await?;
        let json = JsonValue::Object(doc.to_json()?);

        client
            .execute(
                format!("INSERT INTO {TABLE} (id, doc) VALUES ($1, $2)").as_str(),
                &[&doc.id(), &json],
            )
            .await
            .map_err(|e| {
                if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                    PatientError::DuplicateIdentity(doc.id().to_string())
                } else {
                    unavailable(e)
                }
            })?;

        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<StorageDocument>, PatientError> {
        let client = self.client().await?;
        let row = client
            .query_opt(format!("SELECT doc FROM {TABLE} WHERE id = $1").as_str(), &[&id])
            .await
            .map_err(unavailable)?;

        row.map(|row| decode(row.get(0))).transpose()
    }

    async fn replace(&self, id: &str, doc: &StorageDocument) -> Result<u64, PatientError> {
        let client = self.client().await?;
        let json = JsonValue::Object(doc.to_json()?);

        client
            .execute(
                format!("UPDATE {TABLE} SET doc = $2 WHERE id = $1").as_str(),
                &[&id, &json],
            )
            .await
            .map_err(unavailable)
    }

    async fn partial_update(
        &self,
        id: &str,
        fields: Map<String, JsonValue>,
    ) -> Result<u64, PatientError> {
        let client = self.client().await?;
        let json = JsonValue::Object(fields);

        // `||` on jsonb objects overwrites top-level keys
        client
            .execute(
                format!("UPDATE {TABLE} SET doc = doc || $2 WHERE id = $1").as_str(),
                &[&id, &json],
            )
            .await
            .map_err(unavailable)
    }

    async fn delete(&self, id: &str) -> Result<u64, PatientError> {
        let client = self.client().await?;
        client
            .execute(format!("DELETE FROM {TABLE} WHERE id = $1").as_str(), &[&id])
            .await
            .map_err(unavailable)
    }

    async fn find(&self, query: &PatientQuery) -> Result<Vec<StorageDocument>, PatientError> {
        let client = self.client().await?;

        let mut values = Vec::new();
        let filter = render_predicate(&query.predicate, &mut values);
        let limit = sql_bound(query.limit);
        let offset = sql_bound(query.offset);

        let sql = format!(
            "SELECT doc FROM {TABLE} WHERE {filter} ORDER BY created_at, id LIMIT ${} OFFSET ${}",
            values.len() + 1,
            values.len() + 2
        );

        let mut params: Vec<&(dyn ToSql + Sync)> =
            values.iter().map(|v| v as &(dyn ToSql + Sync)).collect();
        params.push(&limit);
        params.push(&offset);

        tracing::debug!(predicate = %query.predicate, sql = %sql, "Patient search");

        let rows = client.query(sql.as_str(), &params).await.map_err(unavailable)?;
        rows.into_iter().map(|row| decode(row.get(0))).collect()
    }

    async fn ping(&self) -> Result<(), PatientError> {
        let client = self.client().await?;
        client.query_one("SELECT 1", &[]).await.map_err(unavailable)?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
