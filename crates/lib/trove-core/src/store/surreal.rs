use std::{error::Error, fmt, sync::Arc, time::Duration};

use serde_json::Value;
use surrealdb::{Connection, Surreal};
use trove_store::models::Document;
use trove_store::schema::FIELD_UID;

use super::filter::Filter;

#[derive(Debug)]
pub enum StoreError {
    Surreal(Box<surrealdb::Error>),
    Timeout(Duration),
    InvalidInput(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Surreal(err) => write!(f, "SurrealDB error: {err}"),
            Self::Timeout(limit) => write!(f, "store call exceeded {limit:?}"),
            Self::InvalidInput(message) => write!(f, "Invalid input: {message}"),
        }
    }
}

impl Error for StoreError {}

impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        Self::Surreal(Box::new(err))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Table-parameterized accessor over flat entity records.
///
/// Identity is the `uid` field, assigned on create when missing; the
/// backing store's native record ids are omitted from every read so the
/// engine never depends on them.
pub struct SurrealEntityStore<C: Connection> {
    db: Arc<Surreal<C>>,
}

impl<C: Connection> Clone for SurrealEntityStore<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl<C: Connection> SurrealEntityStore<C> {
    #[must_use]
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            db: Arc::new(db),
        }
    }

    #[must_use]
    pub const fn from_arc(db: Arc<Surreal<C>>) -> Self {
        Self { db }
    }

    #[must_use]
    pub fn db(&self) -> &Surreal<C> {
        &self.db
    }

    /// Creates a record in `table`, assigning a fresh `uid` when the
    /// document carries none, and returns the stored document.
    ///
    /// # Errors
    /// Returns `StoreError` if the document carries a malformed `uid` or the
    /// database write fails.
    pub async fn create(&self, table: &str, mut doc: Document) -> StoreResult<Document> {
        match doc.get(FIELD_UID) {
            None => {
                let uid = uuid::Uuid::new_v4().to_string();
                doc.insert(FIELD_UID.to_string(), Value::String(uid));
            }
            Some(Value::String(uid)) if !uid.is_empty() => {}
            Some(_) => {
                return Err(StoreError::InvalidInput(
                    "uid must be a non-empty string".to_string(),
                ));
            }
        }

        let mut response = self
            .db
            .query("CREATE type::table($table) CONTENT $content RETURN NONE;")
            .bind(("table", table.to_string()))
            .bind(("content", Value::Object(doc.clone())))
            .await?;
        let _: Vec<Value> = response.take(0)?;
        Ok(doc)
    }

    /// Fetches all records in `table` matching `filter`, in store order.
    ///
    /// # Errors
    /// Returns `StoreError` if the filter is invalid or the database query
    /// fails.
    pub async fn find_many(&self, table: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        let (body, binds) = compile_filter(filter)?;
        let query = if body.is_empty() {
            "SELECT * OMIT id FROM type::table($table);".to_string()
        } else {
            format!("SELECT * OMIT id FROM type::table($table) WHERE {body};")
        };

        let mut request = self.db.query(query).bind(("table", table.to_string()));
        for bind in binds {
            request = request.bind(bind);
        }
        let mut response = request.await?;
        let rows: Vec<Value> = response.take(0)?;
        rows_to_documents(rows)
    }

    /// Fetches one record by `uid`. A missing id yields `None`.
    ///
    /// # Errors
    /// Returns `StoreError` if the id is empty or the database query fails.
    pub async fn find_by_id(&self, table: &str, uid: &str) -> StoreResult<Option<Document>> {
        ensure_non_empty(uid, "uid")?;
        let mut response = self
            .db
            .query("SELECT * OMIT id FROM type::table($table) WHERE uid = $uid LIMIT 1;")
            .bind(("table", table.to_string()))
            .bind(("uid", uid.to_string()))
            .await?;
        let rows: Vec<Value> = response.take(0)?;
        let mut records = rows_to_documents(rows)?;
        Ok(records.pop())
    }

    /// Deletes all records in `table` matching `filter` and returns how many
    /// were removed.
    ///
    /// # Errors
    /// Returns `StoreError` if the filter is invalid or the database query
    /// fails.
    pub async fn delete_many(&self, table: &str, filter: &Filter) -> StoreResult<u64> {
        let (body, binds) = compile_filter(filter)?;
        let query = if body.is_empty() {
            "SELECT count() AS removed FROM type::table($table) GROUP ALL; \
             DELETE type::table($table) RETURN NONE;"
                .to_string()
        } else {
            format!(
                "SELECT count() AS removed FROM type::table($table) WHERE {body} GROUP ALL; \
                 DELETE type::table($table) WHERE {body} RETURN NONE;"
            )
        };

        let mut request = self.db.query(query).bind(("table", table.to_string()));
        for bind in binds {
            request = request.bind(bind);
        }
        let mut response = request.await?;
        let mut count_rows: Vec<Value> = response.take(0)?;
        let _: Vec<Value> = response.take(1)?;
        let removed = count_rows
            .pop()
            .and_then(|row| serde_json::from_value::<CountRow>(row).ok())
            .and_then(|row| row.removed)
            .unwrap_or(0);
        Ok(removed)
    }
}

#[derive(serde::Deserialize)]
struct CountRow {
    removed: Option<u64>,
}

// SurrealDB returns dynamic rows as `serde_json::Value`; the store models
// them as `Document` (a JSON object map). Every SELECT in this module reads
// whole records, which are always objects.
fn rows_to_documents(rows: Vec<Value>) -> StoreResult<Vec<Document>> {
    rows.into_iter()
        .map(|row| match row {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::InvalidInput(format!(
                "expected an object row, got {other}"
            ))),
        })
        .collect()
}

fn compile_filter(filter: &Filter) -> StoreResult<(String, Vec<(String, Value)>)> {
    for (field, _) in filter.clauses() {
        ensure_identifier(field)?;
    }
    Ok(filter.to_where())
}

// Field names are interpolated into query text; restrict them to plain
// identifiers so a filter can never smuggle in query syntax.
fn ensure_identifier(name: &str) -> StoreResult<()> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidInput(format!(
            "invalid field name: {name}"
        )))
    }
}

fn ensure_non_empty(value: &str, field: &str) -> StoreResult<()> {
    if value.is_empty() {
        return Err(StoreError::InvalidInput(format!("{field} is required")));
    }
    Ok(())
}
