//! Generic keyed CRUD against PostgreSQL, parameterized by an entity config and a row mapper.

use crate::config::EntityConfig;
use crate::context::RequestContext;
use crate::error::{AppError, ErrorKind, OperationFailure, OperationResult};
use crate::service::{Entity, FindOptions, ListPlan, PaginatedResult, Pagination, RowMapper};
use crate::sql::{self, check_body, check_value, extract_key_values, KeyValues, PgBindValue, QueryBuf};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::error::DatabaseError;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{PgPool, Postgres, Row};
use std::sync::Arc;

/// Post-query hook for display-only fields the base table does not hold (joined names, labels).
/// Runs after every `get_by_key`, `find_all`, `create` and `update`.
#[async_trait]
pub trait Enricher<E>: Send + Sync {
    async fn enrich(&self, pool: &PgPool, rows: &mut [E]) -> Result<(), sqlx::Error>;
}

pub struct GenericModel<E> {
    pool: PgPool,
    config: Arc<EntityConfig>,
    mapper: RowMapper<E>,
    enricher: Option<Arc<dyn Enricher<E>>>,
}

impl<E: Entity> GenericModel<E> {
    pub fn new(pool: PgPool, config: Arc<EntityConfig>, mapper: RowMapper<E>) -> Self {
        GenericModel {
            pool,
            config,
            mapper,
            enricher: None,
        }
    }

    pub fn with_enricher(mut self, enricher: impl Enricher<E> + 'static) -> Self {
        self.enricher = Some(Arc::new(enricher));
        self
    }

    pub fn config(&self) -> &EntityConfig {
        &self.config
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Fetch one row by key. `None` is a normal outcome.
    pub async fn get_by_key(&self, key: &KeyValues) -> Result<Option<E>, AppError> {
        let q = sql::select_by_key(&self.config, key);
        let found = bind(&q)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| read_error(&self.config, e))?;
        match found {
            Some(row) => Ok(Some(self.finish_one(&row).await?)),
            None => Ok(None),
        }
    }

    /// One page plus the total under the same predicate; both queries run concurrently.
    pub async fn find_all(&self, opts: &FindOptions) -> Result<PaginatedResult<E>, AppError> {
        let plan = ListPlan::resolve(&self.config, opts);
        for (column, value) in &plan.filters {
            check_value(&self.config, column, value).map_err(AppError::Validation)?;
        }
        let page_q = sql::select_page(&self.config, &plan);
        let count_q = sql::count(&self.config, &plan);
        let (rows, count_row) = tokio::try_join!(
            bind(&page_q).fetch_all(&self.pool),
            bind(&count_q).fetch_one(&self.pool),
        )
        .map_err(|e| read_error(&self.config, e))?;
        let total: i64 = count_row.try_get(0)?;
        let data = self.finish(&rows).await?;
        Ok(PaginatedResult {
            data,
            pagination: Pagination::new(plan.page, plan.limit, total.max(0) as u64),
        })
    }

    /// Insert one row. Unless the key is store-generated it must be fully present, and an
    /// existing row with that key is `DUPLICATE_KEY`.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        data: &Map<String, Value>,
    ) -> Result<OperationResult<E>, AppError> {
        self.log_ignored_fields(data);
        if let Err(msg) = check_body(&self.config, data) {
            return Ok(Err(OperationFailure::validation(msg)));
        }
        if !self.config.generated_key {
            let key = match extract_key_values(&self.config, data) {
                Ok(key) => key,
                Err(AppError::MissingKey(msg)) => return Ok(Err(OperationFailure::validation(msg))),
                Err(other) => return Err(other),
            };
            if self.exists(&key).await? {
                return Ok(Err(OperationFailure::new(
                    ErrorKind::DuplicateKey,
                    format!("{} {} already exists", self.config.resource, key.describe()),
                )));
            }
        }
        let q = sql::insert(&self.config, data, ctx);
        match bind(&q).fetch_one(&self.pool).await {
            Ok(row) => Ok(Ok(self.finish_one(&row).await?)),
            Err(e) => classify(&self.config, e, ErrorKind::InvalidReference).map(Err),
        }
    }

    /// Partial update: only supplied non-key fields change. Nothing to change is a validation
    /// failure rather than a silent write.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        key: &KeyValues,
        data: &Map<String, Value>,
    ) -> Result<OperationResult<E>, AppError> {
        self.log_ignored_fields(data);
        if let Err(msg) = check_body(&self.config, data) {
            return Ok(Err(OperationFailure::validation(msg)));
        }
        let Some(q) = sql::update(&self.config, key, data, ctx) else {
            return Ok(Err(OperationFailure::validation(format!(
                "no updatable fields supplied for {}",
                self.config.resource
            ))));
        };
        match bind(&q).fetch_optional(&self.pool).await {
            Ok(Some(row)) => Ok(Ok(self.finish_one(&row).await?)),
            Ok(None) => Ok(Err(self.not_found(key))),
            Err(e) => classify(&self.config, e, ErrorKind::InvalidReference).map(Err),
        }
    }

    pub async fn delete(&self, key: &KeyValues) -> Result<OperationResult<()>, AppError> {
        let q = sql::delete(&self.config, key);
        match bind(&q).execute(&self.pool).await {
            Ok(done) if done.rows_affected() == 0 => Ok(Err(self.not_found(key))),
            Ok(_) => Ok(Ok(())),
            Err(e) => classify(&self.config, e, ErrorKind::Referenced).map(Err),
        }
    }

    pub async fn exists(&self, key: &KeyValues) -> Result<bool, AppError> {
        let q = sql::exists(&self.config, key);
        let found = bind(&q)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| read_error(&self.config, e))?;
        Ok(found.is_some())
    }

    pub fn not_found(&self, key: &KeyValues) -> OperationFailure {
        OperationFailure::not_found(format!("{} {}", self.config.resource, key.describe()))
    }

    async fn finish(&self, rows: &[PgRow]) -> Result<Vec<E>, AppError> {
        let mut out = rows.iter().map(self.mapper).collect::<Result<Vec<_>, _>>()?;
        if let Some(enricher) = &self.enricher {
            enricher.enrich(&self.pool, &mut out).await?;
        }
        Ok(out)
    }

    async fn finish_one(&self, row: &PgRow) -> Result<E, AppError> {
        self.finish(std::slice::from_ref(row))
            .await?
            .pop()
            .ok_or_else(|| AppError::Infrastructure("row mapper produced no entity".into()))
    }

    fn log_ignored_fields(&self, data: &Map<String, Value>) {
        let ignored: Vec<&str> = data
            .keys()
            .filter(|k| !self.config.has_column(k))
            .map(String::as_str)
            .collect();
        if !ignored.is_empty() {
            tracing::debug!(resource = %self.config.resource, fields = ?ignored, "ignoring undeclared fields");
        }
    }
}

fn bind(q: &QueryBuf) -> sqlx::query::Query<'_, Postgres, PgArguments> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    q.params
        .iter()
        .fold(sqlx::query(&q.sql), |query, p| query.bind(PgBindValue::from(p)))
}

const INVALID_TEXT_REPRESENTATION: &str = "22P02";
const STRING_DATA_RIGHT_TRUNCATION: &str = "22001";
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";
const INVALID_DATETIME_FORMAT: &str = "22007";
const DATETIME_FIELD_OVERFLOW: &str = "22008";

/// Reads only translate data exceptions (input the store cannot read as the column's type).
fn read_error(config: &EntityConfig, err: sqlx::Error) -> AppError {
    let failure = match &err {
        sqlx::Error::Database(db) => data_exception(db.as_ref()),
        _ => None,
    };
    match failure {
        Some(failure) => {
            tracing::debug!(resource = %config.resource, error = %err, "rejected read input");
            failure.into()
        }
        None => AppError::Db(err),
    }
}

fn data_exception(db: &dyn DatabaseError) -> Option<OperationFailure> {
    match db.code().as_deref() {
        Some(
            INVALID_TEXT_REPRESENTATION
            | STRING_DATA_RIGHT_TRUNCATION
            | NUMERIC_VALUE_OUT_OF_RANGE
            | INVALID_DATETIME_FORMAT
            | DATETIME_FIELD_OVERFLOW,
        ) => Some(OperationFailure::validation(db.message())),
        _ => None,
    }
}

/// Turn constraint and data errors into expected failures; anything else stays an
/// infrastructure error. `fk_kind` tells an insert/update (`INVALID_REFERENCE`) from a
/// delete (`REFERENCED`).
fn classify(config: &EntityConfig, err: sqlx::Error, fk_kind: ErrorKind) -> Result<OperationFailure, AppError> {
    let classified = match &err {
        sqlx::Error::Database(db) => classify_db(config, db.as_ref(), fk_kind),
        _ => None,
    };
    match classified {
        Some(failure) => {
            tracing::debug!(resource = %config.resource, code = failure.kind.code(), error = %err, "constraint violation");
            Ok(failure)
        }
        None => Err(AppError::Db(err)),
    }
}

fn classify_db(config: &EntityConfig, db: &dyn DatabaseError, fk_kind: ErrorKind) -> Option<OperationFailure> {
    let constraint = db.constraint().unwrap_or("unnamed constraint");
    let failure = match db.kind() {
        sqlx::error::ErrorKind::UniqueViolation => OperationFailure::new(
            ErrorKind::DuplicateKey,
            format!("{} already has a row with these values ({})", config.resource, constraint),
        ),
        sqlx::error::ErrorKind::ForeignKeyViolation if fk_kind == ErrorKind::Referenced => OperationFailure::new(
            ErrorKind::Referenced,
            format!("{} row is still referenced ({})", config.resource, constraint),
        ),
        sqlx::error::ErrorKind::ForeignKeyViolation => OperationFailure::new(
            ErrorKind::InvalidReference,
            format!("{} references a row that does not exist ({})", config.resource, constraint),
        ),
        sqlx::error::ErrorKind::NotNullViolation | sqlx::error::ErrorKind::CheckViolation => {
            OperationFailure::validation(db.message())
        }
        _ => return data_exception(db),
    };
    Some(failure)
}
