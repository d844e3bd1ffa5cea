//! GenericController: list, read, create, update and delete handlers shared by every keyed entity.
//!
//! Expected failures come back from the model as `OperationResult` and are rendered here;
//! infrastructure errors bubble up as `AppError` to its `IntoResponse`.

use crate::context::RequestContext;
use crate::error::{AppError, ConfigError};
use crate::response::{success_message, success_one, success_one_ok, success_page, Envelope};
use crate::service::{Entity, FindOptions, GenericModel, RequestValidator};
use crate::sql::extract_path_key;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

type Reply<T> = Result<(StatusCode, Json<Envelope<T>>), AppError>;

fn body_to_map(value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::Validation("body must be a JSON object".into())),
    }
}

fn parse_body(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, AppError> {
    let Json(value) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    body_to_map(value)
}

pub struct GenericController<E> {
    model: GenericModel<E>,
    validator: RequestValidator,
}

impl<E: Entity> GenericController<E> {
    /// Fails only when a validation pattern does not compile.
    pub fn new(model: GenericModel<E>) -> Result<Self, ConfigError> {
        let validator = RequestValidator::new(&model.config().validation)?;
        Ok(GenericController { model, validator })
    }

    pub fn model(&self) -> &GenericModel<E> {
        &self.model
    }

    pub async fn get_all(&self, params: &HashMap<String, String>) -> Reply<Vec<E>> {
        let opts = FindOptions::from_query(self.model.config(), params);
        let page = self.model.find_all(&opts).await?;
        let message = format!("{} retrieved", self.model.config().resource);
        Ok(success_page(page, message))
    }

    pub async fn get_by_key(&self, params: &HashMap<String, String>) -> Reply<E> {
        let key = extract_path_key(self.model.config(), params)?;
        match self.model.get_by_key(&key).await? {
            Some(entity) => Ok(success_one_ok(entity)),
            None => Err(self.model.not_found(&key).into()),
        }
    }

    pub async fn create(&self, ctx: &RequestContext, body: Map<String, Value>) -> Reply<E> {
        self.validator.validate(&body)?;
        let created = self.model.create(ctx, &body).await??;
        Ok(success_one(created))
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        params: &HashMap<String, String>,
        body: Map<String, Value>,
    ) -> Reply<E> {
        let key = extract_path_key(self.model.config(), params)?;
        self.validator.validate_partial(&body)?;
        let updated = self.model.update(ctx, &key, &body).await??;
        Ok(success_one_ok(updated))
    }

    pub async fn delete(&self, params: &HashMap<String, String>) -> Reply<()> {
        let key = extract_path_key(self.model.config(), params)?;
        self.model.delete(&key).await??;
        Ok(success_message(format!(
            "{} {} deleted",
            self.model.config().resource,
            key.describe()
        )))
    }
}

pub async fn list<E: Entity>(
    State(controller): State<Arc<GenericController<E>>>,
    Query(params): Query<HashMap<String, String>>,
) -> Reply<Vec<E>> {
    controller.get_all(&params).await
}

pub async fn read<E: Entity>(
    State(controller): State<Arc<GenericController<E>>>,
    Path(params): Path<HashMap<String, String>>,
) -> Reply<E> {
    controller.get_by_key(&params).await
}

pub async fn create<E: Entity>(
    ctx: RequestContext,
    State(controller): State<Arc<GenericController<E>>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Reply<E> {
    let body = parse_body(body)?;
    controller.create(&ctx, body).await
}

pub async fn update<E: Entity>(
    ctx: RequestContext,
    State(controller): State<Arc<GenericController<E>>>,
    Path(params): Path<HashMap<String, String>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Reply<E> {
    let body = parse_body(body)?;
    controller.update(&ctx, &params, body).await
}

pub async fn delete<E: Entity>(
    State(controller): State<Arc<GenericController<E>>>,
    Path(params): Path<HashMap<String, String>>,
) -> Reply<()> {
    controller.delete(&params).await
}
