use axum::{
    Json,
    extract::{Path, Query, State},
};
use bson::Document as BsonDocument;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::ApiError;
use crate::document::{from_json, to_json};
use crate::query::{DeleteReport, InsertReport, UpdateReport};
use crate::service::VisaService;
use crate::visa::VisaListQuery;

pub const LIVENESS_TEXT: &str = "Visa Navigator server is running...!";

/// Write acknowledgment: `{"acknowledged": true, ...report fields}`.
#[derive(Debug, Serialize)]
pub struct Acknowledged<T> {
    pub acknowledged: bool,
    #[serde(flatten)]
    pub report: T,
}

impl<T> From<T> for Acknowledged<T> {
    fn from(report: T) -> Self {
        Self { acknowledged: true, report }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// A JSON body is optional: a request without `Content-Type` counts as `{}`.
type JsonBody = Option<Json<Map<String, Value>>>;

fn body(payload: JsonBody) -> Result<BsonDocument, ApiError> {
    let obj = payload.map(|Json(obj)| obj).unwrap_or_default();
    from_json(&obj).map_err(|e| ApiError::MalformedPayload(e.to_string()))
}

fn records(docs: &[BsonDocument]) -> Vec<Value> {
    docs.iter().map(to_json).collect()
}

pub async fn liveness_handler() -> &'static str {
    LIVENESS_TEXT
}

pub async fn add_visa_handler(
    State(svc): State<VisaService>,
    payload: JsonBody,
) -> ApiResult<Acknowledged<InsertReport>> {
    let report = svc.add_visa(body(payload)?).await?;
    Ok(Json(report.into()))
}

pub async fn get_visas_handler(
    State(svc): State<VisaService>,
    Query(query): Query<VisaListQuery>,
) -> ApiResult<Vec<Value>> {
    Ok(Json(records(&svc.get_visas(&query).await?)))
}

pub async fn latest_visas_handler(State(svc): State<VisaService>) -> ApiResult<Vec<Value>> {
    Ok(Json(records(&svc.latest_visas().await?)))
}

/// Missing records render as a JSON `null` body with status 200.
pub async fn visa_details_handler(
    State(svc): State<VisaService>,
    Path(id): Path<String>,
) -> ApiResult<Option<Value>> {
    Ok(Json(svc.visa_details(&id).await?.as_ref().map(to_json)))
}

pub async fn my_added_visas_handler(
    State(svc): State<VisaService>,
    Query(q): Query<EmailQuery>,
) -> ApiResult<Vec<Value>> {
    Ok(Json(records(&svc.my_added_visas(q.email.as_deref()).await?)))
}

pub async fn update_visa_handler(
    State(svc): State<VisaService>,
    Path(id): Path<String>,
    payload: JsonBody,
) -> ApiResult<Acknowledged<UpdateReport>> {
    let payload = body(payload)?;
    Ok(Json(svc.update_visa(&id, &payload).await?.into()))
}

pub async fn delete_visa_handler(
    State(svc): State<VisaService>,
    Path(id): Path<String>,
) -> ApiResult<Acknowledged<DeleteReport>> {
    Ok(Json(svc.delete_visa(&id).await?.into()))
}

pub async fn add_applied_visa_handler(
    State(svc): State<VisaService>,
    payload: JsonBody,
) -> ApiResult<Acknowledged<InsertReport>> {
    let report = svc.add_applied_visa(body(payload)?).await?;
    Ok(Json(report.into()))
}

pub async fn applied_visas_handler(
    State(svc): State<VisaService>,
    Query(q): Query<EmailQuery>,
) -> ApiResult<Vec<Value>> {
    Ok(Json(records(&svc.applied_visas(q.email.as_deref()).await?)))
}

pub async fn delete_applied_visa_handler(
    State(svc): State<VisaService>,
    Path(id): Path<String>,
) -> ApiResult<Acknowledged<DeleteReport>> {
    Ok(Json(svc.delete_applied_visa(&id).await?.into()))
}
