use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, put},
    Json, Router,
};

use crate::{
    application::record_service::RecordService,
    domain::record::{NewRecord, RecordId, Resource},
    http::types::{ApiError, DeleteBody, Operation},
};

#[derive(Clone)]
pub struct AppState<S> { pub service: S }

/// Mounts list/create at `/api/<plural>` and update/delete at `/api/<plural>/:id`.
pub fn router<R, S>(state: AppState<S>) -> Router
where
    R: Resource,
    S: RecordService<R> + Clone,
{
    let collection = format!("/api/{}", R::LABELS.plural);
    let item = format!("{collection}/:id");
    Router::new()
        .route(&collection, get(list_records::<R, S>).post(create_record::<R, S>))
        .route(&item, put(update_record::<R, S>).delete(delete_record::<R, S>))
        .with_state(state)
}

async fn list_records<R: Resource, S: RecordService<R>>(State(state): State<AppState<S>>) -> Result<Json<Vec<R>>, ApiError> {
    let records = state.service.list().await.map_err(|e| ApiError::from_service(e, Operation::Fetch, &R::LABELS))?;
    Ok(Json(records))
}

async fn create_record<R: Resource, S: RecordService<R>>(
    State(state): State<AppState<S>>,
    payload: Result<Json<NewRecord>, JsonRejection>,
) -> Result<Json<R>, ApiError> {
    let Json(input) = payload.map_err(invalid_body)?;
    let record = state.service.create(input).await.map_err(|e| ApiError::from_service(e, Operation::Add, &R::LABELS))?;
    Ok(Json(record))
}

/// Answers `null` when lenient validation lets an unknown id through.
async fn update_record<R: Resource, S: RecordService<R>>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    payload: Result<Json<R::Patch>, JsonRejection>,
) -> Result<Json<Option<R>>, ApiError> {
    let Json(patch) = payload.map_err(invalid_body)?;
    let updated = state
        .service
        .update(RecordId(id), patch)
        .await
        .map_err(|e| ApiError::from_service(e, Operation::Update, &R::LABELS))?;
    Ok(Json(updated))
}

async fn delete_record<R: Resource, S: RecordService<R>>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteBody>, ApiError> {
    state
        .service
        .delete(RecordId(id))
        .await
        .map_err(|e| ApiError::from_service(e, Operation::Delete, &R::LABELS))?;
    Ok(Json(DeleteBody { success: true, message: format!("{} deleted", R::LABELS.display) }))
}

fn invalid_body(rejection: JsonRejection) -> ApiError {
    tracing::debug!(error = %rejection, "rejected request body");
    ApiError::bad_request("Invalid request body")
}
