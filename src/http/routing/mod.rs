pub mod records;

use axum::{routing::get, Router};

use crate::application::record_service::RecordService;
use crate::domain::{feedback::Feedback, todo::Todo};

use records::AppState;

/// Both resource families plus a liveness probe, sharing one service.
pub fn app<S>(service: S) -> Router
where
    S: RecordService<Todo> + RecordService<Feedback> + Clone,
{
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(records::router::<Todo, S>(AppState { service: service.clone() }))
        .merge(records::router::<Feedback, S>(AppState { service }))
}
