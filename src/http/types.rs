use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::application::record_service::ServiceError;
use crate::domain::record::Labels;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody { pub message: String }

/// Delete answers with this envelope on success and on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteBody { pub success: bool, pub message: String }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation { Fetch, Add, Update, Delete }

impl Operation {
    /// The fixed message a client sees when the store fails.
    pub fn failure_message(self, labels: &Labels) -> String {
        match self {
            Operation::Fetch => format!("Error fetching {}", labels.plural),
            Operation::Add => format!("Error adding {}", labels.singular),
            Operation::Update => format!("Error updating {}", labels.singular),
            Operation::Delete => format!("Error deleting {}", labels.singular),
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    /// Set only for delete, whose envelope carries `success`.
    pub success: Option<bool>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into(), success: None }
    }

    pub fn from_service(err: ServiceError, op: Operation, labels: &Labels) -> Self {
        let success = (op == Operation::Delete).then_some(false);
        match err {
            ServiceError::Validation(message) => Self { status: StatusCode::BAD_REQUEST, message, success },
            ServiceError::NotFound(_) => Self { status: StatusCode::NOT_FOUND, message: format!("{} not found", labels.display), success },
            ServiceError::Persistence(source) => {
                let message = op.failure_message(labels);
                tracing::error!(error = %format!("{source:#}"), "{message}");
                Self { status: StatusCode::INTERNAL_SERVER_ERROR, message, success }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.success {
            Some(success) => (self.status, axum::Json(DeleteBody { success, message: self.message })).into_response(),
            None => (self.status, axum::Json(MessageBody { message: self.message })).into_response(),
        }
    }
}
