use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use super::domain::ApplicationStatus;
use super::repository::RepositoryError;
use crate::identity::{Role, RoleMismatch};

/// Coarse classification callers (and the HTTP layer) branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Conflict,
    Invalid,
    Unavailable,
}

impl ErrorKind {
    pub const fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Invalid => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Rejections raised by the job, application, and user services. Everything outside the
/// `Unavailable` kind is a business-rule rejection the caller can correct.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("Job not found")]
    JobNotFound,
    #[error("Application not found")]
    ApplicationNotFound,
    #[error("User not found")]
    UserNotFound,
    #[error("Only {required} accounts can perform this operation")]
    WrongRole { required: Role },
    #[error("This job is no longer active")]
    JobInactive,
    #[error("You have already applied for this job")]
    DuplicateApplication,
    #[error("You cannot apply to your own job posting")]
    SelfApplicationForbidden,
    #[error("You can only withdraw your own applications")]
    NotOwner,
    #[error("You can only manage applications and postings for your own jobs")]
    NotJobOwner,
    #[error("Application is already withdrawn")]
    AlreadyWithdrawn,
    #[error("Cannot withdraw application with status: {0}")]
    TerminalStatus(ApplicationStatus),
    #[error("Cannot update status of withdrawn application")]
    WithdrawnImmutable,
    #[error("Only job seekers can withdraw applications")]
    SeekerOnlyTransition,
    #[error("You don't have permission to view this application")]
    Forbidden,
    #[error("Application status changed concurrently to {0}; retry with the current state")]
    ConcurrentTransition(ApplicationStatus),
    #[error("Email is already in use")]
    EmailTaken,
    #[error("{0}")]
    Invalid(String),
    #[error("unable to issue token: {0}")]
    TokenIssue(String),
    #[error(transparent)]
    Repository(RepositoryError),
}

impl BoardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BoardError::JobNotFound | BoardError::ApplicationNotFound | BoardError::UserNotFound => {
                ErrorKind::NotFound
            }
            BoardError::WrongRole { .. }
            | BoardError::NotOwner
            | BoardError::NotJobOwner
            | BoardError::Forbidden => ErrorKind::Forbidden,
            BoardError::JobInactive
            | BoardError::DuplicateApplication
            | BoardError::SelfApplicationForbidden
            | BoardError::AlreadyWithdrawn
            | BoardError::TerminalStatus(_)
            | BoardError::WithdrawnImmutable
            | BoardError::SeekerOnlyTransition
            | BoardError::ConcurrentTransition(_)
            | BoardError::EmailTaken => ErrorKind::Conflict,
            BoardError::Invalid(_) => ErrorKind::Invalid,
            BoardError::TokenIssue(_) | BoardError::Repository(_) => ErrorKind::Unavailable,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        BoardError::Invalid(message.into())
    }
}

impl From<RepositoryError> for BoardError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::StaleStatus { found } => BoardError::ConcurrentTransition(found),
            other => BoardError::Repository(other),
        }
    }
}

impl From<RoleMismatch> for BoardError {
    fn from(value: RoleMismatch) -> Self {
        BoardError::WrongRole {
            required: value.required,
        }
    }
}

impl IntoResponse for BoardError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        if kind == ErrorKind::Unavailable {
            tracing::error!(error = %self, "board operation failed");
        }
        let body = Json(json!({ "error": self.to_string(), "kind": kind }));
        (kind.status_code(), body).into_response()
    }
}
