use std::fmt::{self, Display};

use thiserror::Error;
use warp::http::StatusCode;
use warp::reject::Rejection;

/// HTTP-facing error envelope. Every fallible path in the crate funnels into
/// one of these variants; `api::rejection::handle_rejection` renders them as
/// JSON replies.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    InvalidSession(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InternalServerError(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::FORBIDDEN,
            ApiError::InvalidSession(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn rejection(self) -> Rejection {
        warp::reject::custom(self)
    }
}

impl warp::reject::Reject for ApiError {}

pub struct QueryError {
    info: String,
    unique_violation: bool,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self {
            info,
            unique_violation: false,
        }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Configuration(e) => Self::new(format!("{e}")),
            sqlx::Error::Database(e) => Self {
                // 23505 = unique_violation; racing inserts on a constrained
                // pair must surface as a conflict, not a server error
                unique_violation: e.code().as_deref() == Some("23505"),
                info: format!("{e}"),
            },
            sqlx::Error::Io(e) => Self::new(format!("{e}")),
            sqlx::Error::Tls(e) => Self::new(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::new(format!("{e}")),
            sqlx::Error::RowNotFound => Self::new(format!("RowNotFound")),
            sqlx::Error::TypeNotFound { type_name } => {
                Self::new(format!("Type not found: {type_name}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                Self::new(format!("Column index out of bounds {index} ({len})"))
            }
            sqlx::Error::ColumnNotFound(e) => Self::new(format!("{e}")),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::new(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::new(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::new(format!("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(format!("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(format!("Worker crashed")),
            _ => Self::new(format!("Unknown error")),
        }
    }
}

impl Into<ApiError> for QueryError {
    fn into(self) -> ApiError {
        if self.unique_violation {
            ApiError::Conflict(String::from("Resource already exists"))
        } else {
            log::error!("query failed: {}", self.info);
            ApiError::InternalServerError(self.info)
        }
    }
}

#[derive(Debug)]
pub struct TypeError {
    info: String,
}

impl TypeError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }

    pub fn rejection(self) -> Rejection {
        ApiError::InvalidRequest(self.info).rejection()
    }
}

impl Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.info)
    }
}

impl std::error::Error for TypeError {}

impl Into<ApiError> for TypeError {
    fn into(self) -> ApiError {
        ApiError::InvalidRequest(self.info)
    }
}

impl Into<Rejection> for TypeError {
    fn into(self) -> Rejection {
        ApiError::InvalidRequest(self.info).rejection()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_map_to_http_classes() {
        assert_eq!(
            ApiError::InvalidRequest(String::new()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Conflict(String::new()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::InvalidSession(String::new()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Unauthorized(String::new()).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn type_error_becomes_bad_request() {
        let e: ApiError = TypeError::new("bad field").into();
        assert!(matches!(e, ApiError::InvalidRequest(_)));
    }
}
