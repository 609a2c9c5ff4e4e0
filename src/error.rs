use thiserror::Error;

/// How the console surfaces an error to the operator.
///
/// Nothing is fatal: every kind is recovered by showing a message and
/// leaving prior state intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transient toast notification, no retry.
    Toast,
    /// One or more field names are added to the failing-field set.
    FieldCheck,
    /// The operator is sent back to the login page.
    RedirectLogin,
}

/// Error type shared by the client, the form logic and the HTTP relay.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server responded with status {status}")]
    Server { status: u16 },

    #[error("please input fields: {}", fields.join(", "))]
    Validation { fields: Vec<String> },

    #[error("unauthorized")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error("malformed category hierarchy at node {node_id}")]
    MalformedHierarchy { node_id: String },

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AdminError {
    /// Classify the error the way the console reacts to it.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdminError::Validation { .. } => ErrorKind::FieldCheck,
            AdminError::Unauthorized | AdminError::NotFound => ErrorKind::RedirectLogin,
            _ => ErrorKind::Toast,
        }
    }

    /// Map a non-success backend status to an error.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => AdminError::Unauthorized,
            404 => AdminError::NotFound,
            _ => AdminError::Server { status },
        }
    }
}

impl From<reqwest::Error> for AdminError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return AdminError::Decode(err.to_string());
        }
        match err.status() {
            Some(status) => AdminError::from_status(status.as_u16()),
            None => AdminError::Network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for AdminError {
    fn from(err: serde_json::Error) -> Self {
        AdminError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AdminError>;

#[cfg(feature = "web")]
mod response {
    use super::AdminError;
    use axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    };

    impl AdminError {
        pub fn status_code(&self) -> StatusCode {
            match self {
                AdminError::Network(_) | AdminError::Decode(_) => StatusCode::BAD_GATEWAY,
                AdminError::Server { status } => {
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
                }
                AdminError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                AdminError::Unauthorized => StatusCode::UNAUTHORIZED,
                AdminError::NotFound => StatusCode::NOT_FOUND,
                AdminError::MalformedHierarchy { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                AdminError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    }

    impl IntoResponse for AdminError {
        fn into_response(self) -> Response {
            let status = self.status_code();
            let body = match &self {
                AdminError::Validation { fields } => serde_json::json!({
                    "status": "error",
                    "message": self.to_string(),
                    "fields": fields,
                }),
                _ => serde_json::json!({
                    "status": "error",
                    "message": self.to_string(),
                }),
            };
            (status, Json(body)).into_response()
        }
    }
}
