use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;

use crate::forms::{FieldErrors, FormField};
use crate::supabase_client::BackendError;

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// One or more form fields failed validation. Keyed by the field's wire name.
    Validation(BTreeMap<&'static str, String>),
    /// Sign-up rejected because the email already has an identity.
    DuplicateEmail,
    /// Error returned by the backend service, message kept verbatim.
    ExternalApiError(String),
    /// Resource not found error.
    NotFound(String),
    /// Bad request error (invalid input).
    BadRequest(String),
    /// Wrong PIN or otherwise refused access.
    Unauthorized(String),
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// The single submission-level message shown above a form's buttons.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(_) => "Please fix the highlighted fields".to_string(),
            AppError::DuplicateEmail => {
                "This email is already registered. Please use another email.".to_string()
            }
            AppError::ExternalApiError(msg)
            | AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::InternalError(msg) => msg.clone(),
            AppError::WithContext { source, context } => {
                format!("{}: {}", context, source.user_message())
            }
        }
    }

    /// HTTP status for the innermost error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DuplicateEmail => StatusCode::CONFLICT,
            AppError::ExternalApiError(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::WithContext { source, .. } => source.status_code(),
        }
    }

    /// Field errors, if this is (or wraps) a validation failure.
    pub fn field_errors(&self) -> Option<&BTreeMap<&'static str, String>> {
        match self {
            AppError::Validation(errors) => Some(errors),
            AppError::WithContext { source, .. } => source.field_errors(),
            _ => None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(errors) => {
                write!(f, "Validation failed on {} field(s)", errors.len())
            }
            AppError::DuplicateEmail => write!(f, "Email already registered"),
            AppError::ExternalApiError(msg) => write!(f, "External API error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Field errors become `{"errors": {field: message}}`; everything else is a
    /// single `{"error": message}` submission message.
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let Some(errors) = self.field_errors() {
            tracing::debug!("Rejected form with {} field error(s)", errors.len());
            return (status, Json(json!({ "errors": errors }))).into_response();
        }

        match &self {
            AppError::ExternalApiError(msg) => tracing::error!("External API error: {}", msg),
            AppError::InternalError(msg) => tracing::error!("Internal error: {}", msg),
            AppError::Unauthorized(msg) => tracing::warn!("Unauthorized access: {}", msg),
            AppError::WithContext { .. } => tracing::error!("Error with context: {}", self),
            _ => {}
        }

        let body = Json(json!({
            "error": self.user_message(),
        }));

        (status, body).into_response()
    }
}

impl<F: FormField> From<FieldErrors<F>> for AppError {
    fn from(errors: FieldErrors<F>) -> Self {
        AppError::Validation(errors.to_keyed())
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::ExternalApiError(err.message)
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }
}

/// Extension for backend errors to add context
impl<T> ResultExt<T> for Result<T, BackendError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::from(e)),
            context: context.into(),
        })
    }
}
