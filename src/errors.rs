//! # Error Handling for Filter Backends
//!
//! Filter backends fail in two very different ways:
//!
//! - **Misconfiguration** of the view or the filter (no serializer and no allow-list, a
//!   search field naming a column that does not exist). These are programmer errors; the
//!   details are logged server-side and the client gets a generic 500.
//! - **Bad input** from the client (a search term containing NUL characters). These are
//!   reported back as a 400 with a user-facing message.
//!
//! Unknown or invalid tokens in the `conditional` parameter are *not* errors: they are
//! dropped before the condition is built.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crudcrate_filters::{FilterBackend, FilterError, QueryParams};
//!
//! async fn list(
//!     State(state): State<AppState>,
//!     params: QueryParams,
//! ) -> Result<Json<Vec<article::Model>>, FilterError> {
//!     let query = state.filters.filter_query(&params, article::Entity::find(), &state.view)?;
//!     Ok(Json(query.all(&state.db).await?))
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;

/// Errors produced while turning query parameters into conditions.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The view does not provide what the filter needs to work out its valid fields.
    #[error("{filter}: {message}")]
    ImproperlyConfigured {
        /// Name of the filter type that rejected the view
        filter: &'static str,
        message: String,
    },

    /// A configured field path names something the model does not have.
    #[error("cannot resolve '{part}' in field path '{path}'")]
    UnknownField { path: String, part: String },

    /// A lookup was requested where it cannot be applied.
    #[error("lookup '{lookup}' is not supported on '{field}'")]
    UnsupportedLookup { field: String, lookup: String },

    /// The raw search value was rejected before splitting.
    #[error("{0}")]
    InvalidSearchTerm(String),

    /// Rendering a browsable-API control failed.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// Passed through untouched from Sea-ORM.
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl FilterError {
    pub(crate) fn improperly_configured(filter: &'static str, message: impl Into<String>) -> Self {
        Self::ImproperlyConfigured {
            filter,
            message: message.into(),
        }
    }

    pub(crate) fn unknown_field(path: &str, part: &str) -> Self {
        Self::UnknownField {
            path: path.to_string(),
            part: part.to_string(),
        }
    }

    /// HTTP status code this error maps to
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidSearchTerm(_) => StatusCode::BAD_REQUEST,
            Self::ImproperlyConfigured { .. }
            | Self::UnknownField { .. }
            | Self::UnsupportedLookup { .. }
            | Self::Template(_)
            | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to send to clients
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidSearchTerm(message) => message.clone(),
            Self::Database(_) => "A database error occurred".to_string(),
            _ => "The server is not configured correctly for this request".to_string(),
        }
    }

    fn log_internal(&self) {
        match self {
            Self::InvalidSearchTerm(message) => {
                tracing::debug!(error = %message, "Rejected search input");
            }
            Self::Database(internal) => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            _ => {
                tracing::error!(error = %self, "Filter configuration error");
            }
        }
    }
}

/// Error response sent to users (sanitized)
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for FilterError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let body = ErrorResponse {
            error: self.user_message(),
        };

        (status, Json(body)).into_response()
    }
}
