//! # Filter Backends
//!
//! Query parameter to Sea-ORM condition translation for list endpoints.
//!
//! ## Main Components
//!
//! - **[`ConditionalFilter`]**: `?conditional=published,-featured` requires boolean fields to
//!   be true (or false when prefixed with `-`)
//! - **[`FieldsFilter`]**: `?search=rust async` requires every term to match at least one of
//!   the view's search fields
//! - **[`FilterBackends`]**: applies several backends in order and collects their
//!   documentation
//!
//! ## Query Parameter Examples
//!
//! ```rust,ignore
//! // Only published articles that are not featured
//! GET /articles?conditional=published,-featured
//!
//! // Unknown tokens are ignored
//! GET /articles?conditional=published,bogus
//!
//! // Every term must match title, code (prefix) or the author's name
//! GET /articles?search=rust "error handling"
//! ```
//!
//! ## Search Field Prefixes
//!
//! | Prefix | Lookup        | Example        |
//! |--------|---------------|----------------|
//! | `^`    | `istartswith` | `^code`        |
//! | `=`    | `iexact`      | `=email`       |
//! | `@`    | `search`      | `@body`        |
//! | `$`    | `iregex`      | `$slug`        |
//! | none   | `icontains`, or the trailing lookup of the path | `title`, `views__gte` |
//!
//! ## Usage in Handlers
//!
//! ```rust,ignore
//! let filters = FilterBackends::new()
//!     .with(ConditionalFilter::new(&settings))
//!     .with(FieldsFilter::new(&settings));
//!
//! async fn list(State(state): State<AppState>, params: QueryParams) -> Result<Json<Vec<article::Model>>, FilterError> {
//!     let query = state.filters.filter_query(&params, article::Entity::find(), &state.view)?;
//!     Ok(Json(query.all(&state.db).await?))
//! }
//! ```

pub mod conditional;
pub mod lookup;
pub mod path;
pub mod search;

pub use conditional::{ConditionalFilter, ValidField};
pub use lookup::Lookup;
pub use path::FieldPath;
pub use search::{FieldsFilter, SearchLookup, search_smart_split};

use sea_orm::{Condition, QueryFilter};
use utoipa::openapi::path::{Operation, Parameter};

use crate::errors::FilterError;
use crate::params::QueryParams;
use crate::schema::CoreApiField;
use crate::view::FilterView;

/// A backend turning request parameters into a condition.
pub trait FilterBackend: Send + Sync {
    /// Type name used in configuration errors and logs.
    fn name(&self) -> &'static str;

    /// Condition for this request, or `None` when the query should be left alone.
    ///
    /// # Errors
    ///
    /// Configuration problems of the view or filter, and rejected search input.
    fn condition(
        &self,
        params: &QueryParams,
        view: &dyn FilterView,
    ) -> Result<Option<Condition>, FilterError>;

    /// Apply [`condition`](FilterBackend::condition) to a Sea-ORM query.
    ///
    /// # Errors
    ///
    /// Whatever [`condition`](FilterBackend::condition) returns.
    fn filter_query<Q>(
        &self,
        params: &QueryParams,
        query: Q,
        view: &dyn FilterView,
    ) -> Result<Q, FilterError>
    where
        Q: QueryFilter,
        Self: Sized,
    {
        Ok(match self.condition(params, view)? {
            Some(condition) => query.filter(condition),
            None => query,
        })
    }

    /// HTML control for browsable APIs.
    ///
    /// # Errors
    ///
    /// Template rendering failures.
    fn to_html(
        &self,
        _params: &QueryParams,
        _view: &dyn FilterView,
    ) -> Result<Option<String>, FilterError> {
        Ok(None)
    }

    /// Legacy (CoreAPI) description of the query parameter.
    fn schema_fields(&self) -> Vec<CoreApiField>;

    /// OpenAPI description of the query parameter.
    fn schema_operation_parameters(&self) -> Vec<Parameter>;
}

/// Ordered list of backends applied to the same query.
#[derive(Default)]
pub struct FilterBackends {
    backends: Vec<Box<dyn FilterBackend>>,
}

impl FilterBackends {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, backend: impl FilterBackend + 'static) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Conjunction of every backend's condition.
    ///
    /// # Errors
    ///
    /// The first error returned by a backend.
    pub fn condition(
        &self,
        params: &QueryParams,
        view: &dyn FilterView,
    ) -> Result<Option<Condition>, FilterError> {
        let mut combined: Option<Condition> = None;
        for backend in &self.backends {
            if let Some(condition) = backend.condition(params, view)? {
                combined = Some(combined.unwrap_or_else(Condition::all).add(condition));
            }
        }
        Ok(combined)
    }

    /// # Errors
    ///
    /// The first error returned by a backend.
    pub fn filter_query<Q: QueryFilter>(
        &self,
        params: &QueryParams,
        query: Q,
        view: &dyn FilterView,
    ) -> Result<Q, FilterError> {
        Ok(match self.condition(params, view)? {
            Some(condition) => query.filter(condition),
            None => query,
        })
    }

    /// Rendered controls of the backends that have one.
    ///
    /// # Errors
    ///
    /// The first rendering error.
    pub fn to_html(
        &self,
        params: &QueryParams,
        view: &dyn FilterView,
    ) -> Result<Vec<String>, FilterError> {
        let mut controls = Vec::new();
        for backend in &self.backends {
            if let Some(html) = backend.to_html(params, view)? {
                controls.push(html);
            }
        }
        Ok(controls)
    }

    #[must_use]
    pub fn schema_fields(&self) -> Vec<CoreApiField> {
        self.backends
            .iter()
            .flat_map(|backend| backend.schema_fields())
            .collect()
    }

    #[must_use]
    pub fn schema_operation_parameters(&self) -> Vec<Parameter> {
        self.backends
            .iter()
            .flat_map(|backend| backend.schema_operation_parameters())
            .collect()
    }

    /// Append the backends' query parameters to an OpenAPI operation.
    pub fn document(&self, operation: &mut Operation) {
        operation
            .parameters
            .get_or_insert_with(Vec::new)
            .extend(self.schema_operation_parameters());
    }
}
