//! Filter backends turning list-endpoint query strings into Sea-ORM conditions.
//!
//! - [`ConditionalFilter`]: `?conditional=published,-featured`
//! - [`FieldsFilter`]: `?search=rust "error handling"`
//!
//! Both read a [`FilterView`] (the model adapter plus the view's allow-lists) and
//! [`FilterSettings`], and both document their query parameter for OpenAPI.

pub mod errors;
pub mod filtering;
pub mod html;
pub mod introspection;
pub mod params;
pub mod schema;
pub mod serializer;
pub mod settings;
pub mod view;

#[cfg(test)]
mod testing;

pub use errors::FilterError;
pub use filtering::{
    ConditionalFilter, FieldPath, FieldsFilter, FilterBackend, FilterBackends, Lookup,
    SearchLookup, ValidField, search_smart_split,
};
pub use introspection::{EntityModel, FieldKind, ModelField, ModelIntrospection};
pub use params::QueryParams;
pub use schema::CoreApiField;
pub use serializer::{DeclaredFields, SchemaSerializer, SerializerField, SerializerFields};
pub use settings::{Backend, FilterSettings, SearchMode};
pub use view::{AllowedFields, FilterView, ViewConfig};
