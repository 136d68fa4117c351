//! Query parameter documentation in the two formats API generators consume.

use serde::Serialize;
use utoipa::openapi::{
    RefOr, Required,
    path::{Parameter, ParameterBuilder, ParameterIn},
    schema::{ObjectBuilder, Schema, Type},
};

/// Schema of a legacy (CoreAPI style) field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CoreSchema {
    String { title: String, description: String },
}

/// A query parameter described the CoreAPI way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoreApiField {
    pub name: String,
    pub required: bool,
    pub location: &'static str,
    pub schema: CoreSchema,
}

impl CoreApiField {
    /// Optional string parameter read from the query string.
    #[must_use]
    pub fn query(name: &str, title: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            required: false,
            location: "query",
            schema: CoreSchema::String {
                title: title.to_string(),
                description: description.to_string(),
            },
        }
    }
}

/// Optional string parameter read from the query string, as an OpenAPI 3 parameter.
#[must_use]
pub fn query_parameter(name: &str, description: &str) -> Parameter {
    ParameterBuilder::new()
        .name(name)
        .parameter_in(ParameterIn::Query)
        .required(Required::False)
        .description(Some(description))
        .schema(Some(RefOr::T(Schema::Object(
            ObjectBuilder::new().schema_type(Type::String).build(),
        ))))
        .build()
}
