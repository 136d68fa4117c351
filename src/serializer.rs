//! Declared fields of the representation a view exposes.
//!
//! When a view does not list its conditional fields explicitly, the valid fields are the
//! readable fields of its serializer. Anything that can enumerate `(name, source, label,
//! write_only)` works; [`SchemaSerializer`] reads them from a utoipa schema so the response
//! type of a view can double as its serializer.

use utoipa::{ToSchema, openapi::{RefOr, Schema}};

/// Source value meaning "the whole object" rather than one attribute.
pub const WHOLE_OBJECT_SOURCE: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializerField {
    pub name: String,
    /// Dotted attribute path on the model; empty means the field name itself
    pub source: String,
    pub label: String,
    pub write_only: bool,
}

/// `is_verified` -> `Is verified`
fn default_label(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

impl SerializerField {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            source: name.clone(),
            label: default_label(&name),
            name,
            write_only: false,
        }
    }

    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub const fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }

    /// Field path used for filtering: the source with `.` turned into `__`.
    #[must_use]
    pub fn filter_key(&self) -> String {
        if self.source.is_empty() {
            self.name.clone()
        } else {
            self.source.replace('.', "__")
        }
    }
}

pub trait SerializerFields: Send + Sync {
    fn fields(&self) -> Vec<SerializerField>;
}

/// A fixed list of fields.
#[derive(Debug, Clone, Default)]
pub struct DeclaredFields(pub Vec<SerializerField>);

impl SerializerFields for DeclaredFields {
    fn fields(&self) -> Vec<SerializerField> {
        self.0.clone()
    }
}

impl FromIterator<SerializerField> for DeclaredFields {
    fn from_iter<I: IntoIterator<Item = SerializerField>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Fields read from the OpenAPI schema of a `ToSchema` type.
///
/// Property titles become labels and `#[schema(write_only)]` properties are marked
/// write-only.
#[derive(Debug, Clone)]
pub struct SchemaSerializer {
    fields: Vec<SerializerField>,
}

impl SchemaSerializer {
    #[must_use]
    pub fn of<T: ToSchema>() -> Self {
        let fields = match T::schema() {
            RefOr::T(Schema::Object(object)) => object
                .properties
                .iter()
                .map(|(name, property)| {
                    let mut field = SerializerField::new(name.as_str());
                    if let RefOr::T(Schema::Object(property)) = property {
                        if let Some(title) = &property.title {
                            field.label.clone_from(title);
                        }
                        field.write_only = property.write_only.unwrap_or(false);
                    }
                    field
                })
                .collect(),
            _ => Vec::new(),
        };
        Self { fields }
    }

    /// Point a property at a different model attribute, e.g. `("author_name", "author.name")`.
    #[must_use]
    pub fn source(mut self, name: &str, source: impl Into<String>) -> Self {
        if let Some(field) = self.fields.iter_mut().find(|f| f.name == name) {
            field.source = source.into();
        }
        self
    }
}

impl SerializerFields for SchemaSerializer {
    fn fields(&self) -> Vec<SerializerField> {
        self.fields.clone()
    }
}
