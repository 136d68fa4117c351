//! # Model Introspection
//!
//! The filters never look at a Sea-ORM entity directly. They ask a [`ModelIntrospection`]
//! adapter three questions:
//!
//! - which fields exist ([`list_fields`](ModelIntrospection::list_fields)),
//! - whether a trailing path segment is a lookup a field supports
//!   ([`field_lookup`](ModelIntrospection::field_lookup)),
//! - where a relation leads ([`follow_relation`](ModelIntrospection::follow_relation)).
//!
//! [`EntityModel`] answers them for any Sea-ORM entity, with relations, labels, annotations
//! and computed properties registered explicitly:
//!
//! ```rust,ignore
//! let authors = EntityModel::of::<author::Entity>();
//! let articles = EntityModel::of::<article::Entity>()
//!     .label("title", "Headline")
//!     .relation("author", article::Column::AuthorId, author::Column::Id, authors)
//!     .annotate("title_length", Expr::cust("LENGTH(title)"), FieldKind::Integer);
//! ```

mod entity;

pub use entity::EntityModel;

use sea_orm::{ColumnType, sea_query::SimpleExpr};
use std::{fmt, sync::Arc};

use crate::filtering::lookup::Lookup;

/// Separator between path segments, e.g. `author__name__iexact`.
pub const LOOKUP_SEP: &str = "__";

/// Broad storage class of a field, used for casting and value coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Boolean,
    Text,
    Integer,
    Float,
    Uuid,
    Temporal,
    Enum,
    Json,
    Other,
}

impl FieldKind {
    /// Whether text operators can be applied without casting.
    #[must_use]
    pub const fn is_textual(self) -> bool {
        matches!(self, Self::Text)
    }
}

impl From<&ColumnType> for FieldKind {
    fn from(column_type: &ColumnType) -> Self {
        match column_type {
            ColumnType::Boolean => Self::Boolean,
            ColumnType::Char(_) | ColumnType::String(_) | ColumnType::Text => Self::Text,
            ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::TinyUnsigned
            | ColumnType::SmallUnsigned
            | ColumnType::Unsigned
            | ColumnType::BigUnsigned
            | ColumnType::Year => Self::Integer,
            ColumnType::Float | ColumnType::Double | ColumnType::Decimal(_) | ColumnType::Money(_) => {
                Self::Float
            }
            ColumnType::Uuid => Self::Uuid,
            ColumnType::Date
            | ColumnType::Time
            | ColumnType::DateTime
            | ColumnType::Timestamp
            | ColumnType::TimestampWithTimeZone => Self::Temporal,
            ColumnType::Enum { .. } | ColumnType::Custom(_) => Self::Enum,
            ColumnType::Json | ColumnType::JsonBinary => Self::Json,
            _ => Self::Other,
        }
    }
}

/// A concrete (non-relation) field of a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelField {
    pub name: String,
    /// Human readable name, used as the label under `AllowedFields::All`
    pub verbose_name: String,
    pub kind: FieldKind,
}

impl ModelField {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        Self {
            verbose_name: name.replace('_', " "),
            name,
            kind,
        }
    }
}

/// Junction table of a many-to-many relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Junction {
    pub table: String,
    /// Junction column pointing back at the source model
    pub source_column: String,
    /// Junction column pointing at the target model
    pub target_column: String,
}

/// One hop from a model to a related model.
#[derive(Clone)]
pub struct Relation {
    pub name: String,
    /// Column on the source model
    pub from_column: String,
    /// Column on the target model
    pub to_column: String,
    pub through: Option<Junction>,
    pub target: Arc<dyn ModelIntrospection>,
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("name", &self.name)
            .field("from_column", &self.from_column)
            .field("to_column", &self.to_column)
            .field("through", &self.through)
            .field("target", &self.target.table_name())
            .finish()
    }
}

/// A computed expression exposed under a name, like a SQL select alias.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub name: String,
    pub expr: SimpleExpr,
    pub kind: FieldKind,
}

/// What the filters need to know about a model.
pub trait ModelIntrospection: Send + Sync {
    fn table_name(&self) -> &str;

    /// Column that the `pk` path segment stands for
    fn primary_key(&self) -> &str;

    fn list_fields(&self) -> Vec<ModelField>;

    fn field(&self, name: &str) -> Option<ModelField> {
        self.list_fields().into_iter().find(|field| field.name == name)
    }

    /// The lookup named `lookup` if `field` supports it.
    fn field_lookup(&self, field: &str, lookup: &str) -> Option<Lookup> {
        let field = self.field(field)?;
        Lookup::from_name(lookup).filter(|lookup| lookup.applies_to(field.kind))
    }

    fn follow_relation(&self, name: &str) -> Option<Relation>;

    fn annotations(&self) -> Vec<Annotation> {
        Vec::new()
    }

    fn annotation(&self, name: &str) -> Option<Annotation> {
        self.annotations()
            .into_iter()
            .find(|annotation| annotation.name == name)
    }

    /// Names of computed properties (not stored, so never filterable).
    fn property_names(&self) -> Vec<String> {
        Vec::new()
    }
}
