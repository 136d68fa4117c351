use sea_orm::{
    ColumnTrait, EntityName, EntityTrait, IdenStatic, Iterable, PrimaryKeyToColumn,
    sea_query::SimpleExpr,
};
use std::sync::Arc;

use super::{Annotation, FieldKind, Junction, ModelField, ModelIntrospection, Relation};

/// [`ModelIntrospection`] for a Sea-ORM entity.
///
/// Fields, the table name and the primary key come from the entity itself. Relations
/// cannot be followed generically (a `RelationDef` only knows table names), so they are
/// registered by name together with the adapter of the target model.
#[derive(Debug, Clone)]
pub struct EntityModel {
    table: String,
    primary_key: String,
    fields: Vec<ModelField>,
    relations: Vec<Relation>,
    annotations: Vec<Annotation>,
    properties: Vec<String>,
}

impl EntityModel {
    #[must_use]
    pub fn of<E: EntityTrait>() -> Self {
        let fields = E::Column::iter()
            .map(|column| ModelField::new(column.as_str(), FieldKind::from(column.def().get_column_type())))
            .collect();
        let primary_key = E::PrimaryKey::iter()
            .next()
            .map_or_else(|| "id".to_string(), |key| key.into_column().as_str().to_string());

        Self {
            table: E::default().table_name().to_string(),
            primary_key,
            fields,
            relations: Vec::new(),
            annotations: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Override the display label of a field.
    #[must_use]
    pub fn label(mut self, field: &str, label: impl Into<String>) -> Self {
        if let Some(existing) = self.fields.iter_mut().find(|f| f.name == field) {
            existing.verbose_name = label.into();
        }
        self
    }

    /// Register a direct relation: `from` on this entity matches `to` on `target`.
    ///
    /// Works for both directions: `belongs_to` (`author_id -> authors.id`) and
    /// `has_many` (`id -> comments.article_id`).
    #[must_use]
    pub fn relation<F, T>(
        mut self,
        name: impl Into<String>,
        from: F,
        to: T,
        target: impl ModelIntrospection + 'static,
    ) -> Self
    where
        F: ColumnTrait,
        T: ColumnTrait,
    {
        self.relations.push(Relation {
            name: name.into(),
            from_column: from.as_str().to_string(),
            to_column: to.as_str().to_string(),
            through: None,
            target: Arc::new(target),
        });
        self
    }

    /// Register a many-to-many relation going through a junction entity.
    ///
    /// `junction_source` points back at `from`; `junction_target` points at `to`.
    #[must_use]
    pub fn many_to_many<F, JS, JT, T>(
        mut self,
        name: impl Into<String>,
        from: F,
        junction_source: JS,
        junction_target: JT,
        to: T,
        target: impl ModelIntrospection + 'static,
    ) -> Self
    where
        F: ColumnTrait,
        JS: ColumnTrait,
        JT: ColumnTrait,
        T: ColumnTrait,
    {
        let junction = Junction {
            table: JS::EntityName::default().table_name().to_string(),
            source_column: junction_source.as_str().to_string(),
            target_column: junction_target.as_str().to_string(),
        };
        self.relations.push(Relation {
            name: name.into(),
            from_column: from.as_str().to_string(),
            to_column: to.as_str().to_string(),
            through: Some(junction),
            target: Arc::new(target),
        });
        self
    }

    /// Expose a computed expression under `name`.
    #[must_use]
    pub fn annotate(mut self, name: impl Into<String>, expr: impl Into<SimpleExpr>, kind: FieldKind) -> Self {
        self.annotations.push(Annotation {
            name: name.into(),
            expr: expr.into(),
            kind,
        });
        self
    }

    /// Declare a computed (Rust-side) property so serializer fields sourced from it are
    /// never offered as filters.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>) -> Self {
        self.properties.push(name.into());
        self
    }
}

impl ModelIntrospection for EntityModel {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn primary_key(&self) -> &str {
        &self.primary_key
    }

    fn list_fields(&self) -> Vec<ModelField> {
        self.fields.clone()
    }

    fn field(&self, name: &str) -> Option<ModelField> {
        self.fields.iter().find(|field| field.name == name).cloned()
    }

    fn follow_relation(&self, name: &str) -> Option<Relation> {
        self.relations
            .iter()
            .find(|relation| relation.name == name)
            .cloned()
    }

    fn annotations(&self) -> Vec<Annotation> {
        self.annotations.clone()
    }

    fn property_names(&self) -> Vec<String> {
        self.properties.clone()
    }
}
