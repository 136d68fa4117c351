//! Resolution of `__`-separated field paths against a model.
//!
//! A path such as `author__name__iexact` is walked one segment at a time: relations are
//! followed, the first concrete field ends the walk, and an optional last segment names a
//! lookup that field supports. Each relation hop becomes a sub-select, so
//! `author__name` filters `articles.author_id IN (SELECT authors.id FROM authors WHERE ...)`.

use sea_orm::{
    Value,
    sea_query::{Alias, Expr, Query, SimpleExpr},
};
use std::sync::Arc;

use super::lookup::Lookup;
use crate::errors::FilterError;
use crate::introspection::{Annotation, FieldKind, LOOKUP_SEP, ModelIntrospection, Relation};
use crate::settings::FilterSettings;

/// What a resolved path ends on.
#[derive(Debug, Clone)]
enum PathTarget {
    Column {
        table: String,
        column: String,
        kind: FieldKind,
    },
    Annotation(Annotation),
}

#[derive(Debug, Clone)]
struct Hop {
    source_table: String,
    relation: Relation,
}

impl Hop {
    /// `source.from IN (SELECT target.to FROM target WHERE <inner>)`, going through the
    /// junction table for many-to-many relations.
    fn wrap(&self, inner: SimpleExpr) -> SimpleExpr {
        let relation = &self.relation;
        let target_table = relation.target.table_name();
        let matching = Query::select()
            .column((Alias::new(target_table), Alias::new(&relation.to_column)))
            .from(Alias::new(target_table))
            .cond_where(inner)
            .to_owned();

        let source = Expr::col((
            Alias::new(&self.source_table),
            Alias::new(&relation.from_column),
        ));

        match &relation.through {
            None => source.in_subquery(matching),
            Some(junction) => {
                let linked = Query::select()
                    .column((Alias::new(&junction.table), Alias::new(&junction.source_column)))
                    .from(Alias::new(&junction.table))
                    .and_where(
                        Expr::col((Alias::new(&junction.table), Alias::new(&junction.target_column)))
                            .in_subquery(matching),
                    )
                    .to_owned();
                source.in_subquery(linked)
            }
        }
    }
}

/// A field path resolved against a model.
#[derive(Debug, Clone)]
pub struct FieldPath {
    path: String,
    hops: Vec<Hop>,
    target: PathTarget,
    lookup: Option<Lookup>,
}

impl FieldPath {
    /// Walk `path` from `model`.
    ///
    /// # Errors
    ///
    /// `UnknownField` when a segment is neither a field, a relation nor an annotation, and
    /// `UnsupportedLookup` when something other than a supported lookup follows a field.
    pub fn resolve(model: &dyn ModelIntrospection, path: &str) -> Result<Self, FilterError> {
        let mut hops: Vec<Hop> = Vec::new();
        let mut related: Option<Arc<dyn ModelIntrospection>> = None;
        let mut target: Option<PathTarget> = None;
        let mut lookup: Option<Lookup> = None;

        for (index, part) in path.split(LOOKUP_SEP).enumerate() {
            let current: &dyn ModelIntrospection = match &related {
                Some(related) => related.as_ref(),
                None => model,
            };

            if lookup.is_some() {
                return Err(FilterError::unknown_field(path, part));
            }

            if let Some(reached) = &target {
                let supported = match reached {
                    PathTarget::Column { column, .. } => current.field_lookup(column, part),
                    PathTarget::Annotation(annotation) => {
                        Lookup::from_name(part).filter(|l| l.applies_to(annotation.kind))
                    }
                };
                match supported {
                    Some(found) => {
                        lookup = Some(found);
                        continue;
                    }
                    None => {
                        return Err(FilterError::UnsupportedLookup {
                            field: path.to_string(),
                            lookup: part.to_string(),
                        });
                    }
                }
            }

            let name = if part == "pk" {
                current.primary_key().to_string()
            } else {
                part.to_string()
            };

            if index == 0
                && let Some(annotation) = current.annotation(&name)
            {
                target = Some(PathTarget::Annotation(annotation));
                continue;
            }

            if let Some(field) = current.field(&name) {
                target = Some(PathTarget::Column {
                    table: current.table_name().to_string(),
                    column: field.name,
                    kind: field.kind,
                });
                continue;
            }

            if let Some(relation) = current.follow_relation(&name) {
                let source_table = current.table_name().to_string();
                let next = Arc::clone(&relation.target);
                hops.push(Hop {
                    source_table,
                    relation,
                });
                related = Some(next);
                continue;
            }

            // A lookup straight after a relation applies to the related primary key
            if index > 0
                && related.is_some()
                && let Some(found) = current.field_lookup(current.primary_key(), part)
            {
                let column = current.primary_key().to_string();
                let kind = current.field(&column).map_or(FieldKind::Other, |f| f.kind);
                target = Some(PathTarget::Column {
                    table: current.table_name().to_string(),
                    column,
                    kind,
                });
                lookup = Some(found);
                continue;
            }

            return Err(FilterError::unknown_field(path, part));
        }

        let target = match (target, related) {
            (Some(target), _) => target,
            // Path ends on a relation: compare the related primary key
            (None, Some(related)) => {
                let column = related.primary_key().to_string();
                let kind = related.field(&column).map_or(FieldKind::Other, |f| f.kind);
                PathTarget::Column {
                    table: related.table_name().to_string(),
                    column,
                    kind,
                }
            }
            (None, None) => return Err(FilterError::unknown_field(path, path)),
        };

        Ok(Self {
            path: path.to_string(),
            hops,
            target,
            lookup,
        })
    }

    /// The path as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Lookup named by the last path segment, if any.
    #[must_use]
    pub const fn lookup(&self) -> Option<Lookup> {
        self.lookup
    }

    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match &self.target {
            PathTarget::Column { kind, .. } => *kind,
            PathTarget::Annotation(annotation) => annotation.kind,
        }
    }

    #[must_use]
    pub fn traverses_relations(&self) -> bool {
        !self.hops.is_empty()
    }

    fn target_expr(&self) -> SimpleExpr {
        match &self.target {
            PathTarget::Column { table, column, .. } => {
                Expr::col((Alias::new(table), Alias::new(column))).into()
            }
            PathTarget::Annotation(annotation) => annotation.expr.clone(),
        }
    }

    fn wrap(&self, predicate: SimpleExpr) -> SimpleExpr {
        self.hops
            .iter()
            .rev()
            .fold(predicate, |inner, hop| hop.wrap(inner))
    }

    /// `<path> <lookup> <term>`, with relation hops turned into sub-selects.
    #[must_use]
    pub fn predicate(&self, lookup: Lookup, term: &str, settings: &FilterSettings) -> SimpleExpr {
        self.wrap(lookup.predicate(self.target_expr(), self.kind(), term, settings))
    }

    /// `<path> = <value>`, with relation hops turned into sub-selects.
    #[must_use]
    pub fn equals(&self, value: impl Into<Value>) -> SimpleExpr {
        self.wrap(Expr::expr(self.target_expr()).eq(value.into()))
    }
}
