//! `?search=rust "error handling"`
//!
//! The search value is split into terms (quoted phrases stay whole) and every term must match
//! at least one of the view's search fields:
//!
//! ```text
//! filter_fields = ["title", "^code"], search = "foo bar"
//!
//! (title icontains foo OR code istartswith foo) AND (title icontains bar OR code istartswith bar)
//! ```

use regex::Regex;
use sea_orm::{Condition, sea_query::SimpleExpr};
use serde::Serialize;
use std::sync::LazyLock;
use utoipa::openapi::path::Parameter;

use super::FilterBackend;
use super::lookup::Lookup;
use super::path::FieldPath;
use crate::errors::FilterError;
use crate::html::{self, SEARCH_TEMPLATE};
use crate::introspection::{LOOKUP_SEP, ModelIntrospection};
use crate::params::QueryParams;
use crate::schema::{CoreApiField, query_parameter};
use crate::settings::{FilterSettings, SearchMode};
use crate::view::FilterView;

pub const SEARCH_TITLE: &str = "Search";
pub const SEARCH_DESCRIPTION: &str = "A search term.";

const FILTER_NAME: &str = "FieldsFilter";

/// Whitespace separated words, where a word may contain single or double quoted sections
/// (with backslash escapes) that keep their whitespace.
static SMART_SPLIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"((?:[^\s'"]*(?:(?:"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')[^\s'"]*)+)|\S+)"#)
        .expect("valid smart split regex")
});

/// Strip the surrounding quotes of `"..."` / `'...'` and undo `\"` and `\\` escapes.
fn unquote(term: &str) -> Option<String> {
    let quote = term.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    if term.len() < 2 || !term.ends_with(quote) {
        return None;
    }
    let inner = &term[1..term.len() - 1];
    Some(
        inner
            .replace(&format!("\\{quote}"), &quote.to_string())
            .replace("\\\\", "\\"),
    )
}

/// Split a search value into terms.
///
/// Quoted phrases become one term without their quotes. Other words are also split on
/// commas; empty pieces are dropped.
///
/// ```rust
/// use crudcrate_filters::search_smart_split;
///
/// assert_eq!(
///     search_smart_split(r#"rust "error handling" a,b"#),
///     vec!["rust", "error handling", "a", "b"]
/// );
/// ```
#[must_use]
pub fn search_smart_split(value: &str) -> Vec<String> {
    let mut terms = Vec::new();
    for found in SMART_SPLIT.find_iter(value) {
        let term = found.as_str().trim_matches(',');
        if let Some(phrase) = unquote(term) {
            terms.push(phrase);
            continue;
        }
        terms.extend(
            term.split(',')
                .map(str::trim)
                .filter(|piece| !piece.is_empty())
                .map(str::to_string),
        );
    }
    terms
}

/// A search field resolved to the lookup it is searched with.
#[derive(Debug, Clone)]
pub struct SearchLookup {
    pub path: FieldPath,
    pub lookup: Lookup,
}

impl SearchLookup {
    /// The lookup written as an ORM path, e.g. `author__name__icontains`.
    #[must_use]
    pub fn orm_lookup(&self) -> String {
        if self.path.lookup().is_some() {
            self.path.as_str().to_string()
        } else {
            format!("{}{LOOKUP_SEP}{}", self.path.as_str(), self.lookup)
        }
    }

    #[must_use]
    pub fn predicate(&self, term: &str, settings: &FilterSettings) -> SimpleExpr {
        self.path.predicate(self.lookup, term, settings)
    }
}

#[derive(Serialize)]
struct SearchContext<'a> {
    title: &'a str,
    param: &'a str,
    term: &'a str,
}

/// Filters a query down to rows matching every search term in at least one field.
#[derive(Debug, Clone)]
pub struct FieldsFilter {
    param: String,
    title: String,
    description: String,
    settings: FilterSettings,
}

impl Default for FieldsFilter {
    fn default() -> Self {
        Self::new(&FilterSettings::default())
    }
}

impl FieldsFilter {
    #[must_use]
    pub fn new(settings: &FilterSettings) -> Self {
        Self {
            param: settings.search_param.clone(),
            title: SEARCH_TITLE.to_string(),
            description: SEARCH_DESCRIPTION.to_string(),
            settings: settings.clone(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn param(&self) -> &str {
        &self.param
    }

    /// Search fields for this request.
    #[must_use]
    pub fn search_fields(view: &dyn FilterView, params: &QueryParams) -> Option<Vec<String>> {
        view.filter_fields(params)
    }

    /// Terms of the `param` query parameter.
    ///
    /// # Errors
    ///
    /// `InvalidSearchTerm` when the value contains NUL characters.
    pub fn search_terms(params: &QueryParams, param: &str) -> Result<Vec<String>, FilterError> {
        let value = params.get(param).unwrap_or_default();
        if value.contains('\0') {
            return Err(FilterError::InvalidSearchTerm(
                "Null characters are not allowed.".to_string(),
            ));
        }
        Ok(search_smart_split(value))
    }

    /// Work out which lookup a configured search field is searched with.
    ///
    /// A `^`, `=`, `@` or `$` prefix fixes the lookup. Otherwise a trailing lookup in the path
    /// is used as written, and anything else gets `icontains`.
    ///
    /// # Errors
    ///
    /// The path does not resolve against `model`, or a prefixed path also names a lookup.
    pub fn construct_search(
        field: &str,
        model: &dyn ModelIntrospection,
    ) -> Result<SearchLookup, FilterError> {
        let prefixed = field.chars().next().and_then(Lookup::from_prefix);

        let search = match prefixed {
            Some(lookup) => {
                let path = FieldPath::resolve(model, &field[1..])?;
                if let Some(written) = path.lookup() {
                    return Err(FilterError::UnsupportedLookup {
                        field: field.to_string(),
                        lookup: written.to_string(),
                    });
                }
                SearchLookup { path, lookup }
            }
            None => {
                let path = FieldPath::resolve(model, field)?;
                let lookup = path.lookup().unwrap_or(Lookup::IContains);
                SearchLookup { path, lookup }
            }
        };

        tracing::trace!(field, lookup = %search.orm_lookup(), "Resolved search lookup");
        Ok(search)
    }

    fn combined_condition(
        &self,
        fields: &[String],
        params: &QueryParams,
        model: &dyn ModelIntrospection,
    ) -> Result<Option<Condition>, FilterError> {
        let terms = Self::search_terms(params, &self.param)?;
        if terms.is_empty() {
            return Ok(None);
        }

        let lookups = fields
            .iter()
            .map(|field| Self::construct_search(field, model))
            .collect::<Result<Vec<_>, _>>()?;

        let condition = terms.iter().fold(Condition::all(), |all, term| {
            let any = lookups.iter().fold(Condition::any(), |any, lookup| {
                any.add(lookup.predicate(term, &self.settings))
            });
            all.add(any)
        });
        Ok(Some(condition))
    }

    /// Each field reads its own parameter, named after the field without its prefix.
    fn per_field_condition(
        &self,
        fields: &[String],
        params: &QueryParams,
        model: &dyn ModelIntrospection,
    ) -> Result<Option<Condition>, FilterError> {
        let mut condition: Option<Condition> = None;
        for field in fields {
            let param = field
                .strip_prefix(|c: char| Lookup::from_prefix(c).is_some())
                .unwrap_or(field);
            let terms = Self::search_terms(params, param)?;
            if terms.is_empty() {
                continue;
            }

            let lookup = Self::construct_search(field, model)?;
            let group = terms.iter().fold(Condition::all(), |all, term| {
                all.add(lookup.predicate(term, &self.settings))
            });
            condition = Some(condition.unwrap_or_else(Condition::all).add(group));
        }
        Ok(condition)
    }
}

impl FilterBackend for FieldsFilter {
    fn name(&self) -> &'static str {
        FILTER_NAME
    }

    fn condition(
        &self,
        params: &QueryParams,
        view: &dyn FilterView,
    ) -> Result<Option<Condition>, FilterError> {
        let fields = Self::search_fields(view, params).unwrap_or_default();
        if fields.is_empty() {
            tracing::debug!("No search fields configured, skipping search");
            return Ok(None);
        }

        match self.settings.search_mode {
            SearchMode::Combined => self.combined_condition(&fields, params, view.model()),
            SearchMode::PerField => self.per_field_condition(&fields, params, view.model()),
        }
    }

    fn to_html(
        &self,
        params: &QueryParams,
        view: &dyn FilterView,
    ) -> Result<Option<String>, FilterError> {
        if Self::search_fields(view, params).is_none_or(|fields| fields.is_empty()) {
            return Ok(None);
        }

        let context = SearchContext {
            title: &self.title,
            param: &self.param,
            term: params.get(&self.param).unwrap_or_default(),
        };
        Ok(Some(html::render("search.html", SEARCH_TEMPLATE, &context)?))
    }

    fn schema_fields(&self) -> Vec<CoreApiField> {
        vec![CoreApiField::query(
            &self.param,
            &self.title,
            &self.description,
        )]
    }

    fn schema_operation_parameters(&self) -> Vec<Parameter> {
        vec![query_parameter(&self.param, &self.description)]
    }
}
