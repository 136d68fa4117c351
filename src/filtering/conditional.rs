//! `?conditional=published,-featured`
//!
//! Each token names a boolean field that must be true; a leading `-` asks for false.
//! Tokens outside the permitted set are dropped before anything is built, so
//! `?conditional=published,bogus` behaves exactly like `?conditional=published`.

use sea_orm::Condition;
use serde::Serialize;
use utoipa::openapi::path::Parameter;

use super::FilterBackend;
use super::path::FieldPath;
use crate::errors::FilterError;
use crate::html::{self, CONDITIONAL_TEMPLATE};
use crate::introspection::LOOKUP_SEP;
use crate::params::QueryParams;
use crate::schema::{CoreApiField, query_parameter};
use crate::serializer::WHOLE_OBJECT_SOURCE;
use crate::settings::FilterSettings;
use crate::view::{AllowedFields, FilterView};

pub const CONDITIONAL_TITLE: &str = "Conditional";
pub const CONDITIONAL_DESCRIPTION: &str = "Which field to use when conditional the results.";

const FILTER_NAME: &str = "ConditionalFilter";

/// A field key the conditional parameter may name, with its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidField {
    pub key: String,
    pub label: String,
}

impl ValidField {
    fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// One selectable entry of the browsable control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionalOption {
    /// Token this option selects, `key` or `-key`
    pub key: String,
    pub label: String,
    /// Current query string with the conditional parameter replaced
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionalContext {
    pub title: String,
    pub param: String,
    /// First token in effect for this request
    pub current: Option<String>,
    pub options: Vec<ConditionalOption>,
}

/// `Title_Length__Gt` style capitalisation, with `__` shown as a space.
fn annotation_label(name: &str) -> String {
    let mut titled = String::with_capacity(name.len());
    let mut word_start = true;
    for c in name.chars() {
        if c.is_alphabetic() {
            if word_start {
                titled.extend(c.to_uppercase());
            } else {
                titled.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            titled.push(c);
            word_start = true;
        }
    }
    titled.replace(LOOKUP_SEP, " ")
}

/// Filters a query down to rows whose boolean fields match the requested flags.
#[derive(Debug, Clone)]
pub struct ConditionalFilter {
    param: String,
    conditional_fields: Option<AllowedFields>,
    title: String,
    description: String,
}

impl Default for ConditionalFilter {
    fn default() -> Self {
        Self::new(&FilterSettings::default())
    }
}

impl ConditionalFilter {
    #[must_use]
    pub fn new(settings: &FilterSettings) -> Self {
        Self {
            param: settings.conditional_param.clone(),
            conditional_fields: None,
            title: CONDITIONAL_TITLE.to_string(),
            description: CONDITIONAL_DESCRIPTION.to_string(),
        }
    }

    /// Filter-level allow-list, used when the view does not declare one.
    #[must_use]
    pub fn with_conditional_fields(mut self, fields: AllowedFields) -> Self {
        self.conditional_fields = Some(fields);
        self
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

    /// Tokens in effect for this request.
    ///
    /// The valid tokens of the parameter when at least one survives validation, otherwise
    /// the view's default list.
    ///
    /// # Errors
    ///
    /// `ImproperlyConfigured` when the parameter is present but the view gives no way to
    /// work out the valid fields.
    pub fn get_conditional(
        &self,
        params: &QueryParams,
        view: &dyn FilterView,
    ) -> Result<Option<Vec<String>>, FilterError> {
        if let Some(raw) = params.get(&self.param).filter(|raw| !raw.is_empty()) {
            let tokens = raw.split(',').map(|token| token.trim().to_string()).collect();
            let conditional = self.remove_invalid_fields(tokens, view)?;
            if !conditional.is_empty() {
                return Ok(Some(conditional));
            }
        }

        // No conditional was given, or every token was invalid
        Ok(Self::default_conditional(view))
    }

    /// The view's default tokens, used as given.
    #[must_use]
    pub fn default_conditional(view: &dyn FilterView) -> Option<Vec<String>> {
        view.conditional()
    }

    /// Fields derived from the view's serializer.
    ///
    /// Write-only fields, whole-object fields and fields backed by computed model properties
    /// cannot be filtered on and are left out.
    ///
    /// # Errors
    ///
    /// `ImproperlyConfigured` when the view has no serializer.
    pub fn default_valid_fields(view: &dyn FilterView) -> Result<Vec<ValidField>, FilterError> {
        let Some(serializer) = view.serializer() else {
            return Err(FilterError::improperly_configured(
                FILTER_NAME,
                format!(
                    "Cannot use {FILTER_NAME} on a view which does not have either a \
                     'serializer' or 'conditional_fields' configured."
                ),
            ));
        };

        let properties = view.model().property_names();
        Ok(serializer
            .fields()
            .into_iter()
            .filter(|field| {
                !field.write_only
                    && field.source != WHOLE_OBJECT_SOURCE
                    && !properties.contains(&field.source)
            })
            .map(|field| ValidField::new(field.filter_key(), field.label))
            .collect())
    }

    /// Permitted `(key, label)` pairs for `view`.
    ///
    /// The view's allow-list wins over the filter's; without either the serializer decides.
    ///
    /// # Errors
    ///
    /// See [`default_valid_fields`](Self::default_valid_fields).
    pub fn valid_fields(&self, view: &dyn FilterView) -> Result<Vec<ValidField>, FilterError> {
        match view
            .conditional_fields()
            .or_else(|| self.conditional_fields.clone())
        {
            None => Self::default_valid_fields(view),
            Some(AllowedFields::All) => {
                let model = view.model();
                let mut fields: Vec<ValidField> = model
                    .list_fields()
                    .into_iter()
                    .map(|field| ValidField::new(field.name, field.verbose_name))
                    .collect();
                fields.extend(
                    model
                        .annotations()
                        .into_iter()
                        .map(|annotation| {
                            let label = annotation_label(&annotation.name);
                            ValidField::new(annotation.name, label)
                        }),
                );
                Ok(fields)
            }
            Some(AllowedFields::Listed(pairs)) => Ok(pairs
                .into_iter()
                .map(|(key, label)| ValidField::new(key, label))
                .collect()),
        }
    }

    /// Keep the tokens whose key, without a leading `-`, is a valid field.
    ///
    /// # Errors
    ///
    /// See [`valid_fields`](Self::valid_fields).
    pub fn remove_invalid_fields(
        &self,
        tokens: Vec<String>,
        view: &dyn FilterView,
    ) -> Result<Vec<String>, FilterError> {
        let valid = self.valid_fields(view)?;
        let (kept, dropped): (Vec<String>, Vec<String>) = tokens.into_iter().partition(|token| {
            let key = token.strip_prefix('-').unwrap_or(token);
            valid.iter().any(|field| field.key == key)
        });

        if !dropped.is_empty() {
            tracing::debug!(
                param = %self.param,
                dropped = ?dropped,
                "Ignoring invalid conditional fields"
            );
        }
        Ok(kept)
    }

    /// Data handed to the browsable control template.
    ///
    /// # Errors
    ///
    /// See [`valid_fields`](Self::valid_fields).
    pub fn template_context(
        &self,
        params: &QueryParams,
        view: &dyn FilterView,
    ) -> Result<ConditionalContext, FilterError> {
        let current = self
            .get_conditional(params, view)?
            .and_then(|tokens| tokens.into_iter().next());

        let mut options = Vec::new();
        for field in self.valid_fields(view)? {
            let negated = format!("-{}", field.key);
            options.push(ConditionalOption {
                href: params.with_param(&self.param, &field.key),
                label: format!("{} - true", field.label),
                key: field.key,
            });
            options.push(ConditionalOption {
                href: params.with_param(&self.param, &negated),
                label: format!("{} - false", field.label),
                key: negated,
            });
        }

        Ok(ConditionalContext {
            title: self.title.clone(),
            param: self.param.clone(),
            current,
            options,
        })
    }
}

impl FilterBackend for ConditionalFilter {
    fn name(&self) -> &'static str {
        FILTER_NAME
    }

    fn condition(
        &self,
        params: &QueryParams,
        view: &dyn FilterView,
    ) -> Result<Option<Condition>, FilterError> {
        let Some(conditional) = self.get_conditional(params, view)? else {
            return Ok(None);
        };
        if conditional.is_empty() {
            return Ok(None);
        }

        let model = view.model();
        let mut condition = Condition::all();
        for token in &conditional {
            let (key, value) = match token.strip_prefix('-') {
                Some(key) => (key, false),
                None => (token.as_str(), true),
            };
            let path = FieldPath::resolve(model, key)?;
            if let Some(lookup) = path.lookup() {
                return Err(FilterError::UnsupportedLookup {
                    field: key.to_string(),
                    lookup: lookup.to_string(),
                });
            }
            condition = condition.add(path.equals(value));
        }
        Ok(Some(condition))
    }

    fn to_html(
        &self,
        params: &QueryParams,
        view: &dyn FilterView,
    ) -> Result<Option<String>, FilterError> {
        let context = self.template_context(params, view)?;
        Ok(Some(html::render(
            "conditional.html",
            CONDITIONAL_TEMPLATE,
            &context,
        )?))
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
