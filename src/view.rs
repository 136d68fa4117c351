use std::sync::Arc;

use crate::introspection::ModelIntrospection;
use crate::params::QueryParams;
use crate::serializer::SerializerFields;

/// Field keys a view allows for conditional filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedFields {
    /// Every model field and every annotation
    All,
    /// Explicit `(key, label)` pairs
    Listed(Vec<(String, String)>),
}

impl AllowedFields {
    /// Allow-list of bare keys, each used as its own label.
    #[must_use]
    pub fn keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Listed(
            keys.into_iter()
                .map(|key| {
                    let key = key.into();
                    (key.clone(), key)
                })
                .collect(),
        )
    }

    /// Allow-list of `(key, label)` pairs.
    #[must_use]
    pub fn labelled<I, K, L>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, L)>,
        K: Into<String>,
        L: Into<String>,
    {
        Self::Listed(
            pairs
                .into_iter()
                .map(|(key, label)| (key.into(), label.into()))
                .collect(),
        )
    }
}

/// Configuration a view hands to the filter backends.
///
/// Only [`model`](FilterView::model) is required; everything else defaults to "not set".
pub trait FilterView: Send + Sync {
    fn model(&self) -> &dyn ModelIntrospection;

    fn serializer(&self) -> Option<&dyn SerializerFields> {
        None
    }

    /// Allow-list for the conditional filter.
    fn conditional_fields(&self) -> Option<AllowedFields> {
        None
    }

    /// Conditional tokens applied when the request has none.
    fn conditional(&self) -> Option<Vec<String>> {
        None
    }

    /// Search fields, optionally prefixed with `^`, `=`, `@` or `$`.
    ///
    /// Receives the request so implementations can vary the fields per request.
    fn filter_fields(&self, _params: &QueryParams) -> Option<Vec<String>> {
        None
    }
}

/// A [`FilterView`] assembled from values.
///
/// ```rust,ignore
/// let view = ViewConfig::new(EntityModel::of::<article::Entity>())
///     .with_conditional_fields(AllowedFields::keys(["published", "featured"]))
///     .with_default_conditional(["published"])
///     .with_filter_fields(["title", "^code", "author__name"]);
/// ```
#[derive(Clone)]
pub struct ViewConfig {
    model: Arc<dyn ModelIntrospection>,
    serializer: Option<Arc<dyn SerializerFields>>,
    conditional_fields: Option<AllowedFields>,
    conditional: Option<Vec<String>>,
    filter_fields: Option<Vec<String>>,
}

impl ViewConfig {
    #[must_use]
    pub fn new(model: impl ModelIntrospection + 'static) -> Self {
        Self {
            model: Arc::new(model),
            serializer: None,
            conditional_fields: None,
            conditional: None,
            filter_fields: None,
        }
    }

    #[must_use]
    pub fn with_serializer(mut self, serializer: impl SerializerFields + 'static) -> Self {
        self.serializer = Some(Arc::new(serializer));
        self
    }

    #[must_use]
    pub fn with_conditional_fields(mut self, fields: AllowedFields) -> Self {
        self.conditional_fields = Some(fields);
        self
    }

    /// A single string default behaves as a one-item list.
    #[must_use]
    pub fn with_default_conditional<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditional = Some(tokens.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_filter_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

impl FilterView for ViewConfig {
    fn model(&self) -> &dyn ModelIntrospection {
        self.model.as_ref()
    }

    fn serializer(&self) -> Option<&dyn SerializerFields> {
        self.serializer.as_deref()
    }

    fn conditional_fields(&self) -> Option<AllowedFields> {
        self.conditional_fields.clone()
    }

    fn conditional(&self) -> Option<Vec<String>> {
        self.conditional.clone()
    }

    fn filter_fields(&self, _params: &QueryParams) -> Option<Vec<String>> {
        self.filter_fields.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::article_model;

    #[test]
    fn test_allowed_keys_use_key_as_label() {
        let fields = AllowedFields::keys(["active", "verified"]);
        assert_eq!(
            fields,
            AllowedFields::Listed(vec![
                ("active".to_string(), "active".to_string()),
                ("verified".to_string(), "verified".to_string()),
            ])
        );
    }

    #[test]
    fn test_view_config_defaults() {
        let view = ViewConfig::new(article_model());
        assert_eq!(view.model().table_name(), "articles");
        assert!(view.serializer().is_none());
        assert!(view.conditional_fields().is_none());
        assert!(view.conditional().is_none());
        assert!(view.filter_fields(&QueryParams::default()).is_none());
    }

    #[test]
    fn test_view_config_builders_feed_getters() {
        let view = ViewConfig::new(article_model())
            .with_conditional_fields(AllowedFields::All)
            .with_filter_fields(["title", "^code"]);
        assert_eq!(view.conditional_fields(), Some(AllowedFields::All));
        assert_eq!(
            view.filter_fields(&QueryParams::default()),
            Some(vec!["title".to_string(), "^code".to_string()])
        );
    }

    #[test]
    fn test_single_default_conditional() {
        let view = ViewConfig::new(article_model()).with_default_conditional(["published"]);
        assert_eq!(view.conditional(), Some(vec!["published".to_string()]));
    }
}
