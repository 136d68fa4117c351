use sea_orm::DatabaseBackend;
use serde::Deserialize;

pub const DEFAULT_SEARCH_PARAM: &str = "search";
pub const DEFAULT_CONDITIONAL_PARAM: &str = "conditional";
pub const DEFAULT_FULLTEXT_LANGUAGE: &str = "english";

/// Database flavour the generated SQL targets.
///
/// Mirrors [`sea_orm::DatabaseBackend`] but can be read from configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    Postgres,
    #[serde(alias = "mariadb")]
    MySql,
}

impl From<DatabaseBackend> for Backend {
    fn from(backend: DatabaseBackend) -> Self {
        match backend {
            DatabaseBackend::Postgres => Self::Postgres,
            DatabaseBackend::MySql => Self::MySql,
            DatabaseBackend::Sqlite => Self::Sqlite,
        }
    }
}

impl From<Backend> for DatabaseBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Postgres => Self::Postgres,
            Backend::MySql => Self::MySql,
            Backend::Sqlite => Self::Sqlite,
        }
    }
}

/// Where the fields filter reads its terms from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// One search parameter; every term must match at least one configured field.
    #[default]
    Combined,
    /// Each configured field reads its own parameter, named after the field without its
    /// lookup prefix: `^code` reads `code`, not `^code`.
    PerField,
}

/// Settings shared by the filter backends.
///
/// Nothing here is global: build one (or deserialize it from your app config) and pass it
/// to each filter's constructor.
///
/// ```rust,ignore
/// let settings = FilterSettings::default().with_backend(db.get_database_backend());
/// let search = FieldsFilter::new(&settings);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub search_param: String,
    pub conditional_param: String,
    pub backend: Backend,
    /// Text search configuration used by the `search` lookup on Postgres
    pub fulltext_language: String,
    pub search_mode: SearchMode,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            search_param: DEFAULT_SEARCH_PARAM.to_string(),
            conditional_param: DEFAULT_CONDITIONAL_PARAM.to_string(),
            backend: Backend::default(),
            fulltext_language: DEFAULT_FULLTEXT_LANGUAGE.to_string(),
            search_mode: SearchMode::default(),
        }
    }
}

impl FilterSettings {
    #[must_use]
    pub fn with_backend(mut self, backend: impl Into<Backend>) -> Self {
        self.backend = backend.into();
        self
    }

    #[must_use]
    pub fn with_search_param(mut self, param: impl Into<String>) -> Self {
        self.search_param = param.into();
        self
    }

    #[must_use]
    pub fn with_conditional_param(mut self, param: impl Into<String>) -> Self {
        self.conditional_param = param.into();
        self
    }

    #[must_use]
    pub fn with_search_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = mode;
        self
    }

    /// Language name that is safe to splice into a text search call.
    ///
    /// Anything that is not a plain identifier falls back to `simple`.
    pub(crate) fn fulltext_config(&self) -> &str {
        let language = self.fulltext_language.as_str();
        if !language.is_empty() && language.chars().all(|c| c.is_ascii_alphabetic() || c == '_') {
            language
        } else {
            "simple"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = FilterSettings::default();
        assert_eq!(settings.search_param, "search");
        assert_eq!(settings.conditional_param, "conditional");
        assert_eq!(settings.backend, Backend::Sqlite);
        assert_eq!(settings.search_mode, SearchMode::Combined);
        assert_eq!(settings.fulltext_config(), "english");
    }

    #[test]
    fn test_deserialize_partial() {
        let settings: FilterSettings =
            serde_json::from_str(r#"{"search_param": "q", "backend": "postgres"}"#).unwrap();
        assert_eq!(settings.search_param, "q");
        assert_eq!(settings.backend, Backend::Postgres);
        assert_eq!(settings.conditional_param, "conditional");
    }

    #[test]
    fn test_deserialize_search_mode() {
        let settings: FilterSettings =
            serde_json::from_str(r#"{"search_mode": "per_field", "backend": "mariadb"}"#).unwrap();
        assert_eq!(settings.search_mode, SearchMode::PerField);
        assert_eq!(settings.backend, Backend::MySql);
    }

    #[test]
    fn test_backend_conversion() {
        let settings = FilterSettings::default().with_backend(DatabaseBackend::Postgres);
        assert_eq!(settings.backend, Backend::Postgres);
        assert_eq!(DatabaseBackend::from(Backend::MySql), DatabaseBackend::MySql);
    }

    #[test]
    fn test_fulltext_language_sanitized() {
        let mut settings = FilterSettings::default();
        settings.fulltext_language = "english'); DROP TABLE x; --".to_string();
        assert_eq!(settings.fulltext_config(), "simple");
    }
}
