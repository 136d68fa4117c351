use axum::{extract::FromRequestParts, http::Uri, http::request::Parts};
use std::convert::Infallible;

/// Decoded query string of the current request.
///
/// Keeps every pair in order so repeated parameters survive; [`QueryParams::get`] returns
/// the last value, which is what browsers and most frameworks treat as authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Parse an `application/x-www-form-urlencoded` query string (without the leading `?`).
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let pairs = url::form_urlencoded::parse(query.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        Self { pairs }
    }

    #[must_use]
    pub fn from_uri(uri: &Uri) -> Self {
        uri.query().map(Self::parse).unwrap_or_default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Query string (with leading `?`) equal to this one but with `name` set to `value`.
    ///
    /// Used for links in the browsable controls.
    #[must_use]
    pub fn with_param(&self, name: &str, value: &str) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, existing) in &self.pairs {
            if key != name {
                serializer.append_pair(key, existing);
            }
        }
        serializer.append_pair(name, value);
        format!("?{}", serializer.finish())
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_uri(&parts.uri))
    }
}
