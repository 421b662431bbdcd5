//! REST adapter for a realtime database (`<base>/<path>/<key>.json`).

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use livemap_core::{AppConfig, StoreEntry};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde_json::Value;

use crate::error::StoreError;
use crate::store::{validate_key, IncidentStore};

/// Incident collection stored as one child per CAD-ID under `path`.
///
/// Keys are read with `?shallow=true` so that listing never downloads entry
/// bodies. When an auth token is configured it is sent as the `auth` query
/// parameter on every request.
pub struct RealtimeDbStore {
    client: Client,
    base_url: Url,
    path: Vec<String>,
    auth: Option<String>,
}

impl std::fmt::Debug for RealtimeDbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeDbStore")
            .field("base_url", &self.base_url.as_str())
            .field("path", &self.path)
            .field("auth", &self.auth.as_ref().map(|_| "[redacted]"))
            .finish_non_exhaustive()
    }
}

impl RealtimeDbStore {
    /// # Errors
    ///
    /// - [`StoreError::InvalidUrl`] if `base_url` does not parse as an
    ///   absolute http(s) URL or `path` is empty.
    /// - [`StoreError::Http`] if the `reqwest::Client` cannot be constructed.
    pub fn new(
        base_url: &str,
        path: &str,
        auth: Option<&str>,
        timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let invalid = |reason: String| StoreError::InvalidUrl {
            url: base_url.to_owned(),
            reason,
        };

        let parsed = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("expected an http(s) base URL".to_owned()));
        }

        let path: Vec<String> = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
            .collect();
        if path.is_empty() {
            return Err(invalid("collection path is empty".to_owned()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: parsed,
            path,
            auth: auth.filter(|a| !a.is_empty()).map(str::to_owned),
        })
    }

    /// Builds the store from the `LIVEMAP_STORE_*` settings.
    ///
    /// # Errors
    ///
    /// See [`RealtimeDbStore::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        Self::new(
            &config.store_url,
            &config.store_path,
            config.store_auth.as_deref(),
            config.store_timeout_secs,
        )
    }

    /// `<base>/<path>.json` for the collection or `<base>/<path>/<key>.json`
    /// for one child.
    fn endpoint(&self, key: Option<&str>) -> Url {
        let mut segments: Vec<&str> = self.path.iter().map(String::as_str).collect();
        segments.extend(key);

        let mut url = self.base_url.clone();
        if let (Ok(mut parts), Some((last, parents))) =
            (url.path_segments_mut(), segments.split_last())
        {
            parts.pop_if_empty();
            parts.extend(parents);
            parts.push(&format!("{last}.json"));
        }
        url.set_query(None);
        if let Some(auth) = &self.auth {
            url.query_pairs_mut().append_pair("auth", auth);
        }
        url
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<Response, StoreError> {
        let path = url.path().to_owned();
        let method_name = method.to_string();
        let response = build(self.client.request(method, url))
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::UnexpectedStatus {
                status: status.as_u16(),
                method: method_name,
                path,
            });
        }
        Ok(response)
    }

    async fn get_children(&self, shallow: bool) -> Result<Vec<(String, Value)>, StoreError> {
        let mut url = self.endpoint(None);
        if shallow {
            url.query_pairs_mut().append_pair("shallow", "true");
        }
        let context = url.path().to_owned();
        let body = self
            .send(Method::GET, url, |req| req)
            .await?
            .text()
            .await
            .map_err(reqwest::Error::without_url)?;
        let value: Value = serde_json::from_str(&body)
            .map_err(|source| StoreError::Deserialize { context, source })?;
        Ok(children(value))
    }
}

/// Flattens a collection response into `(key, value)` pairs.
///
/// An absent collection reads back as `null`. Collections whose keys are all
/// small integers may come back as a JSON array with `null` holes.
fn children(value: Value) -> Vec<(String, Value)> {
    match value {
        Value::Object(map) => map.into_iter().filter(|(_, v)| !v.is_null()).collect(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(idx, v)| (idx.to_string(), v))
            .collect(),
        _ => Vec::new(),
    }
}

impl IncidentStore for RealtimeDbStore {
    async fn list_keys(&self) -> Result<BTreeSet<String>, StoreError> {
        let keys: BTreeSet<String> = self
            .get_children(true)
            .await?
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        tracing::debug!(count = keys.len(), "store keys listed");
        Ok(keys)
    }

    async fn read_all(&self) -> Result<BTreeMap<String, StoreEntry>, StoreError> {
        let mut entries = BTreeMap::new();
        for (key, value) in self.get_children(false).await? {
            match serde_json::from_value::<StoreEntry>(value) {
                Ok(entry) => {
                    entries.insert(key, entry);
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "skipping malformed store entry");
                }
            }
        }
        Ok(entries)
    }

    async fn set(&self, key: &str, entry: &StoreEntry) -> Result<(), StoreError> {
        validate_key(key)?;
        let url = self.endpoint(Some(key));
        self.send(Method::PUT, url, |req| req.json(entry)).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        let url = self.endpoint(Some(key));
        self.send(Method::DELETE, url, |req| req).await?;
        Ok(())
    }
}
