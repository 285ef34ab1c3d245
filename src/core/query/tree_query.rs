//! Reads, writes and subscriptions at one location.

use crate::core::cache::{decode_entries, LocalCache, SharedCache, TreeNode};
use crate::core::client::{with_deadline, Subscription, TreeClient};
use crate::core::error::{Result, TreeError};
use crate::core::query::{PathBuilder, QueryNode};
use crate::core::types::{Entity, Method, Path, TreeRequest, TreeResponse};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// A location in the store plus the client to reach it.
///
/// Building a query does no I/O. Every operation resolves the token and the
/// URL again when it runs.
#[derive(Clone, Debug)]
pub struct Query {
    client: TreeClient,
    node: Arc<QueryNode>,
    timeout: Option<Duration>,
}

#[derive(Deserialize)]
struct ServerKey {
    name: String,
}

impl Query {
    pub(crate) fn new(client: TreeClient, node: Arc<QueryNode>) -> Self {
        Query {
            client,
            node,
            timeout: None,
        }
    }

    /// Query at `path` below this one. `path` may contain several
    /// `/`-separated segments; empty ones are skipped.
    pub fn child(&self, path: &str) -> Query {
        let node = Path::parse(path)
            .segments()
            .iter()
            .fold(self.node.clone(), |node, segment| {
                QueryNode::child(&node, segment.clone())
            });
        Query {
            node,
            ..self.clone()
        }
    }

    /// Child at a freshly generated key. The key is minted the first time
    /// the query needs it and stays fixed afterwards.
    pub fn keyed_child(&self) -> Query {
        let keys = self.client.keys().clone();
        Query {
            node: QueryNode::keyed(&self.node, Arc::new(move || keys.next())),
            ..self.clone()
        }
    }

    /// Deadline for one-shot operations on this query, overriding
    /// [`ClientConfig::request_timeout_ms`](crate::ClientConfig::request_timeout_ms).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Last segment of this location, empty at the root.
    pub fn key(&self) -> &str {
        self.node.segment()
    }

    /// Unescaped location, e.g. `/users/ann`.
    pub fn path(&self) -> String {
        self.node.path()
    }

    pub fn client(&self) -> &TreeClient {
        &self.client
    }

    pub fn node(&self) -> &Arc<QueryNode> {
        &self.node
    }

    /// Resource URL without suffix or credentials.
    pub fn build_url(&self) -> String {
        PathBuilder::build_url(&self.node)
    }

    /// URL to send requests to, with a freshly resolved token attached.
    ///
    /// # Errors
    ///
    /// [`TreeError::Auth`] when the token provider fails.
    pub async fn authenticated_url(&self) -> Result<String> {
        let token = self.client.token().await?;
        let config = self.client.config();

        let mut url = self.build_url();
        url.push_str(&config.resource_suffix);
        if let Some(token) = token {
            url.push('?');
            url.push_str(&config.auth_param);
            url.push('=');
            url.push_str(&urlencoding::encode(&token));
        }
        Ok(url)
    }

    /// Read the children of this location once.
    ///
    /// `null` (nothing stored) reads as an empty list. Entities are ordered
    /// by key.
    pub async fn once<T: DeserializeOwned>(&self) -> Result<Vec<Entity<T>>> {
        let value: Value = self.send(TreeRequest::get()).await?.json()?;
        if value.is_null() {
            return Ok(Vec::new());
        }

        let mut entries = decode_entries::<T>(&value)?;
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries
            .into_iter()
            .map(|(key, value)| Entity::new(key, value))
            .collect())
    }

    /// Read the value at this location once.
    ///
    /// Use `Option<T>` to accept a location that holds nothing.
    pub async fn once_single<T: DeserializeOwned>(&self) -> Result<T> {
        self.send(TreeRequest::get()).await?.json()
    }

    /// Store `value` under a locally generated, time-ordered key.
    ///
    /// The key is known before the request goes out.
    pub async fn create_with_generated_key<T: Serialize>(&self, value: T) -> Result<Entity<T>> {
        let key = self.client.keys().next();
        self.child(&key).replace(&value).await?;
        Ok(Entity::new(key, value))
    }

    /// Store `value` under a key chosen by the server.
    pub async fn create_with_server_key<T: Serialize>(&self, value: T) -> Result<Entity<T>> {
        let request = TreeRequest::new()
            .with_method(Method::Post)
            .with_json(&value)?;
        let ServerKey { name } = self.send(request).await?.json()?;
        Ok(Entity::new(name, value))
    }

    /// Overwrite whatever is stored here with `value`.
    pub async fn replace<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let request = TreeRequest::new()
            .with_method(Method::Put)
            .with_json(value)?;
        self.send(request).await.map(drop)
    }

    /// Update only the children present in `value`.
    ///
    /// # Errors
    ///
    /// [`TreeError::Decode`] if `value` does not serialize to a JSON object.
    pub async fn patch_merge<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let body = serde_json::to_value(value)?;
        if !body.is_object() {
            return Err(TreeError::Decode(
                "partial updates must serialize to an object".into(),
            ));
        }
        let request = TreeRequest::new()
            .with_method(Method::Patch)
            .with_json(&body)?;
        self.send(request).await.map(drop)
    }

    /// Remove everything stored at this location.
    pub async fn delete(&self) -> Result<()> {
        self.send(TreeRequest::delete()).await.map(drop)
    }

    /// Live feed of the children of this location, mirrored in a fresh
    /// collection cache.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe<T>(&self) -> Subscription<T>
    where
        T: TreeNode + Clone + Default + DeserializeOwned + Send + Sync + 'static,
    {
        self.subscribe_with_cache(LocalCache::new().shared())
    }

    /// Live feed of a single structured value; path segments of incoming
    /// changes address fields of `initial`.
    pub fn subscribe_object<T>(&self, initial: T) -> Subscription<T>
    where
        T: TreeNode + Clone + Default + DeserializeOwned + Send + Sync + 'static,
    {
        self.subscribe_with_cache(LocalCache::object(initial).shared())
    }

    /// Live feed applied to a cache the caller already holds.
    pub fn subscribe_with_cache<T>(&self, cache: SharedCache<T>) -> Subscription<T>
    where
        T: TreeNode + Clone + Default + DeserializeOwned + Send + Sync + 'static,
    {
        Subscription::spawn(self.clone(), cache)
    }

    async fn send(&self, request: TreeRequest) -> Result<TreeResponse> {
        let method = request.method;
        let path = self.path();
        let deadline = self
            .timeout
            .unwrap_or_else(|| self.client.config().request_timeout());

        let request = request.with_timeout(deadline);
        let response = with_deadline(Some(deadline), async {
            let url = self.authenticated_url().await?;
            tracing::debug!(%method, %path, "tree request");
            self.client.network().fetch(&url, request).await
        })
        .await
        .map_err(|e| {
            tracing::warn!(%method, %path, error = %e, "tree request failed");
            e
        })?;

        if !response.is_success() {
            tracing::warn!(%method, %path, status = response.status, "tree request rejected");
        }
        response.error_for_status()
    }
}
