//! Main tree store client.
//!
//! [`TreeClient`] carries everything a query needs: the base address, the
//! transport, the token provider, the key generator and the configuration.
//! It is cheap to clone; clones share all of it.

use crate::core::auth::StaticToken;
use crate::core::client::ClientConfig;
use crate::core::error::{Result, TreeError};
use crate::core::key::KeyGenerator;
use crate::core::query::{Query, QueryNode};
use crate::core::traits::{TokenProvider, TreeNetwork};
use std::sync::Arc;

struct ClientInner {
    root: Arc<QueryNode>,
    network: Arc<dyn TreeNetwork>,
    token_provider: Option<Arc<dyn TokenProvider>>,
    keys: Arc<KeyGenerator>,
    config: ClientConfig,
}

/// Handle to one tree store.
#[derive(Clone)]
pub struct TreeClient {
    inner: Arc<ClientInner>,
}

impl TreeClient {
    /// Start configuring a client for `base_url`.
    pub fn builder(base_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    /// Client with the default configuration and the native transport.
    #[cfg(feature = "client")]
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        ClientBuilder::new(base_url).build()
    }

    /// Query at the root of the store.
    pub fn root(&self) -> Query {
        Query::new(self.clone(), self.inner.root.clone())
    }

    /// Query at `path` below the root.
    pub fn child(&self, path: &str) -> Query {
        self.root().child(path)
    }

    pub fn base_url(&self) -> String {
        crate::core::query::PathBuilder::build_url(&self.inner.root)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn network(&self) -> &Arc<dyn TreeNetwork> {
        &self.inner.network
    }

    pub fn keys(&self) -> &Arc<KeyGenerator> {
        &self.inner.keys
    }

    pub fn has_token_provider(&self) -> bool {
        self.inner.token_provider.is_some()
    }

    /// Ask the provider for the current token. `None` without a provider.
    pub async fn token(&self) -> Result<Option<String>> {
        match &self.inner.token_provider {
            Some(provider) => provider.token().await.map(Some),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for TreeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeClient")
            .field("base_url", &self.base_url())
            .field("authenticated", &self.has_token_provider())
            .finish()
    }
}

/// Builder for [`TreeClient`].
///
/// ```no_run
/// use firetree::{ClientConfig, TreeClient};
///
/// # fn main() -> firetree::Result<()> {
/// let client = TreeClient::builder("https://example-db.firebaseio.com")
///     .auth_token("secret")
///     .config(ClientConfig {
///         idle_timeout_secs: 90,
///         ..Default::default()
///     })
///     .build()?;
/// let items = client.child("items");
/// # let _ = items;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    base_url: String,
    config: ClientConfig,
    network: Option<Arc<dyn TreeNetwork>>,
    token_provider: Option<Arc<dyn TokenProvider>>,
    keys: Option<Arc<KeyGenerator>>,
}

impl ClientBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            config: ClientConfig::default(),
            network: None,
            token_provider: None,
            keys: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Authenticate every request with a fixed token.
    pub fn auth_token(self, token: impl Into<String>) -> Self {
        self.token_provider(StaticToken::new(token))
    }

    /// Authenticate with a provider consulted before every request.
    pub fn token_provider(mut self, provider: impl TokenProvider) -> Self {
        self.token_provider = Some(Arc::new(provider));
        self
    }

    /// Use a custom transport instead of the native one.
    pub fn network(mut self, network: Arc<dyn TreeNetwork>) -> Self {
        self.network = Some(network);
        self
    }

    /// Share a key generator with other clients in the process.
    pub fn key_generator(mut self, keys: Arc<KeyGenerator>) -> Self {
        self.keys = Some(keys);
        self
    }

    /// Validate the base address and assemble the client.
    ///
    /// # Errors
    ///
    /// [`TreeError::Config`] when the base address is not an absolute
    /// http(s) URL, or when no transport is available.
    pub fn build(self) -> Result<TreeClient> {
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| TreeError::Config(format!("invalid base url '{}': {}", self.base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TreeError::Config(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            )));
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(TreeError::Config(
                "base url must not carry a query or fragment".into(),
            ));
        }

        let network = match self.network {
            Some(network) => network,
            None => default_network(&self.config)?,
        };

        tracing::debug!(base_url = %self.base_url, "tree client ready");

        Ok(TreeClient {
            inner: Arc::new(ClientInner {
                root: QueryNode::root(&self.base_url),
                network,
                token_provider: self.token_provider,
                keys: self.keys.unwrap_or_default(),
                config: self.config,
            }),
        })
    }
}

#[cfg(feature = "client")]
fn default_network(config: &ClientConfig) -> Result<Arc<dyn TreeNetwork>> {
    Ok(Arc::new(crate::core::client::NativeNetwork::with_config(config)?))
}

#[cfg(not(feature = "client"))]
fn default_network(_config: &ClientConfig) -> Result<Arc<dyn TreeNetwork>> {
    Err(TreeError::Config(
        "no transport configured; enable the `client` feature or call `network()`".into(),
    ))
}
