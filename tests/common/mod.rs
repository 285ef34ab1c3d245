//! Test utilities and common fixtures for firetree integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use firetree::types::{ServerEvent, TreeRequest, TreeResponse};
use firetree::{
    tree_record, ClientConfig, EventFeed, TokenProvider, TreeClient, TreeError, TreeNetwork,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Default timeout for test operations.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Install a test-writer tracing subscriber once per test binary.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("firetree=debug")),
        )
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub count: u32,
}

tree_record!(Item { name, count });

pub fn item(name: &str, count: u32) -> Item {
    Item {
        name: name.to_string(),
        count,
    }
}

/// Config with short reconnect delays for tests.
pub fn fast_config() -> ClientConfig {
    ClientConfig {
        reconnect_initial_backoff_ms: 10,
        reconnect_max_backoff_ms: 40,
        ..Default::default()
    }
}

/// What the next `subscribe` call should do.
pub enum Connect {
    Accept,
    Fail(TreeError),
}

/// Scripted in-memory transport.
///
/// Every accepted subscription hands its frame sender to the test through
/// [`MockNetwork::accept`].
pub struct MockNetwork {
    pub fetches: Mutex<Vec<(String, TreeRequest)>>,
    pub subscribe_urls: Mutex<Vec<String>>,
    replies: Mutex<VecDeque<TreeResponse>>,
    plans: Mutex<VecDeque<Connect>>,
    accepted_tx: async_channel::Sender<async_channel::Sender<firetree::Result<ServerEvent>>>,
    accepted_rx: async_channel::Receiver<async_channel::Sender<firetree::Result<ServerEvent>>>,
}

impl MockNetwork {
    pub fn new() -> Arc<Self> {
        let (accepted_tx, accepted_rx) = async_channel::unbounded();
        Arc::new(MockNetwork {
            fetches: Mutex::new(Vec::new()),
            subscribe_urls: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
            plans: Mutex::new(VecDeque::new()),
            accepted_tx,
            accepted_rx,
        })
    }

    pub fn reply(&self, status: u16, body: &str) {
        self.replies
            .lock()
            .push_back(TreeResponse::new(status, body.to_string()));
    }

    pub fn plan(&self, connect: Connect) {
        self.plans.lock().push_back(connect);
    }

    /// Wait for the next accepted subscription and return its frame sender.
    pub async fn accept(&self) -> async_channel::Sender<firetree::Result<ServerEvent>> {
        tokio::time::timeout(TEST_TIMEOUT, self.accepted_rx.recv())
            .await
            .expect("no subscription was opened")
            .expect("mock network dropped")
    }

    pub fn subscribe_count(&self) -> usize {
        self.subscribe_urls.lock().len()
    }
}

#[async_trait]
impl TreeNetwork for MockNetwork {
    async fn fetch(&self, url: &str, req: TreeRequest) -> firetree::Result<TreeResponse> {
        self.fetches.lock().push((url.to_string(), req));
        let reply = self.replies.lock().pop_front();
        Ok(reply.unwrap_or_else(|| TreeResponse::new(200, "null")))
    }

    async fn subscribe(&self, url: &str) -> firetree::Result<EventFeed> {
        self.subscribe_urls.lock().push(url.to_string());
        let plan = self.plans.lock().pop_front().unwrap_or(Connect::Accept);
        match plan {
            Connect::Fail(e) => Err(e),
            Connect::Accept => {
                let (tx, rx) = async_channel::bounded(64);
                let _ = self.accepted_tx.send(tx).await;
                Ok(EventFeed::new(rx))
            }
        }
    }
}

pub fn mock_client(network: Arc<MockNetwork>, config: ClientConfig) -> TreeClient {
    TreeClient::builder("https://db.example.com")
        .network(network)
        .config(config)
        .build()
        .expect("valid test client")
}

pub fn mock_client_with_tokens(
    network: Arc<MockNetwork>,
    config: ClientConfig,
    tokens: impl TokenProvider,
) -> TreeClient {
    TreeClient::builder("https://db.example.com")
        .network(network)
        .config(config)
        .token_provider(tokens)
        .build()
        .expect("valid test client")
}

pub fn put(path: &str, data: &str) -> firetree::Result<ServerEvent> {
    Ok(ServerEvent::new(
        "put",
        format!(r#"{{"path":"{}","data":{}}}"#, path, data),
    ))
}

pub fn patch(path: &str, data: &str) -> firetree::Result<ServerEvent> {
    Ok(ServerEvent::new(
        "patch",
        format!(r#"{{"path":"{}","data":{}}}"#, path, data),
    ))
}
