use crate::core::client::{ClientConfig, EventParser};
use crate::core::error::{Result, TreeError};
use crate::core::traits::{EventFeed, TreeNetwork};
use crate::core::types::{Method, TreeRequest, TreeResponse};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tokio_util::sync::CancellationToken;

/// [`TreeNetwork`] over `reqwest`.
///
/// Only the connect timeout is set on the underlying client; per-request
/// deadlines come from [`TreeRequest::timeout`] so long-lived streams are
/// not cut off.
pub struct NativeNetwork {
    client: Client,
    event_buffer: usize,
}

impl NativeNetwork {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            event_buffer: ClientConfig::default().event_buffer,
        }
    }

    /// Build a `reqwest` client from `config`.
    pub fn with_config(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder().connect_timeout(config.connection_timeout());

        if !config.proxy_url.is_empty() {
            let proxy = reqwest::Proxy::all(&config.proxy_url)
                .map_err(|e| TreeError::Config(format!("invalid proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| TreeError::Config(e.to_string()))?;

        Ok(Self {
            client,
            event_buffer: config.event_buffer.max(1),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Put => reqwest::Method::PUT,
        Method::Post => reqwest::Method::POST,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn transport_error(e: reqwest::Error) -> TreeError {
    if e.is_timeout() {
        TreeError::Timeout
    } else {
        // Strip the URL, it may carry the token.
        TreeError::Connection(e.without_url().to_string())
    }
}

#[async_trait]
impl TreeNetwork for NativeNetwork {
    async fn fetch(&self, url: &str, request: TreeRequest) -> Result<TreeResponse> {
        let mut req_builder = self.client.request(to_reqwest(request.method), url);

        for (k, v) in &request.extra_headers {
            req_builder = req_builder.header(k, v);
        }
        if request.has_body() {
            let content_type = request
                .content_type
                .as_deref()
                .unwrap_or("application/json");
            req_builder = req_builder
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(request.body.clone());
        }
        if let Some(timeout) = request.timeout {
            req_builder = req_builder.timeout(timeout);
        }

        let response = req_builder.send().await.map_err(transport_error)?;

        let status = response.status().as_u16();
        let mut headers = std::collections::BTreeMap::new();
        for (k, v) in response.headers() {
            if let Ok(val) = v.to_str() {
                headers.insert(k.as_str().to_string(), val.to_string());
            }
        }

        let body = response.bytes().await.map_err(transport_error)?;

        Ok(TreeResponse {
            status,
            headers,
            body,
        })
    }

    async fn subscribe(&self, url: &str) -> Result<EventFeed> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .header(reqwest::header::ACCEPT_ENCODING, "identity")
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(TreeResponse::new(status, body).into_error());
        }

        let (tx, rx) = async_channel::bounded(self.event_buffer);
        let release = CancellationToken::new();
        let released = release.clone();
        let mut stream = response.bytes_stream();

        // The response, and with it the socket, lives only as long as this
        // task; it ends when the feed is dropped or the server hangs up.
        tokio::spawn(async move {
            let mut parser = EventParser::new();
            loop {
                let chunk = tokio::select! {
                    _ = released.cancelled() => {
                        tracing::debug!("event stream released");
                        return;
                    }
                    chunk = stream.next() => chunk,
                };
                let items = match chunk {
                    Some(Ok(chunk)) => parser.feed(&chunk),
                    Some(Err(e)) => {
                        tokio::select! {
                            _ = released.cancelled() => {}
                            _ = tx.send(Err(transport_error(e))) => {}
                        }
                        return;
                    }
                    None => break,
                };
                for item in items {
                    tokio::select! {
                        _ = released.cancelled() => return,
                        sent = tx.send(item) => {
                            if sent.is_err() {
                                return;
                            }
                        }
                    }
                }
            }
            tracing::debug!("event stream ended");
        });

        Ok(EventFeed::with_release(rx, release))
    }
}
