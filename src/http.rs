//! Blocking HTTP access shared by the catalog and recommendation clients.
//!
//! Clients never talk to `reqwest` directly: they describe a GET with
//! [`HttpRequest`] and hand it to an [`HttpGet`] implementation. The production
//! implementation is [`ReqwestHttp`]; unit tests swap in a scripted one.
//!
//! Query parameters are passed as key/value pairs and percent-encoded by
//! `reqwest`, so callers never interpolate raw user text into a URL.

use std::time::Duration;

use color_eyre::{Result, eyre::WrapErr};
use reqwest::blocking::{Client, ClientBuilder};
use thiserror::Error;
use tracing::debug;

/// Transport-level failure: the request could not be completed or the server
/// answered with a non-2xx status.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
}

/// Request timeout policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    After(Duration),
    /// Wait indefinitely.
    Unbounded,
}

/// A single GET request description.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub accept: Option<&'static str>,
    pub timeout: Timeout,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>, timeout: Timeout) -> Self {
        Self { url: url.into(), query: Vec::new(), accept: None, timeout }
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn accept(mut self, mime: &'static str) -> Self {
        self.accept = Some(mime);
        self
    }

    /// Value of the first query parameter named `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

/// Performs a GET and returns the body of a 2xx response.
pub trait HttpGet: Send + Sync {
    fn get(&self, request: &HttpRequest) -> Result<String, FetchError>;
}

/// `reqwest::blocking` backed [`HttpGet`].
#[derive(Debug, Clone)]
pub struct ReqwestHttp {
    client: Client,
}

impl ReqwestHttp {
    pub fn new(user_agent: &str) -> Result<Self> {
        Self::build(Self::builder(user_agent))
    }

    /// システムのプロキシ設定を無視して直接接続する (ローカルのスタブサーバ向け)
    pub fn without_proxy(user_agent: &str) -> Result<Self> {
        Self::build(Self::builder(user_agent).no_proxy())
    }

    fn builder(user_agent: &str) -> ClientBuilder {
        // クライアント全体のタイムアウトは無効にし、リクエスト単位で設定する
        Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(None::<Duration>)
    }

    fn build(builder: ClientBuilder) -> Result<Self> {
        let client = builder.build().wrap_err("building reqwest client")?;
        Ok(Self { client })
    }
}

impl HttpGet for ReqwestHttp {
    fn get(&self, request: &HttpRequest) -> Result<String, FetchError> {
        let transport = |e: reqwest::Error| FetchError::Transport {
            url: request.url.clone(),
            source: Box::new(e),
        };

        let mut builder = self.client.get(&request.url).query(&request.query);
        if let Some(mime) = request.accept {
            builder = builder.header(reqwest::header::ACCEPT, mime);
        }
        if let Timeout::After(d) = request.timeout {
            builder = builder.timeout(d);
        }

        let resp = builder.send().map_err(transport)?;
        let status = resp.status();
        let text = resp.text().map_err(transport)?;
        debug!(target: "http", url = %request.url, status = %status, len = text.len(), "http_response_raw");

        if !status.is_success() {
            return Err(FetchError::Status { url: request.url.clone(), status: status.as_u16() });
        }
        Ok(text)
    }
}
