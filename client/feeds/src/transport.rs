use crate::cache::RevalidationToken;
use async_trait::async_trait;
use core::time::Duration;
use reqwest::header::{HeaderMap, HeaderName, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::{Client, StatusCode};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransportError {
	#[error("connection failed: {0}")]
	Connect(String),
	#[error("request timed out after {0:?}")]
	Timeout(Duration),
	#[error("unexpected status code {0}")]
	Status(u16),
	#[error("request failed: {0}")]
	Other(String),
}

impl TransportError {
	/// Only these are worth the single retry; everything else fails immediately.
	pub fn is_transient(&self) -> bool {
		match self {
			TransportError::Connect(_) | TransportError::Timeout(_) => true,
			TransportError::Status(code) => *code == 429 || *code >= 500,
			TransportError::Other(_) => false,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportResponse {
	NotModified,
	Body { bytes: Vec<u8>, token: RevalidationToken },
}

/// The network seam of the feed client.
#[async_trait]
pub trait FeedTransport: Send + Sync {
	async fn fetch(
		&self,
		url: &str,
		token: Option<&RevalidationToken>,
		timeout: Duration,
	) -> Result<TransportResponse, TransportError>;
}

/// Production transport over a shared `reqwest` client.
#[derive(Clone, Debug)]
pub struct HttpTransport {
	client: Client,
}

impl HttpTransport {
	pub fn new() -> Result<Self, TransportError> {
		let client = Client::builder()
			.user_agent(concat!("relaywatch/", env!("CARGO_PKG_VERSION")))
			.build()
			.map_err(|err| TransportError::Other(err.to_string()))?;
		Ok(Self { client })
	}
}

#[async_trait]
impl FeedTransport for HttpTransport {
	async fn fetch(
		&self,
		url: &str,
		token: Option<&RevalidationToken>,
		timeout: Duration,
	) -> Result<TransportResponse, TransportError> {
		let mut request = self.client.get(url).timeout(timeout);
		if let Some(token) = token {
			if let Some(etag) = &token.etag {
				request = request.header(IF_NONE_MATCH, etag.as_str());
			}
			if let Some(modified) = &token.last_modified {
				request = request.header(IF_MODIFIED_SINCE, modified.as_str());
			}
		}

		let response = request.send().await.map_err(|err| classify(err, timeout))?;
		let status = response.status();
		if status == StatusCode::NOT_MODIFIED {
			return Ok(TransportResponse::NotModified);
		}
		if !status.is_success() {
			return Err(TransportError::Status(status.as_u16()));
		}

		let token = RevalidationToken {
			etag: header_text(response.headers(), &ETAG),
			last_modified: header_text(response.headers(), &LAST_MODIFIED),
		};
		let bytes = response.bytes().await.map_err(|err| classify(err, timeout))?;
		Ok(TransportResponse::Body { bytes: bytes.to_vec(), token })
	}
}

fn header_text(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
	headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

fn classify(err: reqwest::Error, timeout: Duration) -> TransportError {
	if err.is_timeout() {
		TransportError::Timeout(timeout)
	} else if err.is_connect() {
		TransportError::Connect(err.to_string())
	} else if let Some(status) = err.status() {
		TransportError::Status(status.as_u16())
	} else {
		TransportError::Other(err.to_string())
	}
}
