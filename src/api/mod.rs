//! Remote posts endpoint: the HTTP client and the seam the paging core uses.

pub mod client;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

use crate::posts::Post;

pub use client::PostsClient;

/// Failures reported by a [`RemoteSource`].
#[derive(Debug, Error)]
pub enum RemoteError {
  /// The request never produced a response (DNS, connect, reset, ...)
  #[error("network error: {0}")]
  Network(String),
  /// The transport gave up waiting
  #[error("request timed out")]
  Timeout,
  /// The server answered with a non-2xx status
  #[error("server returned {status}: {body}")]
  Upstream { status: u16, body: String },
  /// The server answered 2xx but the body was not what we expect
  #[error("malformed response: {0}")]
  Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for RemoteError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_timeout() {
      RemoteError::Timeout
    } else {
      RemoteError::Network(e.to_string())
    }
  }
}

/// Where posts come from and where new posts go.
#[async_trait]
pub trait RemoteSource: Send + Sync {
  /// Fetch one page (1-based) of posts.
  async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Vec<Post>, RemoteError>;

  /// Create a post and return the server's representation of it.
  async fn create_item(&self, title: &str, body: &str) -> Result<Post, RemoteError>;
}
