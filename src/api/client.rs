use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::api::types::{ApiNewPost, ApiPost};
use crate::api::{RemoteError, RemoteSource};
use crate::config::ApiConfig;
use crate::posts::Post;

/// HTTP client for a JSONPlaceholder-style `/posts` resource
#[derive(Clone)]
pub struct PostsClient {
  http: reqwest::Client,
  posts_url: Url,
  user_id: i64,
}

impl PostsClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let timeout = Duration::from_secs(config.timeout_secs);

    let http = reqwest::Client::builder()
      .connect_timeout(timeout)
      .timeout(timeout)
      .user_agent(concat!("postcache/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      posts_url: posts_url(&config.base_url)?,
      user_id: config.user_id,
    })
  }

  /// Client against an arbitrary base URL with default settings.
  #[cfg(test)]
  pub fn with_base_url(base_url: &str) -> Result<Self> {
    Self::new(&ApiConfig {
      base_url: base_url.to_string(),
      ..ApiConfig::default()
    })
  }

  /// Read a response body, turning non-2xx statuses into `Upstream`.
  async fn body(response: reqwest::Response) -> Result<Vec<u8>, RemoteError> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
      return Err(RemoteError::Upstream {
        status: status.as_u16(),
        body: String::from_utf8_lossy(&bytes).into_owned(),
      });
    }

    Ok(bytes.to_vec())
  }
}

#[async_trait]
impl RemoteSource for PostsClient {
  async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Vec<Post>, RemoteError> {
    debug!(page, page_size, "GET {}", self.posts_url);

    let response = self
      .http
      .get(self.posts_url.clone())
      .query(&[("_page", page), ("_limit", page_size)])
      .send()
      .await?;

    let bytes = Self::body(response).await?;
    let posts: Vec<ApiPost> = serde_json::from_slice(&bytes)?;

    Ok(posts.into_iter().map(ApiPost::into_post).collect())
  }

  async fn create_item(&self, title: &str, body: &str) -> Result<Post, RemoteError> {
    debug!("POST {}", self.posts_url);

    let request = ApiNewPost {
      title,
      body,
      user_id: self.user_id,
    };

    let response = self
      .http
      .post(self.posts_url.clone())
      .json(&request)
      .send()
      .await?;

    let bytes = Self::body(response).await?;
    let post: ApiPost = serde_json::from_slice(&bytes)?;

    Ok(post.into_post())
  }
}

/// Resolve `{base}/posts`, tolerating a base URL with or without a trailing slash.
fn posts_url(base_url: &str) -> Result<Url> {
  let mut base =
    Url::parse(base_url).map_err(|e| eyre!("Invalid API base URL '{}': {}", base_url, e))?;

  if !base.path().ends_with('/') {
    let path = format!("{}/", base.path());
    base.set_path(&path);
  }

  base
    .join("posts")
    .map_err(|e| eyre!("Invalid API base URL '{}': {}", base_url, e))
}
