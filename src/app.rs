use color_eyre::{eyre::eyre, Result};
use futures::TryStreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::api::{PostsClient, RemoteSource};
use crate::cache::{paged_read, PostStore, SqliteStorage};
use crate::config::Config;
use crate::connectivity::{Connectivity, StaticConnectivity, SystemConnectivity};
use crate::posts::{
  FailureKind, LoadOutcome, LoadTrigger, PageSource, Post, PostCreator, PostsMediator,
};

/// Wires the cache, the remote client and the paging session together
/// and runs one CLI command against them.
pub struct App {
  store: Arc<SqliteStorage>,
  mediator: PostsMediator<SqliteStorage>,
  creator: PostCreator<SqliteStorage>,
  page_size: u32,
}

impl App {
  pub fn new(config: &Config, offline: bool) -> Result<Self> {
    let connectivity: Arc<dyn Connectivity> = if offline {
      Arc::new(StaticConnectivity::new(false))
    } else {
      Arc::new(SystemConnectivity::new())
    };

    Self::with_connectivity(config, connectivity)
  }

  fn with_connectivity(config: &Config, connectivity: Arc<dyn Connectivity>) -> Result<Self> {
    let store = Arc::new(SqliteStorage::open(&config.cache_path()?)?);
    let remote: Arc<dyn RemoteSource> = Arc::new(PostsClient::new(&config.api)?);

    let mediator = PostsMediator::new(Arc::clone(&store), Arc::clone(&remote), connectivity)
      .with_page_size(config.paging.page_size)
      .with_fetch_budget(Duration::from_secs(config.api.timeout_secs));

    let creator = PostCreator::new(Arc::clone(&store), remote, config.api.user_id);

    Ok(Self {
      store,
      mediator,
      creator,
      page_size: config.paging.page_size,
    })
  }

  /// Refresh, then keep appending until the server runs out or `max_pages` is hit.
  pub async fn sync(&mut self, max_pages: Option<u32>) -> Result<()> {
    let mut outcome = self.mediator.load(LoadTrigger::Refresh).await;
    let mut loads = 1;

    loop {
      println!("{}", describe(&outcome, self.mediator.cursor()));

      if let LoadOutcome::Failure(e) = &outcome {
        return Err(eyre!("Sync failed: {}", e));
      }
      if outcome.is_degraded() {
        warn!(kind = ?outcome.failure_kind(), "Serving cached posts instead of fresh ones");
      }
      if outcome.end_of_data() == Some(true) {
        break;
      }

      if max_pages.is_some_and(|max| loads >= max) {
        break;
      }

      outcome = self.mediator.load(LoadTrigger::Append).await;
      loads += 1;
    }

    let count = self.store.count()?;
    info!(count, pages = self.mediator.cursor(), "Sync finished");
    println!("{} posts cached", count);

    Ok(())
  }

  /// Print the cache page by page.
  pub async fn list(&self, page_size: Option<u32>, limit: Option<usize>) -> Result<()> {
    let page_size = page_size.unwrap_or(self.page_size) as usize;
    let limit = limit.unwrap_or(usize::MAX);

    let mut pages = Box::pin(paged_read(Arc::clone(&self.store), page_size).into_stream());
    let mut printed = 0;

    while let Some(page) = pages.try_next().await? {
      for post in page.iter().take(limit - printed) {
        println!("{}", summary_line(post));
      }
      printed += page.len().min(limit - printed);
      if printed >= limit {
        break;
      }
    }

    if printed == 0 {
      println!("No cached posts. Run `postcache sync` first.");
    }

    Ok(())
  }

  pub fn show(&self, id: i64) -> Result<()> {
    let post = self
      .store
      .get(id)?
      .ok_or_else(|| eyre!("No cached post with id {}", id))?;

    println!("{}", summary_line(&post));
    println!();
    println!("{}", post.body);

    Ok(())
  }

  /// Create a post and wait for its background sync before returning.
  pub async fn create(&self, title: &str, body: &str) -> Result<()> {
    let post = self.creator.create_post(title, body);
    self.creator.wait_for_sync().await;

    let stored = self.store.get(post.id)?.unwrap_or(post);
    println!("{}", summary_line(&stored));
    if stored.is_local() {
      println!("Saved locally; the server did not accept it (see log).");
    }

    Ok(())
  }

  pub fn clear_remote(&self) -> Result<()> {
    let removed = self.store.delete_confirmed_only()?;
    println!("Removed {} remote posts", removed);
    Ok(())
  }
}

fn summary_line(post: &Post) -> String {
  let marker = if post.is_local() { "*" } else { " " };
  format!("{}{:>14}  {}", marker, post.id, post.title)
}

fn describe(outcome: &LoadOutcome, cursor: u32) -> String {
  match outcome {
    LoadOutcome::Success {
      end_of_data,
      source: PageSource::Fresh,
    } => {
      if *end_of_data {
        format!("page {}: no more posts", cursor + 1)
      } else {
        format!("page {}: loaded", cursor)
      }
    }
    LoadOutcome::Success {
      source: PageSource::Cached(kind),
      ..
    } => match kind {
      FailureKind::Unavailable => "offline: showing saved posts".to_string(),
      FailureKind::Timeout => "slow connection: showing saved posts".to_string(),
      FailureKind::Upstream => "server error: showing saved posts".to_string(),
    },
    LoadOutcome::Failure(e) => format!("failed ({})", e),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn page_json(ids: std::ops::RangeInclusive<i64>) -> serde_json::Value {
    serde_json::Value::Array(
      ids
        .map(|id| serde_json::json!({"userId": 1, "id": id, "title": format!("t{id}"), "body": "b"}))
        .collect(),
    )
  }

  async fn mount_page(server: &MockServer, page: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
      .and(path("/posts"))
      .and(query_param("_page", page))
      .respond_with(ResponseTemplate::new(200).set_body_json(body))
      .mount(server)
      .await;
  }

  fn test_config(server: &MockServer, dir: &tempfile::TempDir) -> Config {
    let mut config = Config::default();
    config.api.base_url = server.uri();
    config.paging.page_size = 3;
    config.cache.path = Some(dir.path().join("cache.db"));
    config
  }

  #[tokio::test]
  async fn test_sync_pages_until_empty() {
    let server = MockServer::start().await;
    mount_page(&server, "1", page_json(1..=3)).await;
    mount_page(&server, "2", page_json(4..=5)).await;
    mount_page(&server, "3", serde_json::json!([])).await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, &dir);
    let mut app =
      App::with_connectivity(&config, Arc::new(StaticConnectivity::new(true))).unwrap();

    app.sync(None).await.unwrap();

    assert_eq!(app.store.count().unwrap(), 5);
    assert_eq!(app.mediator.cursor(), 2);
  }

  #[tokio::test]
  async fn test_sync_respects_max_pages() {
    let server = MockServer::start().await;
    mount_page(&server, "1", page_json(1..=3)).await;
    mount_page(&server, "2", page_json(4..=6)).await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, &dir);
    let mut app =
      App::with_connectivity(&config, Arc::new(StaticConnectivity::new(true))).unwrap();

    app.sync(Some(1)).await.unwrap();

    assert_eq!(app.store.count().unwrap(), 3);
  }

  #[tokio::test]
  async fn test_offline_sync_with_empty_cache_errors() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, &dir);
    let mut app = App::new(&config, true).unwrap();

    assert!(app.sync(None).await.is_err());
  }

  #[tokio::test]
  async fn test_create_against_failing_server_keeps_local_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/posts"))
      .respond_with(ResponseTemplate::new(500))
      .mount(&server)
      .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, &dir);
    let app = App::with_connectivity(&config, Arc::new(StaticConnectivity::new(true))).unwrap();

    app.create("T", "B").await.unwrap();

    let posts = app.store.read_all_once().unwrap();
    assert_eq!(posts.len(), 1);
    assert!(posts[0].is_local());
  }

  #[test]
  fn test_describe_outcomes() {
    let fresh = LoadOutcome::Success {
      end_of_data: false,
      source: PageSource::Fresh,
    };
    assert_eq!(describe(&fresh, 2), "page 2: loaded");

    let cached = LoadOutcome::Success {
      end_of_data: true,
      source: PageSource::Cached(FailureKind::Timeout),
    };
    assert_eq!(describe(&cached, 0), "slow connection: showing saved posts");
  }
}
