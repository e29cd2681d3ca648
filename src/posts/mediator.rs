//! Page-by-page fetching that keeps the local cache in step with the server.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::outcome::{FailureKind, LoadError, LoadOutcome, LoadTrigger, PageSource};
use super::types::{Origin, Post};
use crate::api::{RemoteError, RemoteSource};
use crate::cache::PostStore;
use crate::connectivity::Connectivity;

/// Things that can go wrong between asking for a page and storing it.
enum LoadFault {
  Remote(RemoteError),
  BudgetElapsed,
  Cache(color_eyre::Report),
}

impl LoadFault {
  fn kind(&self) -> FailureKind {
    match self {
      LoadFault::Remote(RemoteError::Network(_)) => FailureKind::Unavailable,
      LoadFault::Remote(RemoteError::Timeout) | LoadFault::BudgetElapsed => FailureKind::Timeout,
      LoadFault::Remote(RemoteError::Upstream { .. } | RemoteError::Decode(_)) => {
        FailureKind::Upstream
      }
      LoadFault::Cache(_) => FailureKind::Unavailable,
    }
  }

  fn is_timeout(&self) -> bool {
    self.kind() == FailureKind::Timeout
  }

  fn message(&self) -> String {
    match self {
      LoadFault::Remote(e) => e.to_string(),
      LoadFault::BudgetElapsed => "connection timeout".to_string(),
      LoadFault::Cache(e) => format!("cache error: {e}"),
    }
  }
}

/// Fetches pages from a [`RemoteSource`] into a [`PostStore`].
///
/// One mediator is one paging session: it owns the cursor (the last page that
/// returned posts) and expects at most one `load` in flight, which `&mut self`
/// enforces. Failures never escape as errors; every path ends in a
/// [`LoadOutcome`], serving the cache when that is the better answer.
pub struct PostsMediator<S: PostStore> {
  store: Arc<S>,
  remote: Arc<dyn RemoteSource>,
  connectivity: Arc<dyn Connectivity>,
  page_size: u32,
  /// Time allowed for a single page fetch
  fetch_budget: Duration,
  /// Last page that returned posts; 0 before anything has been loaded
  current_page: u32,
}

impl<S: PostStore> PostsMediator<S> {
  pub fn new(
    store: Arc<S>,
    remote: Arc<dyn RemoteSource>,
    connectivity: Arc<dyn Connectivity>,
  ) -> Self {
    Self {
      store,
      remote,
      connectivity,
      page_size: 10,
      fetch_budget: Duration::from_secs(30),
      current_page: 0,
    }
  }

  pub fn with_page_size(mut self, page_size: u32) -> Self {
    self.page_size = page_size.max(1);
    self
  }

  pub fn with_fetch_budget(mut self, budget: Duration) -> Self {
    self.fetch_budget = budget;
    self
  }

  /// Last page that returned posts.
  pub fn cursor(&self) -> u32 {
    self.current_page
  }

  /// Load the page `trigger` calls for.
  ///
  /// 1. Prepend has nothing to load
  /// 2. Offline: serve the cache, or fail `Unavailable` if it is empty
  /// 3. Fetch within the budget; running out behaves like offline but fails `Timeout`
  /// 4. Store the page (a refresh first drops every remote-confirmed post)
  /// 5. Any other fault: a refresh over a non-empty cache serves it, else fail
  pub async fn load(&mut self, trigger: LoadTrigger) -> LoadOutcome {
    let page = match trigger {
      LoadTrigger::Prepend => {
        return LoadOutcome::Success {
          end_of_data: true,
          source: PageSource::Fresh,
        }
      }
      LoadTrigger::Refresh => {
        self.current_page = 0;
        1
      }
      LoadTrigger::Append => self.current_page.saturating_add(1),
    };

    if !self.connectivity.is_available() {
      info!(page, "No network, using cached posts");
      return self.serve_cache_or_fail(FailureKind::Unavailable, "no network available");
    }

    match self.fetch_and_store(trigger, page).await {
      Ok(stored) => {
        if stored > 0 {
          self.current_page = page;
        }
        info!(page, stored, "Loaded posts");
        LoadOutcome::Success {
          end_of_data: stored == 0,
          source: PageSource::Fresh,
        }
      }
      Err(fault) if fault.is_timeout() => {
        warn!(page, budget = ?self.fetch_budget, "Page fetch timed out");
        self.serve_cache_or_fail(FailureKind::Timeout, &fault.message())
      }
      Err(fault) => {
        warn!(page, ?trigger, error = %fault.message(), "Page load failed");
        let kind = fault.kind();
        if trigger == LoadTrigger::Refresh && self.has_cached_posts() {
          LoadOutcome::Success {
            end_of_data: true,
            source: PageSource::Cached(kind),
          }
        } else {
          LoadOutcome::Failure(LoadError::new(kind, fault.message()))
        }
      }
    }
  }

  /// Fetch `page` and write it to the cache. Returns how many posts it held.
  async fn fetch_and_store(&self, trigger: LoadTrigger, page: u32) -> Result<usize, LoadFault> {
    debug!(page, page_size = self.page_size, "Fetching page");

    let fetched = tokio::time::timeout(
      self.fetch_budget,
      self.remote.fetch_page(page, self.page_size),
    )
    .await
    .map_err(|_| LoadFault::BudgetElapsed)?
    .map_err(LoadFault::Remote)?;

    let posts: Vec<Post> = fetched
      .into_iter()
      .map(|post| Post {
        origin: Origin::Remote,
        ..post
      })
      .collect();

    let stored = if trigger == LoadTrigger::Refresh {
      self.store.replace_page(&posts, true)
    } else {
      self.store.insert_all(&posts)
    };
    stored.map_err(LoadFault::Cache)?;

    Ok(posts.len())
  }

  fn serve_cache_or_fail(&self, kind: FailureKind, message: &str) -> LoadOutcome {
    if self.has_cached_posts() {
      LoadOutcome::Success {
        end_of_data: true,
        source: PageSource::Cached(kind),
      }
    } else {
      LoadOutcome::Failure(LoadError::new(kind, message))
    }
  }

  fn has_cached_posts(&self) -> bool {
    match self.store.read_all_once() {
      Ok(posts) => !posts.is_empty(),
      Err(e) => {
        warn!("Failed to read cache: {}", e);
        false
      }
    }
  }
}
