//! Optimistic post creation.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::types::{Origin, Post};
use crate::api::RemoteSource;
use crate::cache::PostStore;

/// Writes new posts to the cache immediately and syncs them in the background.
///
/// The id handed out at creation is the post's key for good: a successful sync
/// rewrites the row's content with the server's answer but keeps the id. A
/// failed sync leaves the local-only row in place and is only logged. There is
/// no retry and no way to cancel a sync once started.
pub struct PostCreator<S: PostStore + 'static> {
  store: Arc<S>,
  remote: Arc<dyn RemoteSource>,
  user_id: i64,
  last_id: AtomicI64,
  in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl<S: PostStore + 'static> PostCreator<S> {
  pub fn new(store: Arc<S>, remote: Arc<dyn RemoteSource>, user_id: i64) -> Self {
    Self {
      store,
      remote,
      user_id,
      last_id: AtomicI64::new(0),
      in_flight: Mutex::new(Vec::new()),
    }
  }

  /// Create a post. Returns the provisional post as stored.
  ///
  /// Must be called from within a Tokio runtime; the remote sync is spawned
  /// onto it and this returns without waiting.
  pub fn create_post(&self, title: &str, body: &str) -> Post {
    let post = Post {
      id: self.next_provisional_id(),
      user_id: self.user_id,
      title: title.to_string(),
      body: body.to_string(),
      origin: Origin::Local,
    };

    match self.store.insert(&post) {
      Ok(()) => info!(id = post.id, "Post saved locally"),
      Err(e) => error!(id = post.id, "Failed to save post locally: {}", e),
    }

    let handle = tokio::spawn(sync_post(
      Arc::clone(&self.store),
      Arc::clone(&self.remote),
      post.clone(),
    ));
    self.track(handle);

    post
  }

  /// Wait until every sync started so far has finished.
  ///
  /// For short-lived callers (the CLI, tests) that must not exit while a sync
  /// is still running.
  pub async fn wait_for_sync(&self) {
    let handles = std::mem::take(&mut *self.lock_in_flight());

    for handle in handles {
      if let Err(e) = handle.await {
        warn!("Post sync task did not complete: {}", e);
      }
    }
  }

  /// Time-derived id, strictly increasing within this creator.
  fn next_provisional_id(&self) -> i64 {
    let now = Utc::now().timestamp_millis();
    let previous = self
      .last_id
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
        Some(now.max(last + 1))
      })
      .unwrap_or(now);

    now.max(previous + 1)
  }

  fn track(&self, handle: JoinHandle<()>) {
    let mut in_flight = self.lock_in_flight();
    in_flight.retain(|h| !h.is_finished());
    in_flight.push(handle);
  }

  fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
    // A panic while holding this lock cannot leave the list inconsistent
    self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
  }
}

async fn sync_post<S: PostStore>(store: Arc<S>, remote: Arc<dyn RemoteSource>, provisional: Post) {
  let saved = match remote
    .create_item(&provisional.title, &provisional.body)
    .await
  {
    Ok(saved) => saved,
    Err(e) => {
      warn!(id = provisional.id, "Failed to sync post, keeping local copy: {}", e);
      return;
    }
  };

  let confirmed = Post {
    id: provisional.id,
    user_id: saved.user_id,
    title: saved.title,
    body: saved.body,
    origin: Origin::Remote,
  };

  match store.insert(&confirmed) {
    Ok(()) => info!(id = confirmed.id, server_id = saved.id, "Post synced"),
    Err(e) => error!(id = confirmed.id, "Failed to store synced post: {}", e),
  }
}
