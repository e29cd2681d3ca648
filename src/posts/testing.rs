//! In-process stand-in for the posts endpoint.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use super::types::{Origin, Post};
use crate::api::{RemoteError, RemoteSource};

#[derive(Clone, Copy)]
pub enum Mode {
  /// Answer from the configured pages
  Serve,
  /// Fail every call with the given error
  Fail(fn() -> RemoteError),
  /// Never answer
  Hang,
}

pub struct FakeRemote {
  pages: Mutex<HashMap<u32, Vec<Post>>>,
  mode: Mutex<Mode>,
  requests: Mutex<Vec<(u32, u32)>>,
  created: Mutex<Vec<(String, String)>>,
  next_id: AtomicI64,
}

impl FakeRemote {
  pub fn new() -> Self {
    Self {
      pages: Mutex::new(HashMap::new()),
      mode: Mutex::new(Mode::Serve),
      requests: Mutex::new(Vec::new()),
      created: Mutex::new(Vec::new()),
      next_id: AtomicI64::new(101),
    }
  }

  pub fn set_page(&self, page: u32, posts: Vec<Post>) {
    self.pages.lock().unwrap().insert(page, posts);
  }

  pub fn set_mode(&self, mode: Mode) {
    *self.mode.lock().unwrap() = mode;
  }

  pub fn requested_pages(&self) -> Vec<u32> {
    self.requests.lock().unwrap().iter().map(|(p, _)| *p).collect()
  }

  pub fn requested_sizes(&self) -> Vec<u32> {
    self.requests.lock().unwrap().iter().map(|(_, s)| *s).collect()
  }

  pub fn created(&self) -> Vec<(String, String)> {
    self.created.lock().unwrap().clone()
  }

  fn mode(&self) -> Mode {
    *self.mode.lock().unwrap()
  }
}

#[async_trait]
impl RemoteSource for FakeRemote {
  async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Vec<Post>, RemoteError> {
    self.requests.lock().unwrap().push((page, page_size));

    match self.mode() {
      Mode::Serve => {
        let posts = self.pages.lock().unwrap().get(&page).cloned();
        Ok(posts.unwrap_or_default())
      }
      Mode::Fail(make_error) => Err(make_error()),
      Mode::Hang => std::future::pending().await,
    }
  }

  async fn create_item(&self, title: &str, body: &str) -> Result<Post, RemoteError> {
    self
      .created
      .lock()
      .unwrap()
      .push((title.to_string(), body.to_string()));

    match self.mode() {
      // The server echoes the post back with its own id and a tidied title
      Mode::Serve => Ok(Post {
        id: self.next_id.fetch_add(1, Ordering::SeqCst),
        user_id: 1,
        title: title.trim().to_string(),
        body: body.to_string(),
        origin: Origin::Remote,
      }),
      Mode::Fail(make_error) => Err(make_error()),
      Mode::Hang => std::future::pending().await,
    }
  }
}

pub fn remote_posts(ids: impl IntoIterator<Item = i64>) -> Vec<Post> {
  ids
    .into_iter()
    .map(|id| Post {
      id,
      user_id: 1,
      title: format!("post {id}"),
      body: format!("body {id}"),
      origin: Origin::Remote,
    })
    .collect()
}

pub fn local_post(id: i64, title: &str) -> Post {
  Post {
    id,
    user_id: 1,
    title: title.to_string(),
    body: String::new(),
    origin: Origin::Local,
  }
}
