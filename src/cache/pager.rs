//! Lazy, restartable page-by-page reads over a [`PostStore`].

use color_eyre::Result;
use futures::Stream;
use std::sync::Arc;

use super::traits::PostStore;
use crate::posts::Post;

/// Reads the cache one window at a time, in the store's read order.
///
/// Nothing is read until the first page is requested. Offsets are positional,
/// so rows inserted ahead of the current window while paging shift later pages.
pub struct PostPager<S: PostStore + ?Sized> {
  store: Arc<S>,
  page_size: usize,
  offset: usize,
  done: bool,
}

/// Start a paginated read of `store`.
pub fn paged_read<S: PostStore + ?Sized>(store: Arc<S>, page_size: usize) -> PostPager<S> {
  PostPager {
    store,
    page_size: page_size.max(1),
    offset: 0,
    done: false,
  }
}

impl<S: PostStore + ?Sized> PostPager<S> {
  /// Next page, or `None` once the cache is exhausted.
  pub fn next_page(&mut self) -> Result<Option<Vec<Post>>> {
    if self.done {
      return Ok(None);
    }

    let page = self.store.read_page(self.offset, self.page_size)?;
    if page.len() < self.page_size {
      self.done = true;
    }
    if page.is_empty() {
      return Ok(None);
    }

    self.offset += page.len();
    Ok(Some(page))
  }

  /// Go back to the first page.
  #[allow(dead_code)]
  pub fn restart(&mut self) {
    self.offset = 0;
    self.done = false;
  }

  pub fn into_stream(self) -> impl Stream<Item = Result<Vec<Post>>> {
    futures::stream::iter(self)
  }
}

impl<S: PostStore + ?Sized> Iterator for PostPager<S> {
  type Item = Result<Vec<Post>>;

  fn next(&mut self) -> Option<Self::Item> {
    match self.next_page() {
      Ok(page) => page.map(Ok),
      Err(e) => {
        // Stop after surfacing the error once
        self.done = true;
        Some(Err(e))
      }
    }
  }
}
