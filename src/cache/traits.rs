//! The local cache contract the paging core and creation flow depend on.

use color_eyre::Result;

use crate::posts::Post;

/// Durable keyed store of posts.
///
/// Every write is an upsert keyed by `Post::id`. Implementations must
/// serialize their own writes since the paging coordinator and the
/// creation flow share one store.
pub trait PostStore: Send + Sync {
  /// Insert or replace a single post.
  fn insert(&self, post: &Post) -> Result<()>;

  /// Insert or replace a batch of posts.
  fn insert_all(&self, posts: &[Post]) -> Result<()>;

  /// Atomically (optionally) clear every remote-confirmed post, then upsert `posts`.
  ///
  /// Readers never observe the state between the delete and the insert.
  fn replace_page(&self, posts: &[Post], clear_confirmed: bool) -> Result<()>;

  /// Remove every post that is not local-only. Returns how many rows went away.
  fn delete_confirmed_only(&self) -> Result<usize>;

  /// Non-paginated snapshot of the whole cache, in read order.
  fn read_all_once(&self) -> Result<Vec<Post>>;

  /// One window of the cache, in read order.
  fn read_page(&self, offset: usize, limit: usize) -> Result<Vec<Post>>;

  /// Look up a post by id.
  fn get(&self, id: i64) -> Result<Option<Post>>;

  fn count(&self) -> Result<usize>;
}
