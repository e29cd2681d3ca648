/// Where a cached post's current content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
  /// Created on this device, not yet acknowledged by the server
  Local,
  /// Fetched from, or acknowledged by, the server
  Remote,
}

impl Origin {
  pub fn as_str(&self) -> &'static str {
    match self {
      Origin::Local => "local",
      Origin::Remote => "remote",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "local" => Some(Origin::Local),
      "remote" => Some(Origin::Remote),
      _ => None,
    }
  }
}

/// A single post as stored in the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
  pub id: i64,
  pub user_id: i64,
  pub title: String,
  pub body: String,
  pub origin: Origin,
}

impl Post {
  pub fn is_local(&self) -> bool {
    self.origin == Origin::Local
  }
}
