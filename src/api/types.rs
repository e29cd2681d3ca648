//! Serde types matching the posts endpoint's JSON.
//!
//! These stay separate from [`Post`] so the wire shape can change without
//! touching what the cache stores.

use serde::{Deserialize, Serialize};

use crate::posts::{Origin, Post};

#[derive(Debug, Deserialize)]
pub struct ApiPost {
  pub id: i64,
  #[serde(rename = "userId", default)]
  pub user_id: i64,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub body: String,
}

impl ApiPost {
  /// Anything the server hands back is remote-confirmed.
  pub fn into_post(self) -> Post {
    Post {
      id: self.id,
      user_id: self.user_id,
      title: self.title,
      body: self.body,
      origin: Origin::Remote,
    }
  }
}

/// Request body for `POST /posts`
#[derive(Debug, Serialize)]
pub struct ApiNewPost<'a> {
  pub title: &'a str,
  pub body: &'a str,
  #[serde(rename = "userId")]
  pub user_id: i64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_api_post_maps_to_remote_post() {
    let json = r#"{"userId": 3, "id": 7, "title": "hello", "body": "world"}"#;
    let post = serde_json::from_str::<ApiPost>(json).unwrap().into_post();

    assert_eq!(post.id, 7);
    assert_eq!(post.user_id, 3);
    assert_eq!(post.title, "hello");
    assert_eq!(post.origin, Origin::Remote);
  }

  #[test]
  fn test_api_post_tolerates_missing_text_fields() {
    let post = serde_json::from_str::<ApiPost>(r#"{"id": 101}"#)
      .unwrap()
      .into_post();

    assert_eq!(post.id, 101);
    assert_eq!(post.title, "");
    assert_eq!(post.body, "");
  }

  #[test]
  fn test_new_post_uses_wire_field_names() {
    let body = ApiNewPost {
      title: "T",
      body: "B",
      user_id: 1,
    };
    let value = serde_json::to_value(&body).unwrap();

    assert_eq!(value, serde_json::json!({"title": "T", "body": "B", "userId": 1}));
  }
}
