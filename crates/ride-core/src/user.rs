//! Users of the marketplace.
//!
//! Users are created at signup or seed time and are never deleted by this
//! layer. The rating is maintained by an external rating subsystem; here it is
//! read-only input to search ordering.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a user does on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Driver,
  Passenger,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub user_id: Uuid,
  pub name:    String,
  pub role:    Role,
  /// Average rating on a 0.0–5.0 scale.
  #[serde(default)]
  pub rating:  f32,
}

impl User {
  /// A freshly signed-up user with no rating yet.
  pub fn new(name: impl Into<String>, role: Role) -> Self {
    Self {
      user_id: Uuid::new_v4(),
      name: name.into(),
      role,
      rating: 0.0,
    }
  }
}
