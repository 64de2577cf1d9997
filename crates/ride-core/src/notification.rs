//! Notifications addressed to passengers affected by a trip mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The trip event that caused a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
  TripUpdated,
  TripDeleted,
  TripCancelled,
}

/// Only `read` ever changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
  pub notification_id: Uuid,
  /// Recipient.
  pub user_id:         Uuid,
  pub kind:            NotificationKind,
  pub title:           String,
  pub message:         String,
  pub trip_id:         Uuid,
  #[serde(default)]
  pub read:            bool,
  pub created_at:      DateTime<Utc>,
}
