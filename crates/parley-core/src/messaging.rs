//! Push-messaging client: notification permission and device token.

use std::future::Future;

use serde::{Deserialize, Serialize};

/// Collection that maps device tokens to their owner.
pub const DEVICE_TOKENS_COLLECTION: &str = "fcmTokens";

/// Notification permission as granted by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
  /// Not asked yet.
  #[default]
  Default,
  Granted,
  Denied,
}

pub trait PushMessaging: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Ask the user for permission to show notifications.
  fn request_permission(
    &self,
  ) -> impl Future<Output = Result<Permission, Self::Error>> + Send + '_;

  /// This device's token, or `None` when notifications are not permitted.
  fn device_token(
    &self,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;
}
