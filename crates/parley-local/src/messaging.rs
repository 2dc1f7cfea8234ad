//! [`LocalMessaging`] — notification permission and a per-device token.

use parley_core::messaging::{Permission, PushMessaging};
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug)]
pub struct LocalMessaging {
  /// What the "user" answers when asked.
  allow:      bool,
  token:      String,
  permission: watch::Sender<Permission>,
}

impl LocalMessaging {
  /// `token` defaults to a fresh random id.
  pub fn new(allow: bool, token: Option<String>) -> Self {
    let (permission, _) = watch::channel(Permission::Default);
    Self {
      allow,
      token: token.unwrap_or_else(|| Uuid::new_v4().simple().to_string()),
      permission,
    }
  }

  fn permission(&self) -> Permission { *self.permission.borrow() }
}

impl PushMessaging for LocalMessaging {
  type Error = Error;

  async fn request_permission(&self) -> Result<Permission> {
    let answer = if self.allow { Permission::Granted } else { Permission::Denied };
    self.permission.send_replace(answer);
    info!(permission = ?answer, "notification permission requested");
    Ok(answer)
  }

  async fn device_token(&self) -> Result<Option<String>> {
    Ok((self.permission() == Permission::Granted).then(|| self.token.clone()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn token_only_after_permission_granted() {
    let messaging = LocalMessaging::new(true, Some("tok".into()));
    assert_eq!(messaging.device_token().await.unwrap(), None);
    assert_eq!(messaging.request_permission().await.unwrap(), Permission::Granted);
    assert_eq!(messaging.device_token().await.unwrap().as_deref(), Some("tok"));
  }

  #[tokio::test]
  async fn denied_permission_has_no_token() {
    let messaging = LocalMessaging::new(false, None);
    assert_eq!(messaging.request_permission().await.unwrap(), Permission::Denied);
    assert_eq!(messaging.permission(), Permission::Denied);
    assert_eq!(messaging.device_token().await.unwrap(), None);
  }
}
