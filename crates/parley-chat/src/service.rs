//! [`ChatService`] — sign in and out, send messages, observe recent ones.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use parley_core::{
  auth::IdentityProvider,
  document::{CollectionPath, DocPath, Document, Fields, fields_from_value},
  identity::{Credential, Identity},
  live::{IdentityChanges, RecentMessages},
  message::{LOADING_IMAGE_URL, MessageRef, NewMessage, RECENT_MESSAGE_LIMIT},
  messaging::{DEVICE_TOKENS_COLLECTION, Permission, PushMessaging},
  navigation::{Navigator, Route},
  session::SessionHolder,
  storage::{ObjectStorage, StoredObject},
  store::{DocumentStore, MessageStore},
};
use serde_json::Value;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, error, info, warn};

use crate::{
  Error, Result,
  backend::{Backend, Providers},
};

// ─── Send outcome ────────────────────────────────────────────────────────────

/// Why a send wrote nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
  /// Neither text nor an image was given.
  EmptyMessage,
  /// Nobody is signed in.
  SignedOut,
}

/// Result of a send that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
  Sent(MessageRef),
  Skipped(SkipReason),
}

impl SendOutcome {
  pub fn message_ref(&self) -> Option<&MessageRef> {
    match self {
      Self::Sent(r) => Some(r),
      Self::Skipped(_) => None,
    }
  }

  pub fn is_sent(&self) -> bool { matches!(self, Self::Sent(_)) }
}

fn non_empty(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.is_empty())
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// The chat client's single service object.
///
/// On construction it subscribes to the identity provider's auth state and
/// mirrors it into the session holder for as long as the service lives.
pub struct ChatService<B: Backend> {
  providers:  Providers<B>,
  session:    SessionHolder,
  /// Shared with the mirror task. Sign-in and sign-out mark the provider's
  /// state as seen so a notification they caused is not applied again.
  auth_state: Arc<Mutex<watch::Receiver<Option<Identity>>>>,
  auth_sync:  JoinHandle<()>,
}

impl<B: Backend> ChatService<B> {
  /// Must be called from within a tokio runtime.
  pub fn new(providers: Providers<B>) -> Self {
    let mut auth_state = providers.auth.auth_state();
    let session = SessionHolder::new(auth_state.borrow_and_update().clone());
    let auth_state = Arc::new(Mutex::new(auth_state));

    let mirror = session.clone();
    let shared = Arc::clone(&auth_state);
    let auth_sync = tokio::spawn(async move {
      loop {
        // Wait on a copy so the lock is never held across an await.
        let mut waiter = match shared.lock() {
          Ok(rx) => rx.clone(),
          Err(_) => break,
        };
        if waiter.changed().await.is_err() {
          break;
        }

        let user = {
          let Ok(mut rx) = shared.lock() else { break };
          match rx.has_changed() {
            Ok(true) => rx.borrow_and_update().clone(),
            Ok(false) => continue,
            Err(_) => break,
          }
        };
        if mirror.set(user) {
          debug!(signed_in = mirror.current().is_some(), "auth state changed");
        }
      }
    });

    Self { providers, session, auth_state, auth_sync }
  }

  /// Treat the provider's current auth state as already applied.
  fn mark_auth_state_seen(&self) {
    if let Ok(mut rx) = self.auth_state.lock() {
      rx.borrow_and_update();
    }
  }

  /// The signed-in user, if any.
  pub fn current_user(&self) -> Option<Identity> { self.session.current() }

  /// The signed-in user now and on every change.
  pub fn user_changes(&self) -> IdentityChanges { self.session.changes() }

  // ── Session ─────────────────────────────────────────────────────────────

  /// Sign in through the provider's interactive flow, then go to the chat
  /// view.
  pub async fn sign_in(&self) -> Result<Credential> {
    let result = self
      .providers
      .auth
      .sign_in_with_popup()
      .await
      .map_err(|e| {
        warn!(error = %e, "sign in failed");
        Error::SignIn(Box::new(e))
      })?;

    self.mark_auth_state_seen();
    self.session.set(Some(result.user.clone()));
    info!(uid = %result.user.uid, "signed in");
    self.providers.navigator.navigate(Route::Chat);
    Ok(result.credential)
  }

  /// Sign out and go to the login view.
  ///
  /// The local session is cleared and the navigation happens even when the
  /// provider reports a failure; that failure is still returned. The session
  /// then stays signed out even though the provider may still report the
  /// user, until the provider's auth state next changes.
  pub async fn sign_out(&self) -> Result<()> {
    let result = self.providers.auth.sign_out().await;
    self.mark_auth_state_seen();
    self.session.set(None);
    self.providers.navigator.navigate(Route::Login);

    match result {
      Ok(()) => {
        info!("signed out");
        Ok(())
      }
      Err(e) => {
        error!(error = %e, "sign out error");
        Err(Error::SignOut(Box::new(e)))
      }
    }
  }

  // ── Messages ────────────────────────────────────────────────────────────

  /// Append a text and/or image message from the signed-in user.
  ///
  /// Writes nothing, without error, when there is no content or no user;
  /// the returned [`SendOutcome`] says which.
  pub async fn send(
    &self,
    text: Option<String>,
    image_url: Option<String>,
  ) -> Result<SendOutcome> {
    let text = non_empty(text);
    let image_url = non_empty(image_url);

    if text.is_none() && image_url.is_none() {
      debug!("empty message not sent");
      return Ok(SendOutcome::Skipped(SkipReason::EmptyMessage));
    }
    let Some(sender) = self.session.current() else {
      debug!("message not sent: signed out");
      return Ok(SendOutcome::Skipped(SkipReason::SignedOut));
    };

    let message = NewMessage::from_sender(&sender, text, image_url);
    match self.providers.store.append_message(message).await {
      Ok(message_ref) => {
        debug!(path = %message_ref.path, "message sent");
        Ok(SendOutcome::Sent(message_ref))
      }
      Err(e) => {
        error!(error = %e, "error writing message to the store");
        Err(Error::store(e))
      }
    }
  }

  pub async fn send_text(&self, text: impl Into<String>) -> Result<SendOutcome> {
    self.send(Some(text.into()), None).await
  }

  /// Live view of the most recent messages, newest first.
  pub async fn observe_recent(&self) -> Result<RecentMessages> {
    self
      .providers
      .store
      .watch_recent(RECENT_MESSAGE_LIMIT)
      .await
      .map_err(Error::store)
  }

  /// Post an image message.
  ///
  /// A placeholder message with a loading image goes out first; once the
  /// file is stored under `{uid}/{message id}/{file name}` its download URL
  /// is fetched from storage and patched into the message.
  pub async fn send_image(
    &self,
    file_name: &str,
    data: Bytes,
    content_type: &str,
  ) -> Result<SendOutcome> {
    if file_name.is_empty() || file_name.contains('/') {
      return Err(parley_core::Error::InvalidObjectPath(file_name.to_owned()).into());
    }
    let Some(sender) = self.session.current() else {
      debug!("image not sent: signed out");
      return Ok(SendOutcome::Skipped(SkipReason::SignedOut));
    };

    let outcome = self.send(None, Some(LOADING_IMAGE_URL.to_owned())).await?;
    let SendOutcome::Sent(message_ref) = &outcome else {
      return Ok(outcome);
    };

    let path = format!("{}/{}/{file_name}", sender.uid, message_ref.id);
    let object = self.upload_to_storage(&path, data, content_type).await?;
    let download_url = self
      .providers
      .storage
      .download_url(&object.path)
      .await
      .map_err(Error::storage)?;

    self
      .providers
      .store
      .patch_image(message_ref.id, download_url, object.path)
      .await
      .map_err(|e| {
        error!(error = %e, "error updating image message");
        Error::store(e)
      })?;

    info!(path = %message_ref.path, "image message sent");
    Ok(outcome)
  }

  /// Store a file and return its metadata, including a download URL.
  pub async fn upload_to_storage(
    &self,
    path: &str,
    data: Bytes,
    content_type: &str,
  ) -> Result<StoredObject> {
    let object = self
      .providers
      .storage
      .upload(path, data, content_type)
      .await
      .map_err(|e| {
        error!(error = %e, path, "upload failed");
        Error::storage(e)
      })?;
    debug!(path = %object.path, size = object.size, "uploaded");
    Ok(object)
  }

  // ── Documents ───────────────────────────────────────────────────────────

  pub async fn get_document(&self, path: &str) -> Result<Option<Document>> {
    let path = DocPath::parse(path)?;
    self
      .providers
      .store
      .get_document(&path)
      .await
      .map_err(Error::store)
  }

  pub async fn list_collection(&self, path: &str) -> Result<Vec<Document>> {
    let path = CollectionPath::parse(path)?;
    self
      .providers
      .store
      .list_collection(&path)
      .await
      .map_err(Error::store)
  }

  /// Merge the top-level fields of `data` (a JSON object) into a document.
  pub async fn update_document(&self, path: &str, data: Value) -> Result<Document> {
    let path = DocPath::parse(path)?;
    let fields = fields_from_value(data)?;
    self
      .providers
      .store
      .merge_document(&path, fields)
      .await
      .map_err(Error::store)
  }

  pub async fn delete_document(&self, path: &str) -> Result<bool> {
    let path = DocPath::parse(path)?;
    self
      .providers
      .store
      .delete_document(&path)
      .await
      .map_err(Error::store)
  }

  // ── Notifications ───────────────────────────────────────────────────────

  /// Ask for notification permission; when granted, register this device.
  pub async fn request_notification_permission(&self) -> Result<Permission> {
    let permission = self
      .providers
      .messaging
      .request_permission()
      .await
      .map_err(Error::messaging)?;

    if permission == Permission::Granted {
      self.save_device_token().await?;
    } else {
      info!(?permission, "notifications not permitted");
    }
    Ok(permission)
  }

  /// Record this device's token against the signed-in user under
  /// `fcmTokens/{token}`.
  ///
  /// Returns the token, or `None` when there is no token or no user.
  pub async fn save_device_token(&self) -> Result<Option<String>> {
    let token = self
      .providers
      .messaging
      .device_token()
      .await
      .map_err(Error::messaging)?;

    let Some(token) = token else {
      info!("no device token; request notification permission first");
      return Ok(None);
    };
    let Some(user) = self.session.current() else {
      debug!("device token not saved: signed out");
      return Ok(None);
    };

    let path = CollectionPath::parse(DEVICE_TOKENS_COLLECTION)?.doc(&token)?;
    let mut data = Fields::new();
    data.insert("uid".to_owned(), Value::String(user.uid));

    self
      .providers
      .store
      .merge_document(&path, data)
      .await
      .map_err(Error::store)?;

    info!("device token saved");
    Ok(Some(token))
  }
}

impl<B: Backend> Drop for ChatService<B> {
  fn drop(&mut self) { self.auth_sync.abort(); }
}
