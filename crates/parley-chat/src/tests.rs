//! Service tests: real local store and storage, scripted auth and
//! navigation.

use std::{
  path::PathBuf,
  sync::{Arc, Mutex},
  time::Duration,
};

use bytes::Bytes;
use parley_core::{
  auth::IdentityProvider,
  document::{CollectionPath, DocPath, Document, Fields},
  identity::{Credential, Identity, UserCredential},
  live::RecentMessages,
  message::{ChatMessage, LOADING_IMAGE_URL, MessageRef, NewMessage},
  messaging::Permission,
  navigation::{Navigator, Route},
  storage::ObjectStorage,
  store::{DocumentStore, MessageStore},
};
use parley_local::{FsObjectStorage, LocalMessaging, SqliteStore};
use serde_json::json;
use tokio::sync::watch;
use uuid::Uuid;

use crate::{Backend, ChatService, Error, Providers, SendOutcome, SkipReason};

// ─── Fakes ───────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct FakeError(&'static str);

/// Signs in as `user`, or fails like a closed popup when `user` is `None`.
struct FakeAuth {
  user:          Option<Identity>,
  fail_sign_out: bool,
  state:         watch::Sender<Option<Identity>>,
}

impl FakeAuth {
  fn new(user: Option<Identity>, fail_sign_out: bool) -> Self {
    let (state, _) = watch::channel(None);
    Self { user, fail_sign_out, state }
  }
}

impl IdentityProvider for FakeAuth {
  type Error = FakeError;

  async fn sign_in_with_popup(&self) -> Result<UserCredential, FakeError> {
    let user = self.user.clone().ok_or(FakeError("popup closed by user"))?;
    self.state.send_replace(Some(user.clone()));
    Ok(UserCredential {
      user,
      credential: Credential {
        provider_id:  "fake".into(),
        access_token: "token".into(),
        id_token:     None,
      },
    })
  }

  async fn sign_out(&self) -> Result<(), FakeError> {
    if self.fail_sign_out {
      return Err(FakeError("network down"));
    }
    self.state.send_replace(None);
    Ok(())
  }

  fn auth_state(&self) -> watch::Receiver<Option<Identity>> { self.state.subscribe() }
}

#[derive(Default)]
struct RecordingNavigator {
  routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
  fn routes(&self) -> Vec<Route> { self.routes.lock().unwrap().clone() }
}

impl Navigator for RecordingNavigator {
  fn navigate(&self, route: Route) { self.routes.lock().unwrap().push(route); }
}

/// A store whose appends always fail.
struct FailingStore;

impl MessageStore for FailingStore {
  type Error = FakeError;
  async fn append_message(&self, _: NewMessage) -> Result<MessageRef, FakeError> { Err(FakeError("write rejected")) }
  async fn patch_image(&self, _: Uuid, _: String, _: String) -> Result<ChatMessage, FakeError> { unimplemented!() }
  async fn get_message(&self, _: Uuid) -> Result<Option<ChatMessage>, FakeError> { unimplemented!() }
  async fn watch_recent(&self, _: usize) -> Result<RecentMessages, FakeError> { unimplemented!() }
}

impl DocumentStore for FailingStore {
  type Error = FakeError;
  async fn get_document(&self, _: &DocPath) -> Result<Option<Document>, FakeError> { unimplemented!() }
  async fn list_collection(&self, _: &CollectionPath) -> Result<Vec<Document>, FakeError> { unimplemented!() }
  async fn merge_document(&self, _: &DocPath, _: Fields) -> Result<Document, FakeError> { unimplemented!() }
  async fn delete_document(&self, _: &DocPath) -> Result<bool, FakeError> { unimplemented!() }
}

struct TestBackend;

impl Backend for TestBackend {
  type Auth = FakeAuth;
  type Store = SqliteStore;
  type Storage = FsObjectStorage;
  type Messaging = LocalMessaging;
  type Navigator = RecordingNavigator;
}

struct FailingBackend;

impl Backend for FailingBackend {
  type Auth = FakeAuth;
  type Store = FailingStore;
  type Storage = FsObjectStorage;
  type Messaging = LocalMessaging;
  type Navigator = RecordingNavigator;
}

// ─── Harness ─────────────────────────────────────────────────────────────────

fn alice() -> Identity {
  Identity {
    uid:          "uid-alice".into(),
    display_name: Some("Alice".into()),
    photo_url:    Some("https://example.com/alice.png".into()),
  }
}

struct Harness {
  chat:      ChatService<TestBackend>,
  auth:      Arc<FakeAuth>,
  store:     Arc<SqliteStore>,
  storage:   Arc<FsObjectStorage>,
  navigator: Arc<RecordingNavigator>,
  dir:       PathBuf,
}

impl Harness {
  async fn new(user: Option<Identity>, fail_sign_out: bool, allow_notifications: bool) -> Self {
    let dir = std::env::temp_dir().join(format!("parley-chat-test-{}", Uuid::new_v4()));
    let auth = Arc::new(FakeAuth::new(user, fail_sign_out));
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let storage = Arc::new(FsObjectStorage::open(&dir).await.unwrap());
    let navigator = Arc::new(RecordingNavigator::default());
    let messaging = Arc::new(LocalMessaging::new(allow_notifications, Some("device-1".into())));

    let chat = ChatService::new(Providers::<TestBackend> {
      auth:      auth.clone(),
      store:     store.clone(),
      storage:   storage.clone(),
      messaging,
      navigator: navigator.clone(),
    });
    Self { chat, auth, store, storage, navigator, dir }
  }

  async fn signed_in() -> Self {
    let h = Self::new(Some(alice()), false, true).await;
    h.chat.sign_in().await.unwrap();
    h
  }

  async fn signed_out() -> Self { Self::new(Some(alice()), false, true).await }
}

impl Drop for Harness {
  fn drop(&mut self) { std::fs::remove_dir_all(&self.dir).ok(); }
}

// ─── Session ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sign_in_updates_session_and_navigates_to_chat() {
  let h = Harness::signed_out().await;
  let mut changes = h.chat.user_changes();
  assert_eq!(changes.next().await, Some(None));

  let credential = h.chat.sign_in().await.unwrap();
  assert_eq!(credential.provider_id, "fake");

  // Snapshot is already current before the change stream is read.
  assert_eq!(h.chat.current_user(), Some(alice()));
  assert_eq!(changes.next().await, Some(Some(alice())));
  assert_eq!(h.navigator.routes(), [Route::Chat]);
}

#[tokio::test]
async fn cancelled_sign_in_propagates_and_stays_put() {
  let h = Harness::new(None, false, true).await;

  assert!(matches!(h.chat.sign_in().await, Err(Error::SignIn(_))));
  assert!(h.chat.current_user().is_none());
  assert!(h.navigator.routes().is_empty());
}

#[tokio::test]
async fn sign_out_clears_session_and_navigates_to_login() {
  let h = Harness::signed_in().await;

  h.chat.sign_out().await.unwrap();
  assert!(h.chat.current_user().is_none());
  assert_eq!(h.navigator.routes(), [Route::Chat, Route::Login]);
}

#[tokio::test]
async fn failed_sign_out_is_reported_but_still_navigates_once() {
  let h = Harness::new(Some(alice()), true, true).await;
  h.chat.sign_in().await.unwrap();

  assert!(matches!(h.chat.sign_out().await, Err(Error::SignOut(_))));
  let logins = h.navigator.routes().iter().filter(|r| **r == Route::Login).count();
  assert_eq!(logins, 1);
  assert!(h.chat.current_user().is_none());
}

#[tokio::test]
async fn failed_sign_out_keeps_session_cleared_until_provider_changes() {
  let h = Harness::new(Some(alice()), true, true).await;
  h.chat.sign_in().await.unwrap();
  assert!(h.chat.sign_out().await.is_err());

  // The provider still reports the user, but that is not re-applied.
  tokio::time::sleep(Duration::from_millis(50)).await;
  assert_eq!(*h.auth.state.borrow(), Some(alice()));
  assert!(h.chat.current_user().is_none());

  // A later provider change is mirrored as usual.
  let mut changes = h.chat.user_changes();
  assert_eq!(changes.next().await, Some(None));
  h.auth.state.send_replace(Some(alice()));
  assert_eq!(changes.next().await, Some(Some(alice())));
}

#[tokio::test]
async fn provider_auth_changes_reach_the_session() {
  let h = Harness::signed_out().await;
  let mut changes = h.chat.user_changes();
  assert_eq!(changes.next().await, Some(None));

  // The provider reports a user on its own, e.g. a restored session.
  h.auth.state.send_replace(Some(alice()));
  assert_eq!(changes.next().await, Some(Some(alice())));
  assert_eq!(h.chat.current_user(), Some(alice()));
}

// ─── Sending ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_send_writes_nothing() {
  let h = Harness::signed_in().await;

  let outcome = h.chat.send(None, None).await.unwrap();
  assert_eq!(outcome, SendOutcome::Skipped(SkipReason::EmptyMessage));

  let outcome = h.chat.send(Some(String::new()), None).await.unwrap();
  assert_eq!(outcome, SendOutcome::Skipped(SkipReason::EmptyMessage));
  assert_eq!(h.store.message_count().await.unwrap(), 0);
}

#[tokio::test]
async fn empty_send_while_signed_out_writes_nothing() {
  let h = Harness::signed_out().await;
  let outcome = h.chat.send(None, None).await.unwrap();
  assert_eq!(outcome, SendOutcome::Skipped(SkipReason::EmptyMessage));
  assert_eq!(h.store.message_count().await.unwrap(), 0);
}

#[tokio::test]
async fn send_while_signed_out_writes_nothing() {
  let h = Harness::signed_out().await;
  let outcome = h.chat.send_text("hello").await.unwrap();
  assert_eq!(outcome, SendOutcome::Skipped(SkipReason::SignedOut));
  assert!(outcome.message_ref().is_none());
  assert_eq!(h.store.message_count().await.unwrap(), 0);
}

#[tokio::test]
async fn send_text_appends_one_message_from_the_user() {
  let h = Harness::signed_in().await;
  let earlier = h.chat.send_text("first").await.unwrap();

  let outcome = h.chat.send_text("hello").await.unwrap();
  let r = outcome.message_ref().unwrap();
  assert_eq!(h.store.message_count().await.unwrap(), 2);

  let msg = h.store.get_message(r.id).await.unwrap().unwrap();
  assert_eq!(msg.text.as_deref(), Some("hello"));
  assert!(msg.image_url.is_none());
  assert_eq!(msg.uid.as_deref(), Some("uid-alice"));
  assert_eq!(msg.name.as_deref(), Some("Alice"));
  assert_eq!(msg.profile_pic_url.as_deref(), Some("https://example.com/alice.png"));

  let prev = h.store.get_message(earlier.message_ref().unwrap().id).await.unwrap().unwrap();
  assert!(msg.timestamp > prev.timestamp);
}

#[tokio::test]
async fn append_failure_is_returned() {
  let dir = std::env::temp_dir().join(format!("parley-chat-test-{}", Uuid::new_v4()));
  let chat = ChatService::new(Providers::<FailingBackend> {
    auth:      Arc::new(FakeAuth::new(Some(alice()), false)),
    store:     Arc::new(FailingStore),
    storage:   Arc::new(FsObjectStorage::open(&dir).await.unwrap()),
    messaging: Arc::new(LocalMessaging::new(false, None)),
    navigator: Arc::new(RecordingNavigator::default()),
  });
  chat.sign_in().await.unwrap();

  assert!(matches!(chat.send_text("hello").await, Err(Error::Store(_))));
  std::fs::remove_dir_all(&dir).ok();
}

// ─── Observing ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn observe_recent_shows_the_twelve_newest() {
  let h = Harness::signed_in().await;
  for i in 1..=15 {
    h.chat.send_text(format!("t{i}")).await.unwrap();
  }

  let mut recent = h.chat.observe_recent().await.unwrap();
  let messages = recent.next().await.unwrap();
  let texts: Vec<_> = messages.iter().filter_map(|m| m.text.clone()).collect();
  let expected: Vec<_> = (4..=15).rev().map(|i| format!("t{i}")).collect();
  assert_eq!(texts, expected);
}

#[tokio::test]
async fn observe_recent_sees_later_sends() {
  let h = Harness::signed_in().await;
  let mut recent = h.chat.observe_recent().await.unwrap();
  assert!(recent.next().await.unwrap().is_empty());

  h.chat.send_text("live").await.unwrap();
  let update = recent.next().await.unwrap();
  assert_eq!(update[0].text.as_deref(), Some("live"));
}

// ─── Images ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn image_message_is_uploaded_and_patched() {
  let h = Harness::signed_in().await;

  let outcome = h
    .chat
    .send_image("cat.png", Bytes::from_static(b"png"), "image/png")
    .await
    .unwrap();
  let r = outcome.message_ref().unwrap();

  let msg = h.store.get_message(r.id).await.unwrap().unwrap();
  let expected_path = format!("uid-alice/{}/cat.png", r.id);
  assert_eq!(msg.storage_uri.as_deref(), Some(expected_path.as_str()));
  let url = msg.image_url.unwrap();
  assert_ne!(url, LOADING_IMAGE_URL);
  assert_eq!(url, h.storage.download_url(&expected_path).await.unwrap());
  assert!(msg.text.is_none());

  let on_disk = tokio::fs::read(h.storage.root().join(&expected_path)).await.unwrap();
  assert_eq!(on_disk, b"png");
}

#[tokio::test]
async fn image_while_signed_out_uploads_nothing() {
  let h = Harness::signed_out().await;
  let outcome = h
    .chat
    .send_image("cat.png", Bytes::from_static(b"png"), "image/png")
    .await
    .unwrap();
  assert_eq!(outcome, SendOutcome::Skipped(SkipReason::SignedOut));
  assert_eq!(h.store.message_count().await.unwrap(), 0);
}

#[tokio::test]
async fn image_file_name_must_be_one_segment() {
  let h = Harness::signed_in().await;
  assert!(matches!(
    h.chat.send_image("a/b.png", Bytes::new(), "image/png").await,
    Err(Error::Core(_))
  ));
  assert_eq!(h.store.message_count().await.unwrap(), 0);
}

// ─── Documents ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn document_round_trip_through_the_service() {
  let h = Harness::signed_in().await;

  h.chat.update_document("prefs/alice", json!({ "theme": "dark" })).await.unwrap();
  h.chat.update_document("prefs/alice", json!({ "lang": "en" })).await.unwrap();

  let doc = h.chat.get_document("prefs/alice").await.unwrap().unwrap();
  assert_eq!(doc.data["theme"], "dark");
  assert_eq!(doc.data["lang"], "en");
  assert_eq!(h.chat.list_collection("prefs").await.unwrap().len(), 1);

  assert!(h.chat.delete_document("prefs/alice").await.unwrap());
  assert!(h.chat.get_document("prefs/alice").await.unwrap().is_none());
}

#[tokio::test]
async fn bad_paths_are_rejected() {
  let h = Harness::signed_in().await;
  assert!(matches!(h.chat.get_document("prefs").await, Err(Error::Core(_))));
  assert!(matches!(h.chat.list_collection("prefs/alice").await, Err(Error::Core(_))));
  assert!(matches!(
    h.chat.update_document("prefs/alice", json!("not an object")).await,
    Err(Error::Core(_))
  ));
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[tokio::test]
async fn granted_permission_registers_device_token() {
  let h = Harness::signed_in().await;

  let permission = h.chat.request_notification_permission().await.unwrap();
  assert_eq!(permission, Permission::Granted);

  let doc = h.chat.get_document("fcmTokens/device-1").await.unwrap().unwrap();
  assert_eq!(doc.data["uid"], "uid-alice");
}

#[tokio::test]
async fn denied_permission_registers_nothing() {
  let h = Harness::new(Some(alice()), false, false).await;
  h.chat.sign_in().await.unwrap();

  assert_eq!(h.chat.request_notification_permission().await.unwrap(), Permission::Denied);
  assert_eq!(h.chat.save_device_token().await.unwrap(), None);
  assert!(h.chat.list_collection("fcmTokens").await.unwrap().is_empty());
}

#[tokio::test]
async fn device_token_needs_a_user() {
  let h = Harness::signed_out().await;

  assert_eq!(h.chat.request_notification_permission().await.unwrap(), Permission::Granted);
  assert_eq!(h.chat.save_device_token().await.unwrap(), None);
  assert!(h.chat.list_collection("fcmTokens").await.unwrap().is_empty());
}
