//! Composition root: which client serves each boundary of the chat service.

use std::sync::Arc;

use anyhow::Context as _;
use parley_chat::{Backend, ChatService, Providers};
use parley_core::navigation::{Navigator, Route};
use parley_local::{FsObjectStorage, LocalAuth, LocalMessaging, SqliteStore};

use crate::settings::ClientConfig;

/// Every boundary served from the local data directory.
pub struct LocalBackend;

impl Backend for LocalBackend {
  type Auth = LocalAuth;
  type Store = SqliteStore;
  type Storage = FsObjectStorage;
  type Messaging = LocalMessaging;
  type Navigator = TerminalNavigator;
}

/// There are no views in a terminal; route changes are only logged.
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
  fn navigate(&self, route: Route) {
    tracing::info!(%route, "navigate");
  }
}

pub async fn connect(config: &ClientConfig) -> anyhow::Result<ChatService<LocalBackend>> {
  let data_dir = config.data_dir();
  tokio::fs::create_dir_all(&data_dir)
    .await
    .with_context(|| format!("failed to create data dir {data_dir:?}"))?;

  let store_path = config.store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let objects_dir = config.objects_dir();
  let storage = FsObjectStorage::open(&objects_dir)
    .await
    .with_context(|| format!("failed to open object storage at {objects_dir:?}"))?;

  let providers = Providers::<LocalBackend> {
    auth:      Arc::new(LocalAuth::new(config.profile.clone())),
    store:     Arc::new(store),
    storage:   Arc::new(storage),
    messaging: Arc::new(LocalMessaging::new(
      config.notifications.allow,
      config.notifications.device_token.clone(),
    )),
    navigator: Arc::new(TerminalNavigator),
  };

  tracing::debug!(data_dir = ?data_dir, "connected local backend");
  Ok(ChatService::new(providers))
}
