//! Client configuration, read from an optional TOML file and `PARLEY_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use parley_local::Profile;
use serde::Deserialize;

/// Shape of `parley.toml`.
///
/// ```toml
/// data_dir = "~/.local/share/parley"
///
/// [profile]
/// display_name = "Alice"
/// photo_url    = "https://example.com/alice.png"
///
/// [notifications]
/// allow = true
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
  #[serde(default = "default_data_dir")]
  pub data_dir:      PathBuf,
  /// Who to sign in as. Without one, sign-in behaves like a closed popup.
  #[serde(default)]
  pub profile:       Option<Profile>,
  #[serde(default)]
  pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationConfig {
  /// Answer to the notification permission prompt.
  #[serde(default)]
  pub allow:        bool,
  /// Fixed device token; random per run when unset.
  #[serde(default)]
  pub device_token: Option<String>,
}

fn default_data_dir() -> PathBuf { PathBuf::from("~/.local/share/parley") }

impl ClientConfig {
  /// File values are overridden by `PARLEY_*` environment variables; nested
  /// keys use a double underscore (`PARLEY_PROFILE__DISPLAY_NAME`).
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("PARLEY").separator("__"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ClientConfig")
  }

  pub fn data_dir(&self) -> PathBuf { expand_tilde(&self.data_dir) }

  pub fn store_path(&self) -> PathBuf { self.data_dir().join("parley.db") }

  pub fn objects_dir(&self) -> PathBuf { self.data_dir().join("objects") }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
