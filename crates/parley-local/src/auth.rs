//! [`LocalAuth`] — an identity provider that signs in as a configured
//! profile.
//!
//! There is no interactive window; a missing profile behaves like a user who
//! closed the sign-in popup.

use parley_core::{
  auth::IdentityProvider,
  identity::{Credential, Identity, UserCredential},
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use crate::{Error, Result};

pub const PROVIDER_ID: &str = "local";

/// The user to sign in as.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
  pub display_name: String,
  #[serde(default)]
  pub photo_url:    Option<String>,
  /// Defaults to a stable id derived from `display_name`.
  #[serde(default)]
  pub uid:          Option<String>,
}

impl Profile {
  pub fn uid(&self) -> String {
    self.uid.clone().unwrap_or_else(|| {
      let digest = Sha256::digest(self.display_name.as_bytes());
      hex::encode(digest)[..28].to_owned()
    })
  }

  pub fn identity(&self) -> Identity {
    Identity {
      uid:          self.uid(),
      display_name: Some(self.display_name.clone()),
      photo_url:    self.photo_url.clone(),
    }
  }
}

#[derive(Debug)]
pub struct LocalAuth {
  profile: Option<Profile>,
  state:   watch::Sender<Option<Identity>>,
}

impl LocalAuth {
  pub fn new(profile: Option<Profile>) -> Self {
    let (state, _) = watch::channel(None);
    Self { profile, state }
  }
}

impl IdentityProvider for LocalAuth {
  type Error = Error;

  async fn sign_in_with_popup(&self) -> Result<UserCredential> {
    let profile = self.profile.as_ref().ok_or(Error::SignInCancelled)?;
    let user = profile.identity();
    info!(uid = %user.uid, "signed in with local profile");
    self.state.send_replace(Some(user.clone()));
    Ok(UserCredential {
      user,
      credential: Credential {
        provider_id:  PROVIDER_ID.to_owned(),
        access_token: Uuid::new_v4().simple().to_string(),
        id_token:     None,
      },
    })
  }

  async fn sign_out(&self) -> Result<()> {
    self.state.send_replace(None);
    Ok(())
  }

  fn auth_state(&self) -> watch::Receiver<Option<Identity>> { self.state.subscribe() }
}
