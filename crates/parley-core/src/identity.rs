//! The signed-in user as reported by an identity provider.

use serde::{Deserialize, Serialize};

/// The authenticated user's stable id plus display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub uid:          String,
  pub display_name: Option<String>,
  pub photo_url:    Option<String>,
}

/// The provider's credential object returned from an interactive sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
  /// e.g. `"google.com"` for a federated provider, `"local"` for the
  /// profile-based provider.
  pub provider_id:  String,
  pub access_token: String,
  pub id_token:     Option<String>,
}

/// Result of a successful [`crate::auth::IdentityProvider::sign_in_with_popup`].
#[derive(Debug, Clone)]
pub struct UserCredential {
  pub user:       Identity,
  pub credential: Credential,
}
