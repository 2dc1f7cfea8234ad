//! Application navigation.

use std::fmt;

/// The views the chat service navigates between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
  Login,
  Chat,
}

impl Route {
  pub fn path(self) -> &'static str {
    match self {
      Self::Login => "/login",
      Self::Chat => "/chat",
    }
  }
}

impl fmt::Display for Route {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.path())
  }
}

/// Implemented by the UI layer.
pub trait Navigator: Send + Sync {
  fn navigate(&self, route: Route);
}
