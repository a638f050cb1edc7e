//! Login credentials.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Username and password for the EPB customer portal.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The login name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Returns true if either field is blank.
    pub fn is_incomplete(&self) -> bool {
        self.username.trim().is_empty() || self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new("user@example.com", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("user@example.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_is_incomplete() {
        assert!(Credentials::new("", "pw").is_incomplete());
        assert!(Credentials::new("  ", "pw").is_incomplete());
        assert!(Credentials::new("user", "").is_incomplete());
        assert!(!Credentials::new("user", "pw").is_incomplete());
    }
}
