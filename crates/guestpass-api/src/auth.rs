// Session and tenant handles
//
// A session is the `name=value` part of the cookie returned by key login.
// It is valid for one rotation attempt and is never persisted or logged.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

/// Authenticated session token for the controller API.
///
/// Holds only the portion of the login cookie before its first `;`
/// (attributes such as `Path=/` are dropped). `Debug` output is redacted.
#[derive(Debug)]
pub struct Session(SecretString);

impl Session {
    /// Build a session from the raw cookie string returned by key login.
    ///
    /// Returns `None` when nothing usable remains after stripping attributes.
    pub fn from_cookie(raw: &str) -> Option<Self> {
        let token = raw.split(';').next().unwrap_or_default().trim();
        if token.is_empty() {
            None
        } else {
            Some(Self(SecretString::from(token.to_owned())))
        }
    }

    /// The value sent in the `Cookie` request header.
    pub fn cookie_header(&self) -> &str {
        self.0.expose_secret()
    }
}

/// Organizational scope (`orgID`) the guest account lives under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
