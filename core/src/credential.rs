//! Credentials and the shared credential store.

use std::collections::HashMap;
use std::fmt;

use base64::Engine;
use parking_lot::RwLock;
use url::Url;

use crate::config::{AuthenticationMethod, ProtectionSpace};

/// How long a credential outlives the dispatch that introduced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Persistence {
    /// Used for the one dispatch only.
    None,
    /// Kept in the transport's `CredentialStorage` for this process.
    #[default]
    ForSession,
    /// Kept in the transport's `CredentialStorage`; durable persistence is
    /// left to whoever owns the storage.
    Permanent,
}

/// A user/secret pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub user: String,
    secret: String,
    pub persistence: Persistence,
}

impl Credential {
    pub fn new(user: impl Into<String>, secret: impl Into<String>, persistence: Persistence) -> Self {
        Self {
            user: user.into(),
            secret: secret.into(),
            persistence,
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// `Authorization` header value for HTTP Basic.
    pub fn basic_authorization(&self) -> String {
        let token = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", self.user, self.secret));
        format!("Basic {token}")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("user", &self.user)
            .field("secret", &"<redacted>")
            .field("persistence", &self.persistence)
            .finish()
    }
}

/// A credential bound to the protection space it is valid for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedCredential {
    pub credential: Credential,
    pub space: ProtectionSpace,
}

impl ScopedCredential {
    /// Whether this credential may be sent preemptively to `url`.
    pub fn applies_to(&self, url: &Url) -> bool {
        self.space.matches(url)
            && matches!(
                self.space.authentication_method,
                AuthenticationMethod::Default | AuthenticationMethod::HttpBasic
            )
    }
}

/// Credentials shared across dispatches, keyed by protection space.
///
/// Writes replace any credential already stored for the same space.
#[derive(Debug, Default)]
pub struct CredentialStorage {
    credentials: RwLock<HashMap<ProtectionSpace, Credential>>,
}

impl CredentialStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, credential: Credential, space: ProtectionSpace) {
        self.credentials.write().insert(space, credential);
    }

    pub fn get(&self, space: &ProtectionSpace) -> Option<Credential> {
        self.credentials.read().get(space).cloned()
    }

    pub fn remove(&self, space: &ProtectionSpace) -> Option<Credential> {
        self.credentials.write().remove(space)
    }

    /// The credential stored for exactly `space`, bound to it.
    pub fn scoped(&self, space: &ProtectionSpace) -> Option<ScopedCredential> {
        self.get(space).map(|credential| ScopedCredential {
            credential,
            space: space.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.credentials.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.read().is_empty()
    }
}
