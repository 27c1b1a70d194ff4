//! Request configuration and the holder that supplies it to new requests.
//!
//! # Design
//! A `Configuration` carries everything a request needs from its environment:
//! scheme, host, port, authentication realm and method, default headers and
//! the default transport. Requests capture an `Arc<Configuration>` when they
//! are built, so replacing the configuration later never reaches a request
//! that already exists.
//!
//! `ConfigurationHolder` is an explicit context handle rather than a global.
//! The composition root creates one (or several) and passes it to the code
//! that builds requests. Clones share the same slot.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use url::Url;

use crate::http::Method;
use crate::request::RequestBuilder;
use crate::transport::{Transport, UreqTransport};

pub const DEFAULT_PROTOCOL: &str = "https";
pub const DEFAULT_BASE_URL: &str = "test.url.com";
pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_REALM: &str = "Restricted";

/// Keys read by `Configuration::from_source`.
pub mod keys {
    pub const REQUEST_PROTOCOL: &str = "REQUEST_PROTOCOL";
    pub const BASE_URL: &str = "BASE_URL";
    pub const PORT: &str = "PORT";
    pub const AUTHENTICATION_REALM: &str = "AUTHENTICATION_REALM";
}

/// Authentication scheme a protection space expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AuthenticationMethod {
    #[default]
    Default,
    HttpBasic,
    HttpDigest,
    HtmlForm,
    ClientCertificate,
    ServerTrust,
}

/// The (host, port, scheme, realm, method) tuple a credential is valid for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProtectionSpace {
    pub host: String,
    pub port: u16,
    pub protocol: String,
    pub realm: String,
    pub authentication_method: AuthenticationMethod,
}

impl ProtectionSpace {
    /// Whether `url` is served from this space's origin.
    pub fn matches(&self, url: &Url) -> bool {
        url.scheme().eq_ignore_ascii_case(&self.protocol)
            && url
                .host_str()
                .is_some_and(|host| host.eq_ignore_ascii_case(&self.host))
            && url.port_or_known_default() == Some(self.port)
    }
}

/// Read-only key lookup for process-level settings.
pub trait ConfigurationSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads settings from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl ConfigurationSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl ConfigurationSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Settings shared by every request built from it.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub request_protocol: String,
    /// Host only; no scheme, port or path.
    pub base_url: String,
    pub port: u16,
    pub authentication_realm: String,
    pub authentication_method: AuthenticationMethod,
    /// Applied to every request before its own headers.
    pub default_headers: Vec<(String, String)>,
    pub default_transport: Arc<dyn Transport>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            request_protocol: DEFAULT_PROTOCOL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            port: DEFAULT_PORT,
            authentication_realm: DEFAULT_REALM.to_string(),
            authentication_method: AuthenticationMethod::Default,
            default_headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            default_transport: Arc::new(UreqTransport::default()),
        }
    }
}

impl Configuration {
    /// Build a configuration from `source`, falling back to the defaults for
    /// keys that are missing or do not parse.
    pub fn from_source(source: &dyn ConfigurationSource) -> Self {
        let mut configuration = Self::default();
        if let Some(protocol) = source.get(keys::REQUEST_PROTOCOL) {
            configuration.request_protocol = protocol;
        }
        if let Some(base_url) = source.get(keys::BASE_URL) {
            configuration.base_url = base_url;
        }
        match source.get(keys::PORT).map(|raw| raw.parse::<u16>()) {
            Some(Ok(port)) => configuration.port = port,
            Some(Err(err)) => {
                tracing::warn!(error = %err, "Ignoring unparsable {} setting", keys::PORT)
            }
            None => {}
        }
        if let Some(realm) = source.get(keys::AUTHENTICATION_REALM) {
            configuration.authentication_realm = realm;
        }
        configuration
    }

    /// Shorthand for `from_source(&EnvSource)`.
    pub fn from_env() -> Self {
        Self::from_source(&EnvSource)
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.default_transport = transport;
        self
    }

    /// The authentication scope derived from this configuration.
    pub fn protection_space(&self) -> ProtectionSpace {
        ProtectionSpace {
            host: self.base_url.clone(),
            port: self.port,
            protocol: self.request_protocol.clone(),
            realm: self.authentication_realm.clone(),
            authentication_method: self.authentication_method,
        }
    }

    /// Make this the active configuration of `holder`.
    pub fn assign(self, holder: &ConfigurationHolder) {
        holder.replace(Arc::new(self));
    }
}

/// Slot holding the configuration new requests default to.
#[derive(Debug, Clone)]
pub struct ConfigurationHolder {
    slot: Arc<RwLock<Arc<Configuration>>>,
}

impl Default for ConfigurationHolder {
    fn default() -> Self {
        Self::new(Configuration::default())
    }
}

impl ConfigurationHolder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Arc::new(configuration))),
        }
    }

    /// Snapshot of the active configuration.
    pub fn configuration(&self) -> Arc<Configuration> {
        self.slot.read().clone()
    }

    /// Swap the active configuration. Existing requests keep their snapshot.
    pub fn replace(&self, configuration: Arc<Configuration>) -> Arc<Configuration> {
        std::mem::replace(&mut *self.slot.write(), configuration)
    }

    /// Start building a request against the active configuration.
    pub fn request(&self, method: Method, resource_path: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(method, resource_path, self.configuration())
    }
}
