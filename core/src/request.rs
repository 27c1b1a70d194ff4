//! RESTful request construction and dispatch.
//!
//! # Design
//! A `Request` is immutable once built. Building it resolves the URL from the
//! captured configuration (scheme, host, port), the resource path and the
//! query parameters, merges the configuration's default headers with the
//! request's own, and stores the resulting `HttpRequest`. Nothing touches the
//! network until `perform`.
//!
//! `Perform::perform` is the single dispatch primitive. The callback style in
//! `PerformExt` only spawns it and hands the outcome to the caller, so status
//! classification lives in exactly one place.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::task::JoinHandle;
use url::Url;
use uuid::Uuid;

use crate::config::Configuration;
use crate::credential::{Credential, Persistence, ScopedCredential};
use crate::error::{ConstructionError, NetworkError, Result};
use crate::http::{merge_headers, HttpRequest, Method, Response};
use crate::transport::Transport;

/// Anything that can be dispatched: `Request` itself and its decorators.
#[async_trait]
pub trait Perform: Send + Sync {
    /// Dispatch once and wait for the outcome.
    async fn perform(&self) -> Result<Response>;
}

#[async_trait]
impl<P: Perform + ?Sized> Perform for Arc<P> {
    async fn perform(&self) -> Result<Response> {
        (**self).perform().await
    }
}

#[async_trait]
impl<P: Perform + ?Sized> Perform for Box<P> {
    async fn perform(&self) -> Result<Response> {
        (**self).perform().await
    }
}

/// Callback-style dispatch, layered over `Perform::perform`.
pub trait PerformExt: Perform + Clone + 'static {
    /// Dispatch on the ambient tokio runtime and call `on_result` exactly
    /// once with the outcome.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    fn perform_then<F>(&self, on_result: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<Response>) + Send + 'static,
    {
        let this = self.clone();
        tokio::spawn(async move { on_result(this.perform().await) })
    }
}

impl<P: Perform + Clone + 'static> PerformExt for P {}

/// A single RESTful request.
///
/// Cheap to clone; clones share the body, configuration and transport.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    resource_path: String,
    parameters: BTreeMap<String, String>,
    body: Option<Bytes>,
    headers: Vec<(String, String)>,
    credential: Option<Credential>,
    transport: Arc<dyn Transport>,
    configuration: Arc<Configuration>,
    prepared: HttpRequest,
}

impl Request {
    /// Start building a request against an explicit configuration.
    pub fn builder(
        method: Method,
        resource_path: impl Into<String>,
        configuration: Arc<Configuration>,
    ) -> RequestBuilder {
        RequestBuilder::new(method, resource_path, configuration)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Headers passed to the builder, before merging with defaults.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    pub fn url(&self) -> &Url {
        &self.prepared.url
    }

    /// The assembled wire request: resolved URL, merged headers, body.
    pub fn http_request(&self) -> &HttpRequest {
        &self.prepared
    }

    fn scoped_credential(&self) -> Option<ScopedCredential> {
        self.credential.as_ref().map(|credential| ScopedCredential {
            credential: credential.clone(),
            space: self.configuration.protection_space(),
        })
    }
}

#[async_trait]
impl Perform for Request {
    async fn perform(&self) -> Result<Response> {
        let mut request = self.prepared.clone();
        request.dispatch_id = Uuid::new_v4();
        request.credential = self.scoped_credential();

        if let Some(scoped) = &request.credential {
            if scoped.credential.persistence != Persistence::None {
                if let Some(storage) = self.transport.credential_storage() {
                    storage.set(scoped.credential.clone(), scoped.space.clone());
                }
            }
        }

        let dispatch_id = request.dispatch_id;
        tracing::debug!(
            %dispatch_id,
            method = %request.method,
            url = %request.url,
            "Dispatching request"
        );

        let response = self.transport.submit(request).await.map_err(|err| {
            tracing::debug!(%dispatch_id, error = %err, "Transport failed");
            err
        })?;

        if !response.is_success() {
            let error = NetworkError::identifying(response.status);
            tracing::warn!(
                %dispatch_id,
                status = response.status,
                error = %error,
                "Request failed with HTTP status"
            );
            return Err(error.into());
        }

        tracing::debug!(%dispatch_id, status = response.status, "Request succeeded");
        Ok(response)
    }
}

/// Builder for `Request`. Validation happens in `build`.
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    resource_path: String,
    parameters: BTreeMap<String, String>,
    body: Option<Bytes>,
    headers: Vec<(String, String)>,
    credential: Option<Credential>,
    transport: Option<Arc<dyn Transport>>,
    configuration: Arc<Configuration>,
}

impl RequestBuilder {
    pub fn new(
        method: Method,
        resource_path: impl Into<String>,
        configuration: Arc<Configuration>,
    ) -> Self {
        Self {
            method,
            resource_path: resource_path.into(),
            parameters: BTreeMap::new(),
            body: None,
            headers: Vec::new(),
            credential: None,
            transport: None,
            configuration,
        }
    }

    /// Add a query parameter. A repeated key replaces the earlier value.
    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn parameters<I, K, V>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.parameters
            .extend(parameters.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Pre-encoded body, sent verbatim.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Add a header. Overrides a default header with the same name.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Use `transport` instead of the configuration's default transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use `configuration` instead of the one captured when the builder was
    /// created.
    pub fn configuration(mut self, configuration: Arc<Configuration>) -> Self {
        self.configuration = configuration;
        self
    }

    pub fn build(self) -> std::result::Result<Request, ConstructionError> {
        let url = resolve_url(&self.configuration, &self.resource_path, &self.parameters)?;
        let headers = merge_headers(&self.configuration.default_headers, &self.headers);
        let transport = self
            .transport
            .unwrap_or_else(|| self.configuration.default_transport.clone());

        let prepared = HttpRequest {
            method: self.method,
            url,
            headers,
            body: self.body.clone(),
            credential: None,
            protection_space: self.configuration.protection_space(),
            dispatch_id: Uuid::nil(),
        };

        Ok(Request {
            method: self.method,
            resource_path: self.resource_path,
            parameters: self.parameters,
            body: self.body,
            headers: self.headers,
            credential: self.credential,
            transport,
            configuration: self.configuration,
            prepared,
        })
    }
}

fn resolve_url(
    configuration: &Configuration,
    resource_path: &str,
    parameters: &BTreeMap<String, String>,
) -> std::result::Result<Url, ConstructionError> {
    if !resource_path.starts_with('/') || resource_path.contains(['?', '#']) {
        return Err(ConstructionError::InvalidResourcePath(
            resource_path.to_string(),
        ));
    }

    let origin = format!(
        "{}://{}:{}",
        configuration.request_protocol, configuration.base_url, configuration.port
    );
    let mut url = Url::parse(&origin)?;
    if url.cannot_be_a_base() || url.host().is_none() || url.path() != "/" {
        return Err(url::ParseError::InvalidDomainCharacter.into());
    }
    url.set_path(resource_path);

    if !parameters.is_empty() {
        url.query_pairs_mut().extend_pairs(parameters);
    }
    Ok(url)
}
