//! RESTful request construction, dispatch and decoding.
//!
//! # Overview
//! A `Request` is built from a method, a resource path, optional query
//! parameters, body, headers and credential, and a snapshot of a
//! `Configuration`. Dispatching it hands the assembled `HttpRequest` to a
//! `Transport`, classifies the HTTP status into a `NetworkError`, and can
//! decode the body into a typed value.
//!
//! # Design
//! - Construction is pure: URL resolution and header merging happen in
//!   `RequestBuilder::build`, with no I/O.
//! - `Transport` is the only I/O seam. `UreqTransport` is the default; tests
//!   plug in their own.
//! - `Perform` is the single async dispatch primitive. Callback-style
//!   dispatch (`PerformExt`) and decoding (`DecodeExt`, `TypedRequest`) are
//!   layered on top of it, as are decorators (`RequestDecorator`).
//! - `ConfigurationHolder` is an explicit handle created at the composition
//!   root; requests snapshot its configuration when they are built.

pub mod config;
pub mod credential;
pub mod decode;
pub mod decorator;
pub mod error;
pub mod http;
pub mod request;
pub mod transport;

pub use config::{
    AuthenticationMethod, Configuration, ConfigurationHolder, ConfigurationSource, EnvSource,
    ProtectionSpace,
};
pub use credential::{Credential, CredentialStorage, Persistence, ScopedCredential};
pub use decode::{decode_body, DecodeExt, TypedRequest};
pub use decorator::{LoggingDecorator, RequestDecorator};
pub use error::{ConstructionError, DecodeError, Error, NetworkError, Result, TransportError};
pub use http::{HttpRequest, Method, Response};
pub use request::{Perform, PerformExt, Request, RequestBuilder};
pub use transport::{Transport, UreqTransport};
