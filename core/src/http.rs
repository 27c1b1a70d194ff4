//! HTTP transport types exchanged with a `Transport`.
//!
//! # Design
//! These types describe the wire-level request and response as plain data.
//! A `Request` assembles an `HttpRequest` once, at construction, and hands a
//! copy of it to the transport on every dispatch. The transport answers with a
//! `Response` that the request pipeline then classifies by status code.
//!
//! Bodies are `Bytes` so a prepared request can be cloned per dispatch
//! without copying the payload.

use std::fmt;

use bytes::Bytes;
use url::Url;
use uuid::Uuid;

use crate::config::ProtectionSpace;
use crate::credential::ScopedCredential;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl Method {
    /// The wire verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transport-level request described as plain data.
///
/// `dispatch_id` and `credential` are filled in per dispatch; everything else
/// is fixed when the owning `Request` is built. `protection_space` is the
/// scope of the configuration the request was built from, and is the only
/// key under which a transport may look up a stored credential for it.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
    pub credential: Option<ScopedCredential>,
    pub protection_space: ProtectionSpace,
    pub dispatch_id: Uuid,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A successful transport round trip: status, headers, final URL and body.
///
/// `body` is `None` when the transport received no payload at all.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub url: Url,
    pub body: Option<Bytes>,
}

impl Response {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Overlay `overrides` on top of `base`.
///
/// Keys compare case-insensitively. An override replaces the base entry in
/// place and keeps the override's spelling of the key.
pub(crate) fn merge_headers(
    base: &[(String, String)],
    overrides: &[(String, String)],
) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = Vec::with_capacity(base.len() + overrides.len());
    for (key, value) in base.iter().chain(overrides) {
        match merged.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
            Some(entry) => *entry = (key.clone(), value.clone()),
            None => merged.push((key.clone(), value.clone())),
        }
    }
    merged
}
