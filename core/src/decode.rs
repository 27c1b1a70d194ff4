//! Typed decoding of response bodies.
//!
//! # Design
//! Decoding is layered on top of `Perform`: dispatch first, then turn the body
//! into `T`. A dispatch that succeeds on the wire but carries no body fails
//! with `DecodeError::NoData`, which keeps "nothing to decode" apart from
//! status and transport failures. Bodies are JSON, decoded with serde_json.

use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;

use crate::error::{DecodeError, Result};
use crate::http::Response;
use crate::request::Perform;

/// Decode a response body into `T`.
pub fn decode_body<T: DeserializeOwned>(response: &Response) -> std::result::Result<T, DecodeError> {
    match response.body.as_deref() {
        None | Some([]) => Err(DecodeError::NoData),
        Some(bytes) => serde_json::from_slice(bytes).map_err(DecodeError::Malformed),
    }
}

/// Dispatch-and-decode for every `Perform` implementation.
#[async_trait]
pub trait DecodeExt: Perform {
    /// Dispatch, then decode the body into `T`. The response is returned
    /// alongside the value for callers that need status or headers.
    async fn perform_decoding<T>(&self) -> Result<(T, Response)>
    where
        T: DeserializeOwned + Send,
    {
        let response = self.perform().await?;
        let value = decode_body(&response)?;
        Ok((value, response))
    }

    /// Callback form of `perform_decoding`, spawned on the ambient tokio
    /// runtime.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    fn perform_decoding_then<T, F>(&self, on_result: F) -> JoinHandle<()>
    where
        Self: Clone + Sized + 'static,
        T: DeserializeOwned + Send + 'static,
        F: FnOnce(Result<(T, Response)>) + Send + 'static,
    {
        let this = self.clone();
        tokio::spawn(async move { on_result(this.perform_decoding::<T>().await) })
    }
}

impl<P: Perform + ?Sized> DecodeExt for P {}

/// A dispatchable unit bound to the type its body decodes into.
pub struct TypedRequest<T, P> {
    inner: P,
    _target: PhantomData<fn() -> T>,
}

impl<T, P: Clone> Clone for TypedRequest<T, P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _target: PhantomData,
        }
    }
}

impl<T, P: fmt::Debug> fmt::Debug for TypedRequest<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedRequest")
            .field("inner", &self.inner)
            .field("target", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T, P> TypedRequest<T, P>
where
    T: DeserializeOwned + Send + 'static,
    P: Perform,
{
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            _target: PhantomData,
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn into_inner(self) -> P {
        self.inner
    }

    /// Dispatch and decode, discarding the response metadata.
    pub async fn perform(&self) -> Result<T> {
        self.inner
            .perform_decoding::<T>()
            .await
            .map(|(value, _)| value)
    }

    /// Dispatch and decode, keeping the response metadata.
    pub async fn perform_with_response(&self) -> Result<(T, Response)> {
        self.inner.perform_decoding::<T>().await
    }

    /// Callback form of `perform`.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    pub fn perform_then<F>(&self, on_result: F) -> JoinHandle<()>
    where
        P: Clone + 'static,
        F: FnOnce(Result<T>) + Send + 'static,
    {
        self.inner
            .perform_decoding_then::<T, _>(move |result| on_result(result.map(|(value, _)| value)))
    }
}
