//! Decorators wrap a dispatchable unit to add behavior around `perform`.

use async_trait::async_trait;

use crate::error::Result;
use crate::http::Response;
use crate::request::Perform;

/// A `Perform` implementation that owns and delegates to another one.
///
/// Implementors decide what happens around the inner dispatch; the default
/// expectation is that `perform` ends up calling `inner().perform()`.
pub trait RequestDecorator: Perform {
    type Inner: Perform;

    fn inner(&self) -> &Self::Inner;

    fn into_inner(self) -> Self::Inner
    where
        Self: Sized;
}

/// Logs each dispatch and its outcome through `tracing`.
#[derive(Debug, Clone)]
pub struct LoggingDecorator<P> {
    inner: P,
    label: String,
    log_headers: bool,
}

impl<P: Perform> LoggingDecorator<P> {
    pub fn new(inner: P, label: impl Into<String>) -> Self {
        Self {
            inner,
            label: label.into(),
            log_headers: false,
        }
    }

    /// Also log response headers at trace level.
    pub fn with_headers(mut self) -> Self {
        self.log_headers = true;
        self
    }
}

#[async_trait]
impl<P: Perform> Perform for LoggingDecorator<P> {
    async fn perform(&self) -> Result<Response> {
        tracing::debug!(label = %self.label, "Performing request");
        let result = self.inner.perform().await;
        match &result {
            Ok(response) => {
                tracing::debug!(
                    label = %self.label,
                    status = response.status,
                    url = %response.url,
                    "Request completed"
                );
                if self.log_headers {
                    for (name, value) in &response.headers {
                        tracing::trace!(header = %name, value = %value, "Response header");
                    }
                }
            }
            Err(error) => {
                tracing::debug!(label = %self.label, error = %error, "Request failed");
            }
        }
        result
    }
}

impl<P: Perform> RequestDecorator for LoggingDecorator<P> {
    type Inner = P;

    fn inner(&self) -> &P {
        &self.inner
    }

    fn into_inner(self) -> P {
        self.inner
    }
}
