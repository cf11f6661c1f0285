//! Paged listing.
//!
//! The first request goes to the list URL; each page may carry a `nextLink`.
//! A failed page request leaves the link untouched, so the next call to
//! [`Pager::next_page`] asks for the same page again, unless the failure is
//! an [`Error::FinalPage`], which ends the sequence. Every request of one
//! pager carries the same correlation id.

use std::marker::PhantomData;
use std::sync::Arc;

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::client::{Pipeline, CORRELATION_ID_HEADER};
use crate::error::Error;
use crate::transport::Request;
use crate::types::Page;

pub struct Pager<T> {
    pipeline: Arc<Pipeline>,
    next_link: Option<Url>,
    correlation_id: String,
    init_error: Option<Error>,
    pages: u32,
    _page: PhantomData<T>,
}

impl<T> Pager<T>
where
    T: DeserializeOwned + Page,
{
    pub(crate) fn new(pipeline: Arc<Pipeline>, first_url: Result<Url, Error>) -> Self {
        let (next_link, init_error) = match first_url {
            Ok(url) => (Some(url), None),
            Err(err) => (None, Some(err)),
        };

        Self {
            pipeline,
            next_link,
            correlation_id: Uuid::new_v4().to_string(),
            init_error,
            pages: 0,
            _page: PhantomData,
        }
    }

    /// Whether another call to [`Pager::next_page`] can produce a page.
    #[must_use]
    pub fn more(&self) -> bool {
        self.init_error.is_some() || self.next_link.is_some()
    }

    /// Number of pages delivered so far.
    #[must_use]
    pub fn pages(&self) -> u32 {
        self.pages
    }

    /// Correlation id sent with every page request of this pager.
    #[must_use]
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Fetch the next page.
    ///
    /// # Errors
    ///
    /// Returns the service or transport error for this page request; the
    /// pager stays positioned on the same page unless the transport marked
    /// the error as final. Returns `Error::NoMorePages` once the last page
    /// has been delivered.
    pub async fn next_page(&mut self) -> Result<T, Error> {
        if let Some(err) = self.init_error.take() {
            return Err(err);
        }

        let url = self.next_link.clone().ok_or(Error::NoMorePages)?;
        debug!(url = %url, correlation_id = %self.correlation_id, "fetching page");

        let mut request = Request::new(Method::GET, url);
        let correlation = HeaderValue::from_str(&self.correlation_id)
            .map_err(|e| Error::Http(format!("Invalid correlation id: {e}")))?;
        request
            .headers
            .insert(HeaderName::from_static(CORRELATION_ID_HEADER), correlation);

        let response = match self.pipeline.send(request).await {
            Ok(response) => response,
            Err(Error::FinalPage(err)) => {
                debug!(correlation_id = %self.correlation_id, "paged sequence ended on an error");
                self.next_link = None;
                return Err(*err);
            }
            Err(err) => return Err(err),
        };
        let page: T = response.json()?;

        self.next_link = page.next_link().map(Url::parse).transpose()?;
        self.pages += 1;

        Ok(page)
    }
}
