//! Paged listing sequence builder.

use std::collections::VecDeque;

use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::fake::responder::fake_response_error;

/// A delivered page and the continuation token it was registered with.
#[derive(Debug, Clone, PartialEq)]
pub struct FakePage<T> {
    pub payload: T,
    pub continuation_token: Option<String>,
}

enum PageEntry<T> {
    Page(FakePage<T>),
    Error(Error),
}

/// Ordered page and error entries, replayed one per request.
///
/// Every entry, page or error, consumes exactly one step; an error step
/// delivers no page and iteration continues past it.
pub struct PagerResponder<T> {
    entries: VecDeque<PageEntry<T>>,
    pages_delivered: usize,
}

impl<T> Default for PagerResponder<T> {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
            pages_delivered: 0,
        }
    }
}

impl<T> PagerResponder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page. `continuation_token` is echoed as `$skipToken` in the
    /// link that leads past this page.
    pub fn add_page(&mut self, payload: T, continuation_token: Option<&str>) {
        self.entries.push_back(PageEntry::Page(FakePage {
            payload,
            continuation_token: continuation_token.map(String::from),
        }));
    }

    /// Append a transport-level failure.
    pub fn add_error(&mut self, err: impl Into<Error>) {
        self.entries.push_back(PageEntry::Error(err.into()));
    }

    /// Append a service failure carrying `status` and `error_code`.
    pub fn add_response_error(&mut self, status: u16, error_code: &str) {
        self.add_error(fake_response_error(status, error_code));
    }

    /// Whether entries remain.
    #[must_use]
    pub fn more(&self) -> bool {
        !self.entries.is_empty()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn pages_delivered(&self) -> usize {
        self.pages_delivered
    }

    /// Take the entry at the cursor, or `None` once the sequence is exhausted.
    pub fn next_page(&mut self) -> Option<Result<FakePage<T>, Error>> {
        match self.entries.pop_front()? {
            PageEntry::Page(page) => {
                self.pages_delivered += 1;
                Some(Ok(page))
            }
            PageEntry::Error(err) => Some(Err(err)),
        }
    }
}

impl<T: Serialize> PagerResponder<T> {
    pub(crate) fn into_json(self) -> Result<PagerResponder<Value>, Error> {
        let entries = self
            .entries
            .into_iter()
            .map(|entry| -> Result<PageEntry<Value>, Error> {
                match entry {
                    PageEntry::Page(page) => Ok(PageEntry::Page(FakePage {
                        payload: serde_json::to_value(page.payload)?,
                        continuation_token: page.continuation_token,
                    })),
                    PageEntry::Error(err) => Ok(PageEntry::Error(err)),
                }
            })
            .collect::<Result<VecDeque<_>, Error>>()?;

        Ok(PagerResponder {
            entries,
            pages_delivered: self.pages_delivered,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_entry_consumes_a_step() {
        let mut responder = PagerResponder::new();
        responder.add_page(vec![1, 2], None);
        responder.add_error(Error::transport("oops"));
        responder.add_page(vec![3, 4, 5], Some("tok"));

        let mut items = 0;
        let mut errors = 0;
        let mut steps = 0;
        while responder.more() {
            steps += 1;
            match responder.next_page().expect("entry at cursor") {
                Ok(page) => items += page.payload.len(),
                Err(_) => errors += 1,
            }
        }

        assert_eq!(items, 5);
        assert_eq!(errors, 1);
        assert_eq!(steps, 3);
        assert_eq!(responder.pages_delivered(), 2);
        assert!(responder.next_page().is_none());
    }

    #[test]
    fn test_continuation_token_is_kept() {
        let mut responder = PagerResponder::new();
        responder.add_page("p1", Some("skip-1"));

        let page = responder.next_page().expect("entry").expect("page");
        assert_eq!(page.continuation_token.as_deref(), Some("skip-1"));
    }

    #[test]
    fn test_response_error_entry() {
        let mut responder: PagerResponder<()> = PagerResponder::new();
        responder.add_response_error(503, "ServiceUnavailable");

        let err = responder.next_page().expect("entry").expect_err("error entry");
        assert_eq!(err.as_response_error().map(|e| e.status_code), Some(503));
        assert_eq!(responder.pages_delivered(), 0);
        assert!(!responder.more());
    }
}
