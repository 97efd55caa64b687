//! Cursor-driven pagination over remote listings.
//!
//! Pages are requested strictly in cursor order, one at a time, each through
//! the retrying invoker. Cancellation is observed before every page request.

use std::future::Future;
use std::marker::PhantomData;

use slackvault_traits::{Cursor, Page};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, Result};
use crate::retry::with_retry;

/// Pulls pages from `fetch`, starting from an empty cursor, until the server
/// reports exhaustion.
pub struct Paginator<'a, T, F> {
    cancel: &'a CancellationToken,
    operation: &'static str,
    fetch: F,
    cursor: Cursor,
    done: bool,
    pages: usize,
    _item: PhantomData<fn() -> T>,
}

impl<'a, T, F, Fut> Paginator<'a, T, F>
where
    F: FnMut(Cursor) -> Fut,
    Fut: Future<Output = slackvault_traits::Result<Page<T>>>,
{
    pub fn new(cancel: &'a CancellationToken, operation: &'static str, fetch: F) -> Self {
        Self {
            cancel,
            operation,
            fetch,
            cursor: Cursor::new(),
            done: false,
            pages: 0,
            _item: PhantomData,
        }
    }

    /// Fetch the next page's items, or `None` once the listing is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>> {
        if self.done {
            return Ok(None);
        }
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let cursor = self.cursor.clone();
        let fetch = &mut self.fetch;
        let page = with_retry(self.cancel, self.operation, || fetch(cursor.clone())).await?;
        self.pages += 1;

        if page.is_last() {
            self.done = true;
        } else {
            self.cursor = page.next_cursor;
        }

        debug!(
            operation = self.operation,
            page = self.pages,
            items = page.items.len(),
            exhausted = self.done,
            "Fetched page"
        );
        Ok(Some(page.items))
    }

    /// True once the server has signalled the final page.
    pub fn is_exhausted(&self) -> bool {
        self.done
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages
    }

    /// Drain every remaining page into one vector.
    pub async fn collect_all(mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use slackvault_traits::api::method;
    use slackvault_traits::testing::{ScriptedSlack, message};
    use slackvault_traits::{HistoryParams, Message, SlackApi, SlackError};

    use super::*;

    fn history_of(n: usize) -> ScriptedSlack {
        let messages = (0..n)
            .map(|i| message(&format!("{}", 100 + i), "U1", "hi"))
            .collect();
        ScriptedSlack::new().with_history("C0000000001", messages)
    }

    type HistoryFuture<'a> =
        Pin<Box<dyn Future<Output = slackvault_traits::Result<Page<Message>>> + Send + 'a>>;

    fn history_pages<'a>(
        slack: &'a ScriptedSlack,
        cancel: &'a CancellationToken,
    ) -> Paginator<'a, Message, impl FnMut(Cursor) -> HistoryFuture<'a>> {
        Paginator::new(cancel, "failed to get history", move |cursor: Cursor| {
            let params = HistoryParams {
                channel: "C0000000001".to_string(),
                limit: 2,
                cursor,
                ..Default::default()
            };
            let fetch: HistoryFuture<'a> = Box::pin(async move { slack.history(&params).await });
            fetch
        })
    }

    #[tokio::test]
    async fn collects_every_page_in_order() {
        let slack = history_of(5);
        let cancel = CancellationToken::new();

        let items = history_pages(&slack, &cancel).collect_all().await.unwrap();

        let ts: Vec<_> = items.iter().map(|m| m.ts.as_str()).collect();
        assert_eq!(ts, vec!["104", "103", "102", "101", "100"]);
        assert_eq!(slack.calls(method::HISTORY), 3);
    }

    #[tokio::test]
    async fn has_more_false_stops_even_with_cursor() {
        let slack = history_of(3).with_trailing_cursor();
        let cancel = CancellationToken::new();

        let items = history_pages(&slack, &cancel).collect_all().await.unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(slack.calls(method::HISTORY), 2);
    }

    #[tokio::test]
    async fn empty_cursor_stops_even_with_has_more() {
        let cancel = CancellationToken::new();
        let calls = AtomicUsize::new(0);
        let mut pages = Paginator::new(&cancel, "failed to list", |_cursor| {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Ok::<_, SlackError>(Page {
                    items: vec![1, 2],
                    has_more: true,
                    next_cursor: String::new(),
                })
            }
        });

        assert_eq!(pages.next_page().await.unwrap(), Some(vec![1, 2]));
        assert!(pages.is_exhausted());
        assert_eq!(pages.next_page().await.unwrap(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancellation_is_observed_before_next_request() {
        let slack = history_of(6);
        let cancel = CancellationToken::new();
        let mut pages = history_pages(&slack, &cancel);

        assert!(pages.next_page().await.unwrap().is_some());
        cancel.cancel();

        let err = pages.next_page().await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(slack.calls(method::HISTORY), 1);
        assert_eq!(pages.pages_fetched(), 1);
    }

    #[tokio::test]
    async fn cursors_advance_between_pages() {
        let cancel = CancellationToken::new();
        let seen = parking_lot::Mutex::new(Vec::new());
        let pages = Paginator::new(&cancel, "failed to list", |cursor: Cursor| {
            seen.lock().push(cursor.clone());
            async move {
                let next = match cursor.as_str() {
                    "" => "b",
                    "b" => "c",
                    _ => "",
                };
                Ok::<_, SlackError>(Page {
                    items: vec![cursor],
                    has_more: !next.is_empty(),
                    next_cursor: next.to_string(),
                })
            }
        });

        let items = pages.collect_all().await.unwrap();
        assert_eq!(items, vec!["", "b", "c"]);
        assert_eq!(*seen.lock(), vec!["", "b", "c"]);
    }
}
