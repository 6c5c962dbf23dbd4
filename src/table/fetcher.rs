//! Resource Fetcher
//!
//! Paginated listing and single-item detail lookups shared by every table.

use super::filter::Quals;
use crate::oci::http::is_not_found;
use crate::oci::identity::Scope;
use anyhow::Result;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::VecDeque;
use std::future::Future;

pub use crate::oci::PaginatedResult;

/// Largest page any list call asks for
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Page size for a listing with an optional row budget
pub fn page_size(limit: Option<u64>) -> u32 {
    match limit {
        Some(limit) if limit < u64::from(MAX_PAGE_SIZE) => limit as u32,
        _ => MAX_PAGE_SIZE,
    }
}

/// False when a `compartment_id` qual names another compartment than the scope's
pub fn compartment_matches(quals: &Quals, scope: &Scope) -> bool {
    match quals.get("compartment_id") {
        Some(compartment) => compartment == scope.compartment,
        None => true,
    }
}

struct PageState<T, F> {
    fetch_page: F,
    buffer: VecDeque<T>,
    next_token: Option<String>,
    fetched: bool,
    remaining: Option<u64>,
}

async fn next_item<T, F, Fut>(mut state: PageState<T, F>) -> Result<Option<(T, PageState<T, F>)>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<PaginatedResult<T>>>,
{
    loop {
        if state.remaining == Some(0) {
            return Ok(None);
        }
        if let Some(item) = state.buffer.pop_front() {
            if let Some(remaining) = state.remaining.as_mut() {
                *remaining -= 1;
            }
            return Ok(Some((item, state)));
        }
        // Last page already consumed
        if state.fetched && state.next_token.is_none() {
            return Ok(None);
        }

        let page = (state.fetch_page)(state.next_token.take()).await?;
        state.fetched = true;
        state.buffer.extend(page.items);
        state.next_token = page.next_token;
    }
}

/// Lazily stream items across pages.
///
/// `fetch_page` receives the cursor of the page to fetch (`None` for the
/// first one). Pages are requested only while the consumer keeps polling and
/// the `limit` budget is not spent; a page without a cursor is the last one.
pub fn paginate<'a, T, F, Fut>(limit: Option<u64>, fetch_page: F) -> BoxStream<'a, Result<T>>
where
    T: Send + 'a,
    F: FnMut(Option<String>) -> Fut + Send + 'a,
    Fut: Future<Output = Result<PaginatedResult<T>>> + Send + 'a,
{
    let state = PageState {
        fetch_page,
        buffer: VecDeque::new(),
        next_token: None,
        fetched: false,
        remaining: limit,
    };
    stream::try_unfold(state, next_item).boxed()
}

/// Where the id of a detail lookup came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailKey<'a> {
    /// Id of an item produced by a list call in the same scope
    Item(&'a str),
    /// Id from a point lookup qual
    Lookup(&'a str),
}

impl<'a> DetailKey<'a> {
    /// Id to fetch in `scope`, if any.
    ///
    /// Point lookups only run in the root compartment of each region so the
    /// same id is not fetched once per compartment.
    pub fn resolve(self, scope: &Scope) -> Option<&'a str> {
        let id = match self {
            DetailKey::Item(id) => id,
            DetailKey::Lookup(id) => {
                if !scope.is_root() {
                    return None;
                }
                id
            }
        };
        (!id.is_empty()).then_some(id)
    }
}

/// Fetch a single detail record; a 404 is `None`, other errors propagate
pub async fn fetch_detail<'a, T, F, Fut>(key: DetailKey<'a>, scope: &Scope, fetch: F) -> Result<Option<T>>
where
    F: FnOnce(&'a str) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let Some(id) = key.resolve(scope) else {
        return Ok(None);
    };

    match fetch(id).await {
        Ok(detail) => Ok(Some(detail)),
        Err(e) if is_not_found(&e) => {
            tracing::debug!("{} not found in {}", id, scope.region);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
