use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{AnimeApi, SearchParams};
use crate::config::Locale;
use crate::debounce::Debouncer;
use crate::error::{RequestError, UserAction};
use crate::models::Page;
use crate::timeline::{build_timeline, BucketExpansion, RatingFilter, TimelineBucket};
use crate::view::ViewMode;

/// Ticket handed out when a request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Monotonic request numbering. A response is only applied when no newer
/// response has been applied before it.
#[derive(Debug, Default)]
pub struct RequestSequence {
    issued: AtomicU64,
    applied: AtomicU64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Records `ticket` as applied unless a newer ticket already was.
    pub fn try_apply(&self, ticket: Ticket) -> bool {
        let previous = self.applied.fetch_max(ticket.0, Ordering::SeqCst);
        previous < ticket.0
    }
}

/// State of one search/timeline view.
#[derive(Debug, Clone, Default)]
pub struct SearchView {
    pub params: SearchParams,
    pub rating: RatingFilter,
    pub mode: ViewMode,
    pub expansion: BucketExpansion,
    page: Option<Page>,
    error: Option<String>,
    locale: Locale,
}

impl SearchView {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            ..Self::default()
        }
    }

    pub fn page(&self) -> Option<&Page> {
        self.page.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Replaces the current result set with the outcome of a request. A failed
    /// request leaves no stale results behind.
    pub fn apply(&mut self, result: Result<Page, RequestError>) {
        match result {
            Ok(page) => {
                debug!(
                    "Applying page {} of {} ({} titles)",
                    page.current_page,
                    page.total_pages,
                    page.content.len()
                );
                self.page = Some(page);
                self.error = None;
            }
            Err(e) => {
                warn!("Search failed: {}", e);
                self.page = None;
                self.error = Some(e.user_message(UserAction::Search, self.locale));
            }
        }
    }

    /// Buckets for the current page under the active rating filter.
    pub fn buckets(&self) -> Vec<TimelineBucket> {
        match &self.page {
            Some(page) => build_timeline(&page.content, self.rating),
            None => Vec::new(),
        }
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    pub fn set_rating(&mut self, rating: RatingFilter) {
        self.rating = rating;
    }

    pub fn toggle_bucket(&mut self, year_month: &str) -> bool {
        self.expansion.toggle(year_month)
    }
}

/// Drives a shared `SearchView` from user input: keystrokes are debounced,
/// submissions go out immediately, and late responses are dropped.
pub struct SearchController {
    api: Arc<dyn AnimeApi>,
    view: Arc<Mutex<SearchView>>,
    sequence: Arc<RequestSequence>,
    debouncer: Debouncer,
}

impl SearchController {
    pub fn new(api: Arc<dyn AnimeApi>, locale: Locale, debounce: Duration) -> Self {
        Self {
            api,
            view: Arc::new(Mutex::new(SearchView::new(locale))),
            sequence: Arc::new(RequestSequence::new()),
            debouncer: Debouncer::new(debounce),
        }
    }

    pub fn view(&self) -> MutexGuard<'_, SearchView> {
        lock(&self.view)
    }

    /// Keystroke in the keyword box. Resets to the first page and searches once
    /// input has been quiet for the debounce delay.
    pub fn on_keyword_input(&self, keyword: &str) -> JoinHandle<bool> {
        let params = {
            let mut view = self.view();
            view.params.keyword = Some(keyword.to_string());
            view.params.page = None;
            view.params.clone()
        };
        let api = Arc::clone(&self.api);
        let view = Arc::clone(&self.view);
        let sequence = Arc::clone(&self.sequence);
        self.debouncer.call(async move {
            run_search(api, view, sequence, params).await;
        })
    }

    /// Explicit submission (search button, date range, paging). Drops any
    /// pending keystroke timer.
    pub async fn submit(&self, params: SearchParams) -> bool {
        self.debouncer.cancel();
        self.view().params = params.clone();
        run_search(
            Arc::clone(&self.api),
            Arc::clone(&self.view),
            Arc::clone(&self.sequence),
            params,
        )
        .await
    }
}

async fn run_search(
    api: Arc<dyn AnimeApi>,
    view: Arc<Mutex<SearchView>>,
    sequence: Arc<RequestSequence>,
    params: SearchParams,
) -> bool {
    let ticket = sequence.issue();
    info!("Searching (ticket {:?}): {}", ticket, params.query_string());
    let result = api.search(&params).await;
    let mut guard = lock(&view);
    if !sequence.try_apply(ticket) {
        debug!("Discarding stale search response {:?}", ticket);
        return false;
    }
    guard.apply(result);
    true
}

fn lock(view: &Mutex<SearchView>) -> MutexGuard<'_, SearchView> {
    view.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
