//! Program search against the GraphQL endpoint, with the debouncing the live
//! search box uses.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::{sync::watch, task::JoinHandle, time};
use utoipa::ToSchema;

use crate::{backend::BackendState, models::ProgramSummary};

/// Page size of every search.
pub const SEARCH_LIMIT: u32 = 20;

/// StatusFilter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
    Completed,
}

impl StatusFilter {
    fn keyword(self) -> Option<&'static str> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Active => Some("active"),
            StatusFilter::Inactive => Some("inactive"),
            StatusFilter::Completed => Some("completed"),
        }
    }
}

/// The GraphQL `filter` argument: the search text with the status keyword
/// appended.
pub fn compose_filter(text: &str, status: StatusFilter) -> String {
    let text = text.trim();
    match status.keyword() {
        None => text.to_string(),
        Some(keyword) if text.is_empty() => keyword.to_string(),
        Some(keyword) => format!("{text} {keyword}"),
    }
}

/// SearchQuery
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SearchQuery {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub status: StatusFilter,
}

impl SearchQuery {
    pub fn filter(&self) -> String {
        compose_filter(&self.text, self.status)
    }
}

/// SearchState
///
/// What subscribers see: the latest results, or the error of the latest
/// attempt, plus whether a search is in flight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct SearchState {
    pub loading: bool,
    pub items: Vec<ProgramSummary>,
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// DebouncedSearch
///
/// Owns a background task that turns a stream of query edits into searches.
/// Text edits are coalesced until the input has been quiet for `delay`; a
/// status change alone fires at once. A settled query equal to the last one
/// issued is skipped. The task stops when this handle is dropped.
pub struct DebouncedSearch {
    input: watch::Sender<SearchQuery>,
    results: watch::Receiver<SearchState>,
    task: JoinHandle<()>,
}

impl DebouncedSearch {
    /// Spawns the worker. The initial (empty) query is searched right away.
    pub fn spawn(backend: BackendState, delay: Duration) -> Self {
        let (input, input_rx) = watch::channel(SearchQuery::default());
        let (output, results) = watch::channel(SearchState {
            loading: true,
            ..SearchState::default()
        });
        let task = tokio::spawn(run(backend, delay, input_rx, output));
        Self {
            input,
            results,
            task,
        }
    }

    pub fn set_query(&self, query: SearchQuery) {
        self.input.send_replace(query);
    }

    pub fn results(&self) -> watch::Receiver<SearchState> {
        self.results.clone()
    }
}

impl Drop for DebouncedSearch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    backend: BackendState,
    delay: Duration,
    mut input: watch::Receiver<SearchQuery>,
    output: watch::Sender<SearchState>,
) {
    let mut last = input.borrow_and_update().clone();
    search(&backend, &last, &output).await;

    loop {
        if input.changed().await.is_err() {
            return;
        }
        let edited = input.borrow_and_update().clone();

        // Only the text is debounced.
        if edited.text != last.text {
            loop {
                match time::timeout(delay, input.changed()).await {
                    Ok(Ok(())) => continue,
                    Ok(Err(_)) => return,
                    Err(_) => break,
                }
            }
        }

        let settled = input.borrow_and_update().clone();
        if settled == last {
            continue;
        }
        search(&backend, &settled, &output).await;
        last = settled;
    }
}

async fn search(backend: &BackendState, query: &SearchQuery, output: &watch::Sender<SearchState>) {
    output.send_modify(|state| {
        state.loading = true;
        state.error = None;
    });

    let filter = query.filter();
    match backend.search_programs(&filter, 1, SEARCH_LIMIT).await {
        Ok(page) => {
            output.send_replace(SearchState {
                loading: false,
                items: page.items,
                total: page.total,
                error: None,
            });
        }
        Err(e) => {
            tracing::warn!(error = %e, %filter, "program search failed");
            // Previous results stay visible under the error.
            output.send_modify(|state| {
                state.loading = false;
                state.error = Some(e.to_string());
            });
        }
    }
}
