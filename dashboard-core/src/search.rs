//! Debounced location search.
//!
//! [`SearchController`] turns text-change events into at most one geocoding
//! request per quiet period. It performs no I/O: when a debounce timer fires it
//! hands back a [`SearchTicket`] and expects the outcome through
//! [`SearchController::on_search_complete`]. [`session::SearchSession`] is the
//! async driver that wires it to real timers and the API.

use std::time::Duration;

use tracing::{debug, warn};

use crate::{
    error::FetchError,
    model::LocationCandidate,
    route::Route,
    scheduler::{Scheduler, TimerToken},
};

pub mod session;

pub const DEFAULT_SEARCH_DELAY: Duration = Duration::from_millis(500);

/// A geocoding request the driver must perform on the controller's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub generation: u64,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    /// Timer armed; `query` is sent when `token` fires.
    Pending { query: String, token: TimerToken },
    /// Request for `query` in flight; only a result tagged `generation` is accepted.
    Fetching { query: String, generation: u64 },
}

/// Everything the presentation layer needs to draw the search box.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchView {
    /// Spinner on the search field.
    pub searching: bool,
    pub results_visible: bool,
    pub results: Vec<LocationCandidate>,
    /// The whole search panel (mobile overlay).
    pub overlay_open: bool,
    pub error: Option<String>,
}

/// A chosen search result and where it navigates to.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub candidate: LocationCandidate,
    pub route: Route,
}

#[derive(Debug)]
pub struct SearchController<S> {
    scheduler: S,
    delay: Duration,
    state: SearchState,
    generation: u64,
    view: SearchView,
}

impl<S: Scheduler> SearchController<S> {
    pub fn new(scheduler: S, delay: Duration) -> Self {
        Self {
            scheduler,
            delay,
            state: SearchState::Idle,
            generation: 0,
            view: SearchView::default(),
        }
    }

    /// Called on every change of the search field.
    pub fn on_input(&mut self, text: &str) {
        self.cancel_pending();

        let query = text.trim();
        if query.is_empty() {
            debug!("search cleared");
            self.view.results.clear();
            self.view.results_visible = false;
            self.view.searching = false;
            self.view.error = None;
            return;
        }

        self.view.searching = true;
        let token = self.scheduler.schedule(self.delay);
        debug!(%token, query, "search scheduled");
        self.state = SearchState::Pending {
            query: query.to_string(),
            token,
        };
    }

    /// Called when a debounce timer elapses. Returns the request to perform, if
    /// `token` is still the armed one.
    pub fn on_debounce_fire(&mut self, token: TimerToken) -> Option<SearchTicket> {
        let query = match &self.state {
            SearchState::Pending { token: armed, query } if *armed == token => query.clone(),
            _ => {
                debug!(%token, "stale timer ignored");
                return None;
            }
        };

        self.generation += 1;
        let generation = self.generation;
        debug!(generation, query, "search request issued");
        self.state = SearchState::Fetching {
            query: query.clone(),
            generation,
        };

        Some(SearchTicket { generation, query })
    }

    /// Feed back the outcome of a [`SearchTicket`]. Returns whether it was applied;
    /// outcomes superseded by newer input are dropped.
    pub fn on_search_complete(
        &mut self,
        generation: u64,
        outcome: Result<Vec<LocationCandidate>, FetchError>,
    ) -> bool {
        let query = match &self.state {
            SearchState::Fetching {
                generation: current,
                query,
            } if *current == generation => query.clone(),
            _ => {
                debug!(generation, "superseded search result dropped");
                return false;
            }
        };

        self.finish_search();
        self.view.results_visible = true;

        match outcome {
            Ok(results) => {
                debug!(query, count = results.len(), "search results shown");
                self.view.results = results;
                self.view.error = None;
            }
            Err(err) => {
                warn!(query, error = %err, "location search failed");
                self.view.results.clear();
                self.view.error = Some(err.user_message());
            }
        }

        true
    }

    /// Flip the search panel. Returns the new visibility.
    pub fn toggle_search_overlay(&mut self) -> bool {
        self.view.overlay_open = !self.view.overlay_open;
        self.view.overlay_open
    }

    /// Pick the result at `index`: hides the panel and collapses the list.
    /// Returns `None` (and changes nothing) when no such result is shown.
    pub fn select(&mut self, index: usize) -> Option<Selection> {
        if !self.view.results_visible {
            return None;
        }
        let candidate = self.view.results.get(index)?.clone();

        self.cancel_pending();
        self.finish_search();
        self.view.overlay_open = false;
        self.view.results_visible = false;
        self.view.results.clear();
        self.view.error = None;

        let route = Route::Weather(candidate.coordinates());
        debug!(name = %candidate.name, %route, "search result selected");
        Some(Selection { candidate, route })
    }

    pub fn view(&self) -> &SearchView {
        &self.view
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Disarm the timer and forget any in-flight request.
    fn cancel_pending(&mut self) {
        if let SearchState::Pending { token, .. } = &self.state {
            self.scheduler.cancel(*token);
        }
        self.state = SearchState::Idle;
    }

    /// Shared exit path for success and failure.
    fn finish_search(&mut self) {
        self.state = SearchState::Idle;
        self.view.searching = false;
    }
}
