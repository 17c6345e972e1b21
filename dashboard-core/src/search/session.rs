use std::time::Duration;

use tokio::{
    sync::mpsc::{self, error::SendError},
    task::AbortHandle,
};
use tracing::debug;

use crate::{
    api::WeatherApi,
    error::FetchError,
    model::LocationCandidate,
    scheduler::TokioScheduler,
};

use super::{SearchController, SearchState, SearchTicket, Selection};

/// Events from the search box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchInput {
    /// New contents of the search field.
    Text(String),
    /// Click on the result at this index.
    Select(usize),
    ToggleOverlay,
}

/// What the presentation layer should show after an input.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// A search for this query is scheduled or running.
    Searching(String),
    Results(Vec<LocationCandidate>),
    Failed(String),
    /// Field emptied: list hidden, no search running.
    Cleared,
    Selected(Selection),
    Overlay(bool),
}

type Outcome = (u64, Result<Vec<LocationCandidate>, FetchError>);

/// Drives a [`SearchController`] with tokio timers and real geocoding requests.
#[derive(Debug, Clone)]
pub struct SearchSession {
    api: WeatherApi,
    delay: Duration,
    timeout: Duration,
}

impl SearchSession {
    pub fn new(api: WeatherApi, delay: Duration, timeout: Duration) -> Self {
        Self {
            api,
            delay,
            timeout,
        }
    }

    /// Process inputs until nobody listens for events, or until the input channel
    /// closes and the last scheduled search has settled.
    pub async fn run(self, inputs: mpsc::Receiver<SearchInput>, events: mpsc::Sender<SearchEvent>) {
        if self.drive(inputs, events).await.is_err() {
            debug!("search event receiver dropped, stopping session");
        }
    }

    async fn drive(
        &self,
        mut inputs: mpsc::Receiver<SearchInput>,
        events: mpsc::Sender<SearchEvent>,
    ) -> Result<(), SendError<SearchEvent>> {
        let (scheduler, mut fired) = TokioScheduler::new();
        let mut controller = SearchController::new(scheduler, self.delay);
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Outcome>();
        let mut in_flight: Option<AbortHandle> = None;
        let mut inputs_open = true;

        loop {
            if !inputs_open && controller.state() == &SearchState::Idle {
                break;
            }

            tokio::select! {
                input = inputs.recv(), if inputs_open => {
                    let Some(input) = input else {
                        debug!("search inputs closed");
                        inputs_open = false;
                        continue;
                    };
                    match input {
                        SearchInput::Text(text) => {
                            if let Some(task) = in_flight.take() {
                                task.abort();
                            }
                            controller.on_input(&text);
                            let event = if controller.view().searching {
                                SearchEvent::Searching(text.trim().to_string())
                            } else {
                                SearchEvent::Cleared
                            };
                            events.send(event).await?;
                        }
                        SearchInput::Select(index) => {
                            if let Some(selection) = controller.select(index) {
                                if let Some(task) = in_flight.take() {
                                    task.abort();
                                }
                                events.send(SearchEvent::Selected(selection)).await?;
                            }
                        }
                        SearchInput::ToggleOverlay => {
                            let open = controller.toggle_search_overlay();
                            events.send(SearchEvent::Overlay(open)).await?;
                        }
                    }
                }
                Some(token) = fired.recv() => {
                    if let Some(ticket) = controller.on_debounce_fire(token) {
                        in_flight = Some(self.spawn_fetch(ticket, done_tx.clone()));
                    }
                }
                Some((generation, outcome)) = done_rx.recv() => {
                    if controller.on_search_complete(generation, outcome) {
                        in_flight = None;
                        let view = controller.view();
                        let event = match &view.error {
                            Some(message) => SearchEvent::Failed(message.clone()),
                            None => SearchEvent::Results(view.results.clone()),
                        };
                        events.send(event).await?;
                    }
                }
            }
        }

        if let Some(task) = in_flight {
            task.abort();
        }
        Ok(())
    }

    fn spawn_fetch(&self, ticket: SearchTicket, done: mpsc::UnboundedSender<Outcome>) -> AbortHandle {
        let api = self.api.clone();
        let timeout = self.timeout;

        let task = tokio::spawn(async move {
            let outcome = tokio::time::timeout(timeout, api.geocode(&ticket.query))
                .await
                .unwrap_or(Err(FetchError::Timeout(timeout)));
            let _ = done.send((ticket.generation, outcome));
        });

        task.abort_handle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::{DataFetcher, UrlBuilder, testing::StubFetcher},
        config::DEFAULT_API_BASE,
        model::{Coordinates, Units},
        route::Route,
    };
    use async_trait::async_trait;
    use reqwest::Url;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tokio::time::{Instant, sleep};

    const DELAY: Duration = Duration::from_millis(500);
    const TIMEOUT: Duration = Duration::from_secs(10);

    fn session(fetcher: Arc<dyn DataFetcher>) -> SearchSession {
        let urls = UrlBuilder::new(DEFAULT_API_BASE, "KEY", Units::Metric).unwrap();
        SearchSession::new(WeatherApi::new(fetcher, urls), DELAY, TIMEOUT)
    }

    fn start(
        fetcher: Arc<dyn DataFetcher>,
    ) -> (mpsc::Sender<SearchInput>, mpsc::Receiver<SearchEvent>) {
        let (input_tx, input_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::channel(16);
        tokio::spawn(session(fetcher).run(input_rx, event_tx));
        (input_tx, event_rx)
    }

    fn london_stub() -> StubFetcher {
        StubFetcher::default().with(
            "/geo/1.0/direct",
            json!([
                {"name": "London", "lat": 51.5073219, "lon": -0.1276474, "country": "GB", "state": "England"},
                {"name": "London", "lat": 42.9832406, "lon": -81.243372, "country": "CA", "state": "Ontario"}
            ]),
        )
    }

    fn queries(stub: &StubFetcher) -> Vec<String> {
        stub.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|url| {
                url.query_pairs()
                    .find(|(k, _)| k == "q")
                    .map(|(_, v)| v.into_owned())
            })
            .collect()
    }

    #[derive(Debug)]
    struct HangingFetcher;

    #[async_trait]
    impl DataFetcher for HangingFetcher {
        async fn fetch_json(&self, _url: &Url) -> Result<Value, FetchError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_last_query_is_fetched() {
        let stub = Arc::new(london_stub());
        let (input, mut events) = start(stub.clone());
        let start = Instant::now();

        input.send(SearchInput::Text("Lon".into())).await.unwrap();
        sleep(Duration::from_millis(200)).await;
        input.send(SearchInput::Text("London".into())).await.unwrap();

        assert_eq!(events.recv().await, Some(SearchEvent::Searching("Lon".into())));
        assert_eq!(events.recv().await, Some(SearchEvent::Searching("London".into())));

        match events.recv().await {
            Some(SearchEvent::Results(found)) => {
                assert_eq!(found.len(), 2);
                assert_eq!(found[1].state.as_deref(), Some("Ontario"));
            }
            other => panic!("expected results, got {other:?}"),
        }
        assert!(start.elapsed() >= Duration::from_millis(700));
        assert_eq!(queries(&stub), vec!["London".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_the_field_cancels_the_search() {
        let stub = Arc::new(london_stub());
        let (input, mut events) = start(stub.clone());

        input.send(SearchInput::Text("Paris".into())).await.unwrap();
        sleep(Duration::from_millis(100)).await;
        input.send(SearchInput::Text(String::new())).await.unwrap();

        assert_eq!(events.recv().await, Some(SearchEvent::Searching("Paris".into())));
        assert_eq!(events.recv().await, Some(SearchEvent::Cleared));

        sleep(Duration::from_secs(5)).await;
        assert!(events.try_recv().is_err());
        assert!(queries(&stub).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_search_times_out_and_reports_failure() {
        let (input, mut events) = start(Arc::new(HangingFetcher));

        input.send(SearchInput::Text("Atlantis".into())).await.unwrap();
        assert_eq!(events.recv().await, Some(SearchEvent::Searching("Atlantis".into())));

        match events.recv().await {
            Some(SearchEvent::Failed(message)) => assert!(message.contains("in time")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_search_reports_failure() {
        let (input, mut events) = start(Arc::new(StubFetcher::default()));

        input.send(SearchInput::Text("Nowhere".into())).await.unwrap();
        events.recv().await;

        assert!(matches!(events.recv().await, Some(SearchEvent::Failed(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn selecting_a_result_navigates() {
        let (input, mut events) = start(Arc::new(london_stub()));

        input.send(SearchInput::ToggleOverlay).await.unwrap();
        assert_eq!(events.recv().await, Some(SearchEvent::Overlay(true)));

        input.send(SearchInput::Text("London".into())).await.unwrap();
        events.recv().await;
        assert!(matches!(events.recv().await, Some(SearchEvent::Results(_))));

        input.send(SearchInput::Select(0)).await.unwrap();
        match events.recv().await {
            Some(SearchEvent::Selected(selection)) => {
                assert_eq!(selection.candidate.country, "GB");
                assert_eq!(
                    selection.route,
                    Route::Weather(Coordinates::new(51.5073219, -0.1276474))
                );
            }
            other => panic!("expected selection, got {other:?}"),
        }

        // The list is collapsed, so a second click selects nothing.
        input.send(SearchInput::Select(0)).await.unwrap();
        input.send(SearchInput::ToggleOverlay).await.unwrap();
        assert_eq!(events.recv().await, Some(SearchEvent::Overlay(true)));
    }

    #[tokio::test(start_paused = true)]
    async fn pending_search_completes_after_inputs_close() {
        let stub = Arc::new(london_stub());
        let (input, mut events) = start(stub.clone());

        input.send(SearchInput::Text("London".into())).await.unwrap();
        drop(input);

        assert_eq!(events.recv().await, Some(SearchEvent::Searching("London".into())));
        assert!(matches!(events.recv().await, Some(SearchEvent::Results(found)) if found.len() == 2));
        assert_eq!(events.recv().await, None);
        assert_eq!(queries(&stub), vec!["London".to_string()]);
    }

    #[tokio::test]
    async fn session_ends_when_inputs_close() {
        let (input_tx, input_rx) = mpsc::channel(1);
        let (event_tx, _event_rx) = mpsc::channel(1);
        let handle = tokio::spawn(session(Arc::new(london_stub())).run(input_rx, event_tx));

        drop(input_tx);
        handle.await.unwrap();
    }
}
