use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::api::PlacesApi;
use crate::error::Result;
use crate::models::SearchResultEntry;

/// Where the search field is in its search-as-you-type cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    /// No query text
    Idle,
    /// Debounce timer running for the latest text
    Typing,
    /// Timer elapsed, request in flight
    Searching,
    /// Latest batch rendered
    Showing,
    /// A suggestion was picked; the field holds its name
    Picked,
}

/// Completion reported back by a debounce task
#[derive(Debug)]
pub enum SearchEvent {
    DebounceElapsed {
        generation: u64,
    },
    Completed {
        generation: u64,
        query: String,
        result: Result<Vec<SearchResultEntry>>,
    },
}

/// Debounced search-as-you-type state machine.
///
/// Every keystroke bumps `generation` and cancels the previous debounce task.
/// Events coming back from a task are applied only if they carry the current
/// generation, so a slow response for older text can never overwrite a newer
/// batch regardless of arrival order.
pub struct SearchCoordinator {
    api: Arc<dyn PlacesApi>,
    events: mpsc::UnboundedSender<SearchEvent>,
    debounce: Duration,
    limit: usize,
    query: String,
    generation: u64,
    pending: Option<CancellationToken>,
    results: Vec<SearchResultEntry>,
    visible: bool,
    phase: SearchPhase,
}

impl SearchCoordinator {
    pub fn new(
        api: Arc<dyn PlacesApi>,
        events: mpsc::UnboundedSender<SearchEvent>,
        debounce: Duration,
        limit: usize,
    ) -> Self {
        Self {
            api,
            events,
            debounce,
            limit,
            query: String::new(),
            generation: 0,
            pending: None,
            results: Vec::new(),
            visible: false,
            phase: SearchPhase::Idle,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[SearchResultEntry] {
        &self.results
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Handle the search field changing to `text`.
    /// Empty text clears immediately; anything else restarts the debounce.
    pub fn on_query_changed(&mut self, text: &str) {
        self.invalidate();
        self.query = text.to_string();
        self.visible = false;

        if text.is_empty() {
            self.results.clear();
            self.phase = SearchPhase::Idle;
            trace!("Search cleared");
            return;
        }

        self.phase = SearchPhase::Typing;
        self.spawn_debounced(text.to_string());
    }

    /// Apply an event from a debounce task.
    /// Returns whether the dropdown needs to be re-rendered.
    pub fn apply(&mut self, event: SearchEvent) -> bool {
        match event {
            SearchEvent::DebounceElapsed { generation } => {
                if generation != self.generation {
                    trace!("Ignoring stale debounce for generation {}", generation);
                    return false;
                }
                self.phase = SearchPhase::Searching;
                self.visible = true;
                true
            }
            SearchEvent::Completed {
                generation,
                query,
                result,
            } => {
                if generation != self.generation {
                    debug!(
                        "Discarding stale results for {:?} (generation {} < {})",
                        query, generation, self.generation
                    );
                    return false;
                }
                self.pending = None;
                self.phase = SearchPhase::Showing;
                match result {
                    Ok(batch) => {
                        info!("Showing {} suggestions for {:?}", batch.len(), query);
                        self.results = batch;
                        true
                    }
                    Err(e) => {
                        // Keep whatever was shown before
                        debug!("Search for {:?} failed: {}", query, e);
                        false
                    }
                }
            }
        }
    }

    /// A suggestion was picked: hide the dropdown and take its name as the
    /// query without starting a new search cycle.
    pub fn on_suggestion_picked(&mut self, entry: &SearchResultEntry) {
        self.invalidate();
        self.query = entry.name.clone();
        self.visible = false;
        self.phase = SearchPhase::Picked;
    }

    /// Cancel the pending task and make any result it still delivers stale
    fn invalidate(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
        self.generation += 1;
    }

    fn spawn_debounced(&mut self, query: String) {
        let token = CancellationToken::new();
        self.pending = Some(token.clone());

        let generation = self.generation;
        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        let delay = self.debounce;
        let limit = self.limit;

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            if events
                .send(SearchEvent::DebounceElapsed { generation })
                .is_err()
            {
                return;
            }

            debug!("Searching for {:?} (generation {})", query, generation);
            let result = tokio::select! {
                _ = token.cancelled() => return,
                result = api.search(&query, limit) => result,
            };
            let _ = events.send(SearchEvent::Completed {
                generation,
                query,
                result,
            });
        });
    }
}

impl Drop for SearchCoordinator {
    fn drop(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PickerError;
    use crate::testing::{entry, FakePlaces};

    const DEBOUNCE: Duration = Duration::from_millis(500);

    fn coordinator(
        api: Arc<FakePlaces>,
    ) -> (SearchCoordinator, mpsc::UnboundedReceiver<SearchEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SearchCoordinator::new(api, tx, DEBOUNCE, 8), rx)
    }

    /// Apply events until the coordinator reaches `Showing`; returns how many
    /// completions changed the batch
    async fn settle(
        coordinator: &mut SearchCoordinator,
        rx: &mut mpsc::UnboundedReceiver<SearchEvent>,
    ) -> usize {
        let mut applied = 0;
        while coordinator.phase() != SearchPhase::Showing {
            let Ok(Some(event)) = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await
            else {
                break;
            };
            let completed = matches!(event, SearchEvent::Completed { .. });
            if coordinator.apply(event) && completed {
                applied += 1;
            }
        }
        applied
    }

    #[tokio::test(start_paused = true)]
    async fn shows_results_after_quiet_period() {
        let api = Arc::new(FakePlaces::new().with_search("Thamel", vec![entry(123, "Thamel")]));
        let (mut search, mut rx) = coordinator(Arc::clone(&api));

        search.on_query_changed("Thamel");
        assert_eq!(search.phase(), SearchPhase::Typing);
        assert!(!search.is_visible());

        let elapsed = rx.recv().await.unwrap();
        assert!(matches!(elapsed, SearchEvent::DebounceElapsed { .. }));
        assert!(search.apply(elapsed));
        assert_eq!(search.phase(), SearchPhase::Searching);
        assert!(search.is_visible());
        assert!(search.results().is_empty());

        let completed = rx.recv().await.unwrap();
        assert!(search.apply(completed));
        assert_eq!(search.phase(), SearchPhase::Showing);
        assert!(search.is_visible());
        assert_eq!(search.results(), &[entry(123, "Thamel")]);
        assert_eq!(api.search_calls(), vec!["Thamel".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn keystrokes_within_debounce_collapse_into_one_search() {
        let api = Arc::new(
            FakePlaces::new()
                .with_search("Tha", vec![entry(1, "Thali")])
                .with_search("Thamel", vec![entry(123, "Thamel")]),
        );
        let (mut search, mut rx) = coordinator(Arc::clone(&api));

        for text in ["T", "Th", "Tha", "Tham", "Thame", "Thamel"] {
            search.on_query_changed(text);
            tokio::time::sleep(Duration::from_millis(200)).await;
        }

        let applied = settle(&mut search, &mut rx).await;
        assert_eq!(applied, 1);
        assert_eq!(api.search_calls(), vec!["Thamel".to_string()]);
        assert_eq!(search.results(), &[entry(123, "Thamel")]);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_request_never_touches_the_batch() {
        let api = Arc::new(
            FakePlaces::new()
                .with_search("Tha", vec![entry(1, "Thali")])
                .with_search_delay("Tha", Duration::from_secs(2))
                .with_search("Thamel", vec![entry(123, "Thamel")]),
        );
        let (mut search, mut rx) = coordinator(Arc::clone(&api));

        search.on_query_changed("Tha");
        let elapsed = rx.recv().await.unwrap();
        search.apply(elapsed);
        assert_eq!(search.phase(), SearchPhase::Searching);

        // Request for "Tha" is now in flight
        search.on_query_changed("Thamel");
        assert!(!search.is_visible());

        settle(&mut search, &mut rx).await;
        assert_eq!(search.results(), &[entry(123, "Thamel")]);
        assert_eq!(
            api.search_calls(),
            vec!["Tha".to_string(), "Thamel".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn late_completion_from_older_generation_is_discarded() {
        let api = Arc::new(FakePlaces::new().with_search("Thamel", vec![entry(123, "Thamel")]));
        let (mut search, mut rx) = coordinator(api);

        search.on_query_changed("Tha");
        let stale_generation = search.generation();
        search.on_query_changed("Thamel");
        settle(&mut search, &mut rx).await;

        let changed = search.apply(SearchEvent::Completed {
            generation: stale_generation,
            query: "Tha".to_string(),
            result: Ok(vec![entry(1, "Thali")]),
        });
        assert!(!changed);
        assert_eq!(search.results(), &[entry(123, "Thamel")]);
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_text_is_immediate() {
        let api = Arc::new(FakePlaces::new().with_search("Thamel", vec![entry(123, "Thamel")]));
        let (mut search, mut rx) = coordinator(Arc::clone(&api));

        search.on_query_changed("Thamel");
        settle(&mut search, &mut rx).await;
        assert!(search.is_visible());

        search.on_query_changed("");
        assert_eq!(search.phase(), SearchPhase::Idle);
        assert!(search.results().is_empty());
        assert!(!search.is_visible());

        // Clearing while a timer is pending cancels it outright
        search.on_query_changed("Tham");
        search.on_query_changed("");
        tokio::time::sleep(DEBOUNCE * 4).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(api.search_calls(), vec!["Thamel".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn whitespace_query_is_debounced_like_any_text() {
        let api = Arc::new(FakePlaces::new());
        let (mut search, mut rx) = coordinator(Arc::clone(&api));

        search.on_query_changed(" ");
        assert_eq!(search.phase(), SearchPhase::Typing);

        settle(&mut search, &mut rx).await;
        assert_eq!(search.phase(), SearchPhase::Showing);
        assert!(search.results().is_empty());
        assert_eq!(api.search_calls(), vec![" ".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_search_keeps_previous_batch() {
        let api = Arc::new(
            FakePlaces::new()
                .with_search("Thamel", vec![entry(123, "Thamel")])
                .with_failing_search("Thamel Chowk"),
        );
        let (mut search, mut rx) = coordinator(api);

        search.on_query_changed("Thamel");
        settle(&mut search, &mut rx).await;

        search.on_query_changed("Thamel Chowk");
        let elapsed = rx.recv().await.unwrap();
        search.apply(elapsed);
        let completed = rx.recv().await.unwrap();
        assert!(matches!(
            completed,
            SearchEvent::Completed {
                result: Err(PickerError::SearchFailed(_)),
                ..
            }
        ));
        assert!(!search.apply(completed));
        assert_eq!(search.results(), &[entry(123, "Thamel")]);
        assert_eq!(search.phase(), SearchPhase::Showing);
    }

    #[tokio::test(start_paused = true)]
    async fn picking_takes_the_name_without_searching() {
        let api = Arc::new(FakePlaces::new().with_search("Thamel", vec![entry(123, "Thamel Marg")]));
        let (mut search, mut rx) = coordinator(Arc::clone(&api));

        search.on_query_changed("Thamel");
        settle(&mut search, &mut rx).await;

        let picked = search.results()[0].clone();
        search.on_suggestion_picked(&picked);
        assert_eq!(search.query(), "Thamel Marg");
        assert_eq!(search.phase(), SearchPhase::Picked);
        assert!(!search.is_visible());

        tokio::time::sleep(DEBOUNCE * 4).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(api.search_calls(), vec!["Thamel".to_string()]);
    }
}
