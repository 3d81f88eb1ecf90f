pub mod search;
pub mod selection;

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::api::PlacesApi;
use crate::config::{PickerCapabilities, PickerConfig};
use crate::error::{PickerError, Result};
use crate::models::{ConfirmedLocation, GeoPoint, PlaceDetail, PlaceId, SearchResultEntry};
use crate::surface::{LifecycleEvent, MapSurface};

pub use search::{SearchCoordinator, SearchEvent, SearchPhase};
pub use selection::{SelectionState, SelectionUpdate, ZoomLevels};

/// Input the platform layer feeds into a running picker screen
#[derive(Debug, Clone, PartialEq)]
pub enum PickerEvent {
    QueryChanged(String),
    SuggestionPicked(SearchResultEntry),
    MapTapped(GeoPoint),
    CoordinatesSubmitted { lat_text: String, lon_text: String },
    LocationFix(GeoPoint),
    Confirm,
    Lifecycle(LifecycleEvent),
}

#[derive(Debug)]
struct DetailEvent {
    generation: u64,
    place_id: PlaceId,
    result: Result<PlaceDetail>,
}

/// Cloneable sender side of a picker screen
#[derive(Debug, Clone)]
pub struct PickerHandle {
    tx: mpsc::UnboundedSender<PickerEvent>,
}

impl PickerHandle {
    pub fn send(&self, event: PickerEvent) -> Result<()> {
        self.tx.send(event).map_err(|_| PickerError::ScreenClosed)
    }

    pub fn type_query(&self, text: impl Into<String>) -> Result<()> {
        self.send(PickerEvent::QueryChanged(text.into()))
    }

    pub fn pick_suggestion(&self, entry: SearchResultEntry) -> Result<()> {
        self.send(PickerEvent::SuggestionPicked(entry))
    }

    pub fn tap_map(&self, point: GeoPoint) -> Result<()> {
        self.send(PickerEvent::MapTapped(point))
    }

    pub fn submit_coordinates(
        &self,
        lat_text: impl Into<String>,
        lon_text: impl Into<String>,
    ) -> Result<()> {
        self.send(PickerEvent::CoordinatesSubmitted {
            lat_text: lat_text.into(),
            lon_text: lon_text.into(),
        })
    }

    pub fn location_fix(&self, point: GeoPoint) -> Result<()> {
        self.send(PickerEvent::LocationFix(point))
    }

    pub fn confirm(&self) -> Result<()> {
        self.send(PickerEvent::Confirm)
    }

    pub fn lifecycle(&self, event: LifecycleEvent) -> Result<()> {
        self.send(PickerEvent::Lifecycle(event))
    }
}

/// One location-picker screen.
///
/// `run` is the screen's only thread of control: platform input, debounce
/// completions and detail completions all arrive as events on channels and
/// are applied here, so the selection and search session have a single
/// writer. The screen ends on `LifecycleEvent::Destroy` or when every
/// [`PickerHandle`] is dropped.
pub struct PickerScreen<S: MapSurface> {
    api: Arc<dyn PlacesApi>,
    surface: S,
    capabilities: PickerCapabilities,
    selection: SelectionState,
    search: SearchCoordinator,
    commands: mpsc::UnboundedReceiver<PickerEvent>,
    search_events: mpsc::UnboundedReceiver<SearchEvent>,
    detail_tx: mpsc::UnboundedSender<DetailEvent>,
    detail_rx: mpsc::UnboundedReceiver<DetailEvent>,
    detail_generation: u64,
    detail_pending: Option<CancellationToken>,
    centered_on_fix: bool,
    last_confirmed: Option<ConfirmedLocation>,
}

impl<S: MapSurface> PickerScreen<S> {
    pub fn new(config: &PickerConfig, api: Arc<dyn PlacesApi>, surface: S) -> (Self, PickerHandle) {
        let (tx, commands) = mpsc::unbounded_channel();
        let (search_tx, search_events) = mpsc::unbounded_channel();
        let (detail_tx, detail_rx) = mpsc::unbounded_channel();

        let selection = SelectionState::new(
            config.default_location,
            config.initial_zoom,
            ZoomLevels {
                center: config.center_zoom,
                focus: config.focus_zoom,
                gps: config.gps_zoom,
            },
        );
        let search = SearchCoordinator::new(
            Arc::clone(&api),
            search_tx,
            config.debounce(),
            config.api.search_limit,
        );

        let screen = Self {
            api,
            surface,
            capabilities: config.capabilities,
            selection,
            search,
            commands,
            search_events,
            detail_tx,
            detail_rx,
            detail_generation: 0,
            detail_pending: None,
            centered_on_fix: false,
            last_confirmed: None,
        };
        (screen, PickerHandle { tx })
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn search(&self) -> &SearchCoordinator {
        &self.search
    }

    /// Drive the screen until it is destroyed.
    /// Returns the last confirmed location, if any.
    pub async fn run(mut self) -> Option<ConfirmedLocation> {
        info!(
            "Picker screen started at {} using {}",
            self.selection.current(),
            self.api.provider_name()
        );
        self.surface.animate_camera(self.selection.camera());
        self.surface.move_marker(self.selection.current());
        self.mirror_inputs();

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(PickerEvent::Lifecycle(LifecycleEvent::Destroy)) => {
                        self.surface.on_lifecycle(LifecycleEvent::Destroy);
                        break;
                    }
                    Some(event) => self.handle(event),
                    None => {
                        debug!("All picker handles dropped");
                        self.surface.on_lifecycle(LifecycleEvent::Destroy);
                        break;
                    }
                },
                Some(event) = self.search_events.recv() => {
                    if self.search.apply(event) {
                        self.render_dropdown();
                    }
                }
                Some(event) = self.detail_rx.recv() => self.apply_detail(event),
            }
        }

        if let Some(token) = self.detail_pending.take() {
            token.cancel();
        }
        info!("Picker screen closed");
        self.last_confirmed
    }

    /// Apply one platform event
    pub fn handle(&mut self, event: PickerEvent) {
        match event {
            PickerEvent::QueryChanged(text) => {
                self.search.on_query_changed(&text);
                self.render_dropdown();
            }
            PickerEvent::SuggestionPicked(entry) => {
                self.search.on_suggestion_picked(&entry);
                self.render_dropdown();
                self.surface.set_query_text(self.search.query());
                self.fetch_detail(entry.place_id);
            }
            PickerEvent::MapTapped(point) => {
                let update = self.selection.on_map_tapped(point);
                self.apply_update(update);
            }
            PickerEvent::CoordinatesSubmitted { lat_text, lon_text } => {
                if !self.capabilities.manual_entry {
                    warn!("Manual coordinate entry is disabled for this screen");
                    return;
                }
                match self
                    .selection
                    .on_manual_coordinates_submitted(&lat_text, &lon_text)
                {
                    Ok(update) => self.apply_update(update),
                    Err(e) => {
                        warn!("{}", e);
                        self.surface.show_notice("Invalid coordinates");
                    }
                }
            }
            PickerEvent::LocationFix(point) => {
                if !self.capabilities.gps_autocenter || self.centered_on_fix {
                    trace!("Ignoring location fix {}", point);
                    return;
                }
                self.centered_on_fix = true;
                let update = self.selection.on_location_fix(point);
                self.apply_update(update);
            }
            PickerEvent::Confirm => {
                let point = self.selection.confirm();
                let result = ConfirmedLocation {
                    point,
                    confirmed_at: Utc::now(),
                };
                info!("Location confirmed: {}", point);
                self.surface
                    .show_notice(&format!("Location confirmed: {}", point));
                self.surface.deliver_result(&result);
                self.last_confirmed = Some(result);
            }
            PickerEvent::Lifecycle(event) => self.surface.on_lifecycle(event),
        }
    }

    fn fetch_detail(&mut self, place_id: PlaceId) {
        if let Some(token) = self.detail_pending.take() {
            token.cancel();
        }
        self.detail_generation += 1;

        let token = CancellationToken::new();
        self.detail_pending = Some(token.clone());
        let generation = self.detail_generation;
        let api = Arc::clone(&self.api);
        let events = self.detail_tx.clone();

        debug!("Fetching detail for place {}", place_id);
        tokio::spawn(async move {
            let result = tokio::select! {
                _ = token.cancelled() => return,
                result = api.fetch_detail(place_id) => result,
            };
            let _ = events.send(DetailEvent {
                generation,
                place_id,
                result,
            });
        });
    }

    fn apply_detail(&mut self, event: DetailEvent) {
        if event.generation != self.detail_generation {
            debug!("Discarding stale detail for place {}", event.place_id);
            return;
        }
        self.detail_pending = None;

        match event.result {
            Ok(detail) => {
                let update = self.selection.on_place_selected(&detail);
                self.apply_update(update);
            }
            Err(e @ PickerError::DetailNotFound(_)) => {
                warn!("{}", e);
                self.surface.show_notice("Place not found");
            }
            Err(e) => {
                warn!("{}", e);
                self.surface.show_notice("Could not load place details");
            }
        }
    }

    fn apply_update(&mut self, update: SelectionUpdate) {
        self.surface.move_marker(update.marker);
        if let Some(camera) = update.camera {
            self.surface.animate_camera(camera);
        }
        self.mirror_inputs();
    }

    fn mirror_inputs(&mut self) {
        let (lat_text, lon_text) = self.selection.coordinate_texts();
        self.surface.set_coordinate_inputs(lat_text, lon_text);
    }

    fn render_dropdown(&mut self) {
        self.surface
            .show_suggestions(self.search.results(), self.search.is_visible());
    }
}
