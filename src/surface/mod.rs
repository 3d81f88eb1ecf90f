use serde::Serialize;
use tokio::sync::mpsc;

use crate::models::{CameraPosition, ConfirmedLocation, GeoPoint, SearchResultEntry};

/// Platform lifecycle notifications forwarded to the map view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LifecycleEvent {
    Start,
    Resume,
    Pause,
    Stop,
    LowMemory,
    SaveState,
    Destroy,
}

/// Map view the picker draws on; called only from the screen's event loop
pub trait MapSurface: Send {
    /// Draw the selection marker at `point`
    fn move_marker(&mut self, point: GeoPoint);

    /// Animate the camera to a new target and zoom
    fn animate_camera(&mut self, camera: CameraPosition);

    /// Render the suggestion dropdown; `visible == false` hides it
    fn show_suggestions(&mut self, entries: &[SearchResultEntry], visible: bool);

    /// Replace the search field text without it counting as a keystroke
    fn set_query_text(&mut self, text: &str);

    /// Mirror the selection into the manual latitude/longitude fields
    fn set_coordinate_inputs(&mut self, lat_text: &str, lon_text: &str);

    /// Show a short-lived message (toast, snackbar, status line)
    fn show_notice(&mut self, message: &str);

    /// Hand the confirmed location back to whoever opened the picker
    fn deliver_result(&mut self, result: &ConfirmedLocation);

    fn on_lifecycle(&mut self, _event: LifecycleEvent) {}
}

/// Every call a [`ChannelSurface`] receives
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SurfaceCall {
    MoveMarker(GeoPoint),
    AnimateCamera(CameraPosition),
    ShowSuggestions {
        entries: Vec<SearchResultEntry>,
        visible: bool,
    },
    SetQueryText(String),
    SetCoordinateInputs {
        lat_text: String,
        lon_text: String,
    },
    Notice(String),
    Result(ConfirmedLocation),
    Lifecycle(LifecycleEvent),
}

/// Surface that forwards every call over a channel.
///
/// Used by the headless CLI driver and by tests to observe what the picker
/// asked the map to do.
pub struct ChannelSurface {
    tx: mpsc::UnboundedSender<SurfaceCall>,
}

impl ChannelSurface {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SurfaceCall>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, call: SurfaceCall) {
        // A dropped receiver only means nobody is watching anymore
        let _ = self.tx.send(call);
    }
}

impl MapSurface for ChannelSurface {
    fn move_marker(&mut self, point: GeoPoint) {
        self.send(SurfaceCall::MoveMarker(point));
    }

    fn animate_camera(&mut self, camera: CameraPosition) {
        self.send(SurfaceCall::AnimateCamera(camera));
    }

    fn show_suggestions(&mut self, entries: &[SearchResultEntry], visible: bool) {
        self.send(SurfaceCall::ShowSuggestions {
            entries: entries.to_vec(),
            visible,
        });
    }

    fn set_query_text(&mut self, text: &str) {
        self.send(SurfaceCall::SetQueryText(text.to_string()));
    }

    fn set_coordinate_inputs(&mut self, lat_text: &str, lon_text: &str) {
        self.send(SurfaceCall::SetCoordinateInputs {
            lat_text: lat_text.to_string(),
            lon_text: lon_text.to_string(),
        });
    }

    fn show_notice(&mut self, message: &str) {
        self.send(SurfaceCall::Notice(message.to_string()));
    }

    fn deliver_result(&mut self, result: &ConfirmedLocation) {
        self.send(SurfaceCall::Result(result.clone()));
    }

    fn on_lifecycle(&mut self, event: LifecycleEvent) {
        self.send(SurfaceCall::Lifecycle(event));
    }
}
