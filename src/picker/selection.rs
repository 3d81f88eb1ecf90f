use tracing::debug;

use crate::error::Result;
use crate::models::{CameraPosition, GeoPoint, PlaceDetail};

/// What the surface must do after a selection change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionUpdate {
    pub marker: GeoPoint,
    /// `None` when the camera stays where it is
    pub camera: Option<CameraPosition>,
}

/// Zoom levels used for programmatic camera moves
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLevels {
    pub center: f64,
    pub focus: f64,
    pub gps: f64,
}

/// Current location, marker and camera of one picker screen.
///
/// Every programmatic move leaves `camera.target == current` with the marker
/// drawn at `current`. A map tap moves the marker only; the tapped point is
/// already inside the visible viewport.
#[derive(Debug, Clone)]
pub struct SelectionState {
    current: GeoPoint,
    camera: CameraPosition,
    zoom: ZoomLevels,
    lat_text: String,
    lon_text: String,
}

impl SelectionState {
    pub fn new(initial: GeoPoint, initial_zoom: f64, zoom: ZoomLevels) -> Self {
        Self {
            current: initial,
            camera: CameraPosition {
                target: initial,
                zoom: initial_zoom,
            },
            zoom,
            lat_text: initial.latitude().to_string(),
            lon_text: initial.longitude().to_string(),
        }
    }

    pub fn current(&self) -> GeoPoint {
        self.current
    }

    pub fn camera(&self) -> CameraPosition {
        self.camera
    }

    /// Text currently mirrored into the manual entry fields
    pub fn coordinate_texts(&self) -> (&str, &str) {
        (&self.lat_text, &self.lon_text)
    }

    pub fn on_map_tapped(&mut self, point: GeoPoint) -> SelectionUpdate {
        debug!("Map tapped at {}", point);
        self.set_current(point, true);
        SelectionUpdate {
            marker: point,
            camera: None,
        }
    }

    /// Parse the manual entry fields and centre on them.
    /// Leaves the state untouched when either field is invalid.
    pub fn on_manual_coordinates_submitted(
        &mut self,
        lat_text: &str,
        lon_text: &str,
    ) -> Result<SelectionUpdate> {
        let point = GeoPoint::parse(lat_text, lon_text)?;
        // The fields keep what the user typed
        self.set_current(point, false);
        self.lat_text = lat_text.to_string();
        self.lon_text = lon_text.to_string();
        Ok(self.move_camera(point, self.zoom.center))
    }

    pub fn on_place_selected(&mut self, detail: &PlaceDetail) -> SelectionUpdate {
        debug!("Place {} selected at {}", detail.place_id, detail.centroid);
        self.set_current(detail.centroid, true);
        self.move_camera(detail.centroid, self.zoom.focus)
    }

    pub fn on_location_fix(&mut self, point: GeoPoint) -> SelectionUpdate {
        debug!("Centering on location fix {}", point);
        self.set_current(point, true);
        self.move_camera(point, self.zoom.gps)
    }

    /// The location to hand back to the caller. Pure read.
    pub fn confirm(&self) -> GeoPoint {
        self.current
    }

    fn set_current(&mut self, point: GeoPoint, mirror_texts: bool) {
        self.current = point;
        if mirror_texts {
            self.lat_text = point.latitude().to_string();
            self.lon_text = point.longitude().to_string();
        }
    }

    fn move_camera(&mut self, target: GeoPoint, zoom: f64) -> SelectionUpdate {
        self.camera = CameraPosition { target, zoom };
        SelectionUpdate {
            marker: target,
            camera: Some(self.camera),
        }
    }
}
