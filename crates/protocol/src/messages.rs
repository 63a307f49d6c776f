//! Wire message shapes for the streaming places protocol (spec §6).

use nearby_types::{Place, SearchRegion};
use serde::{Deserialize, Serialize};

/// A `Place` as it appears on the wire: field names and shape are part of
/// the protocol contract and intentionally differ from the internal
/// `Place` type (`lat`/`lon`/`zip` become `latitude`/`longitude`/
/// `zip_code`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirePlace {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub state: String,
    pub zip_code: String,
    pub types: Vec<String>,
}

impl From<&Place> for WirePlace {
    fn from(place: &Place) -> Self {
        Self {
            name: place.name.clone(),
            latitude: place.lat,
            longitude: place.lon,
            state: place.state.clone(),
            zip_code: place.zip.clone(),
            types: place.types.clone(),
        }
    }
}

impl From<Place> for WirePlace {
    fn from(place: Place) -> Self {
        Self::from(&place)
    }
}

/// Messages a client sends (spec §6). `connect`/`disconnect` are transport
/// events (socket open/close) rather than application messages and so have
/// no variant here.
///
/// Fields are optional so a client can omit any of them: spec §6 requires
/// `lat=38.832352857203624, lon=-77.31284409452543, radius=1000` to fill in
/// whatever is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClientMessage {
    LocationUpdate {
        lat: Option<f64>,
        lon: Option<f64>,
        radius: Option<f64>,
    },
}

impl ClientMessage {
    /// Resolve a `LocationUpdate` into a clamped `SearchRegion`, substituting
    /// the spec's default region for any field the client omitted.
    pub fn to_region(&self) -> SearchRegion {
        let ClientMessage::LocationUpdate { lat, lon, radius } = self;
        let defaults = SearchRegion::default();
        SearchRegion::new(
            lat.unwrap_or(defaults.lat),
            lon.unwrap_or(defaults.lon),
            radius.unwrap_or(defaults.radius_m),
        )
    }
}

/// Messages a server sends (spec §6). `PlacesComplete` and `Error` are
/// terminal: no further message follows for that request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServerMessage {
    PlacesUpdate { places: Vec<WirePlace> },
    PlacesComplete { total: u32 },
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_place_renames_fields_from_internal_place() {
        let place = Place::new("Cafe", 38.9, -77.3, "VA", "22030", vec!["cafe".to_string()])
            .unwrap();
        let wire: WirePlace = (&place).into();
        assert_eq!(wire.latitude, 38.9);
        assert_eq!(wire.longitude, -77.3);
        assert_eq!(wire.zip_code, "22030");
    }

    #[test]
    fn location_update_fills_in_defaults_for_missing_fields() {
        let msg = ClientMessage::LocationUpdate {
            lat: Some(40.0),
            lon: None,
            radius: None,
        };
        let region = msg.to_region();
        let defaults = SearchRegion::default();
        assert_eq!(region.lat, 40.0);
        assert_eq!(region.lon, defaults.lon);
        assert_eq!(region.radius_m, defaults.radius_m);
    }

    #[test]
    fn location_update_clamps_out_of_range_fields() {
        let msg = ClientMessage::LocationUpdate {
            lat: Some(200.0),
            lon: Some(0.0),
            radius: Some(-5.0),
        };
        let region = msg.to_region();
        assert_eq!(region.lat, 90.0);
        assert_eq!(region.radius_m, 0.0);
    }
}
