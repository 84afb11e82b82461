use std::f64::consts::PI;

use geom::LonLat;
use serde::Serialize;

/// Camera transitions between areas take this long
pub const TRANSITION_DURATION_MS: u64 = 1500;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MapArea {
    KielCanal,
    Gothenburg,
    OresundBridge,
    BigPicture,
}

/// Where the camera collaborator should look.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ViewState {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
    pub transition_duration_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LandmarkKind {
    Port,
    Siding,
    Chokepoint,
    Anchorage,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct Landmark {
    pub kind: LandmarkKind,
    pub area: MapArea,
    pub pos: LonLat,
}

impl MapArea {
    pub fn all() -> Vec<MapArea> {
        vec![
            MapArea::KielCanal,
            MapArea::Gothenburg,
            MapArea::OresundBridge,
            MapArea::BigPicture,
        ]
    }

    pub fn describe(self) -> &'static str {
        match self {
            MapArea::KielCanal => "Kiel Canal",
            MapArea::Gothenburg => "Gothenburg",
            MapArea::OresundBridge => "Øresund Bridge",
            MapArea::BigPicture => "Big Picture",
        }
    }

    pub fn view_state(self) -> ViewState {
        // (lon, lat, zoom, pitch, bearing)
        let (longitude, latitude, zoom, pitch, bearing) = match self {
            MapArea::KielCanal => (10.14, 54.36, 14.0, 65.0, 305.0),
            MapArea::Gothenburg => (11.89784, 57.68952, 14.0, 0.0, 10.0),
            MapArea::OresundBridge => (12.709792274982476, 55.58522588826057, 12.3, 45.0, 45.0),
            // Denmark
            MapArea::BigPicture => (11.6, 54.8, 6.3, 45.0, 0.0),
        };
        ViewState {
            longitude,
            latitude,
            zoom,
            pitch,
            bearing,
            transition_duration_ms: TRANSITION_DURATION_MS,
        }
    }

    pub fn landmarks(self) -> Vec<Landmark> {
        all_landmarks()
            .into_iter()
            .filter(|l| l.area == self)
            .collect()
    }
}

pub fn all_landmarks() -> Vec<Landmark> {
    use LandmarkKind::*;
    use MapArea::*;

    [
        (Port, KielCanal, 10.142784858026934, 54.36536292616125),
        (Siding, KielCanal, 9.96805166608117, 54.34257026618389),
        (Chokepoint, KielCanal, 9.143597043533795, 53.890889415129394),
        (Chokepoint, KielCanal, 10.150910099075718, 54.36620986714592),
        (Anchorage, KielCanal, 9.14882419988216, 53.898910839579436),
        (Anchorage, KielCanal, 9.168794250443037, 53.9093229116306),
        (Port, Gothenburg, 11.657620083882591, 57.708400305959266),
        (Port, Gothenburg, 11.791683209004113, 57.569842104505994),
        (Port, Gothenburg, 11.784074741832148, 57.6483012834392),
        (Port, Gothenburg, 11.952729097479901, 57.7133852995767),
        (Chokepoint, Gothenburg, 11.905974916672836, 57.69255637816086),
        (Anchorage, Gothenburg, 11.871881349477192, 57.689938904374195),
    ]
    .into_iter()
    .map(|(kind, area, lon, lat)| Landmark {
        kind,
        area,
        pos: LonLat::new(lon, lat),
    })
    .collect()
}

/// Sinusoidal ease-in-out over `[0, 1]`, used for camera transitions.
pub fn ease_in_out(x: f64) -> f64 {
    -((PI * x.clamp(0.0, 1.0)).cos() - 1.0) / 2.0
}
