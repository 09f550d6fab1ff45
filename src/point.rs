use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Absolute value of the coordinate scaled by 1000 and truncated toward
    /// zero, as (lon, lat). Used to make style ids traceable to a location.
    pub fn millis(&self) -> (u64, u64) {
        (truncated_millis(self.lon), truncated_millis(self.lat))
    }

    /// `lon,lat,0` as written inside a KML `<coordinates>` element.
    pub fn kml(&self) -> String {
        format!("{},{},0", self.lon, self.lat)
    }
}

fn truncated_millis(v: f64) -> u64 {
    // `as` saturates, so NaN maps to 0 and huge values clamp.
    ((v * 1000f64).trunc() as i64).unsigned_abs()
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wgs(lon: {:.5}, lat: {:.5})", self.lon, self.lat)
    }
}

impl From<Coordinate> for geo::Point<f64> {
    fn from(c: Coordinate) -> Self {
        geo::Point::new(c.lon, c.lat)
    }
}
