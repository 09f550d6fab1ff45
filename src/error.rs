/// Why a single input row was skipped. Rows are numbered from 1, like the
/// spreadsheet they usually come from.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("row {row}: missing required field '{field}'")]
    MissingField { row: usize, field: &'static str },

    #[error("row {row}: invalid value {value} for field '{field}'")]
    InvalidValue {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("row {row}: expected an object, got {value}")]
    NotAnObject { row: usize, value: String },
}

impl RecordError {
    pub fn row(&self) -> usize {
        match self {
            RecordError::MissingField { row, .. }
            | RecordError::InvalidValue { row, .. }
            | RecordError::NotAnObject { row, .. } => *row,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no valid data to build a KML document")]
    NoValidData,

    #[error("failed to assemble KML: {0}")]
    Serialization(#[from] std::fmt::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("JSON parse error in '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("unexpected JSON structure: expected an array, or an array whose first object has 'rawData'")]
    Shape,
}

#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by the routing service")]
    RateLimited,

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("no route found between {start} and {end}")]
    NoRoute { start: String, end: String },
}

#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    #[error("KML parse error: {0}")]
    Parse(#[from] kml::Error),

    #[error("no Document element in KML")]
    NoDocument,
}
