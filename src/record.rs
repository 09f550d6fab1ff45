//! Validation of raw input rows into typed records.
//!
//! Rows arrive as JSON values (decoded from a file or a spreadsheet export).
//! Required keys must be present and non-null; numeric fields accept JSON
//! numbers or numeric strings. String fields are trimmed.

use serde_json::{Map, Value};

use crate::error::RecordError;
use crate::point::Coordinate;

pub const FOLDER_KEYS: [&str; 3] = ["FolderName", "SecondFolderName", "ThirdFolderName"];

/// Row number carried by spreadsheet exports, reported back for routes.
pub const ROW_NUMBER_KEY: &str = "row_number";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Point,
    Segment,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PointRecord {
    pub row: usize,
    pub name: String,
    pub position: Coordinate,
    pub icon: String,
    pub icon_scale: f64,
    pub description: String,
    pub folders: Vec<String>,
}

/// A routed polyline attached to a segment after enrichment.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    pub path: Vec<Coordinate>,
    pub distance_km: Option<f64>,
    pub duration_minutes: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SegmentRecord {
    pub row: usize,
    pub name: String,
    pub start: Coordinate,
    pub end: Coordinate,
    pub color: String,
    pub width: i64,
    pub description: String,
    pub folders: Vec<String>,
    /// `row_number` of the input row, if it had one.
    pub source_row: Option<i64>,
    pub route: Option<Route>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GeoRecord {
    Point(PointRecord),
    Segment(SegmentRecord),
}

impl RecordKind {
    /// Validates one raw row. `index` is the zero-based position in the batch.
    pub fn parse(self, index: usize, raw: &Value) -> Result<GeoRecord, RecordError> {
        match self {
            RecordKind::Point => PointRecord::from_raw(index, raw).map(GeoRecord::Point),
            RecordKind::Segment => SegmentRecord::from_raw(index, raw).map(GeoRecord::Segment),
        }
    }
}

impl PointRecord {
    pub fn from_raw(index: usize, raw: &Value) -> Result<Self, RecordError> {
        let row = Row::new(index, raw)?;
        Ok(PointRecord {
            row: row.number,
            name: row.text("SiteName")?,
            position: Coordinate::new(row.float("Longitude")?, row.float("Latitude")?),
            icon: row.text("Icon")?,
            icon_scale: row.optional_float("IconScale", 1f64)?,
            description: row.optional_text("Description")?,
            folders: row.folders()?,
        })
    }
}

impl SegmentRecord {
    pub fn from_raw(index: usize, raw: &Value) -> Result<Self, RecordError> {
        let row = Row::new(index, raw)?;
        Ok(SegmentRecord {
            row: row.number,
            name: row.text("LineName")?,
            start: Coordinate::new(row.float("Longitude1")?, row.float("Latitude1")?),
            end: Coordinate::new(row.float("Longitude2")?, row.float("Latitude2")?),
            color: row.text("Color")?,
            width: row.integer("Width")?,
            description: row.optional_text("Description")?,
            folders: row.folders()?,
            source_row: row.optional_integer(ROW_NUMBER_KEY)?,
            route: None,
        })
    }

    /// Description with the routed distance and duration appended, if any.
    pub fn full_description(&self) -> String {
        let mut ret = self.description.clone();
        if let Some(route) = &self.route {
            if let Some(km) = route.distance_km {
                ret.push_str(&format!("\nDistance: {:.2} km", km));
            }
            if let Some(min) = route.duration_minutes {
                ret.push_str(&format!("\nEstimated time: {:.0} min", min));
            }
        }
        ret
    }
}

struct Row<'a> {
    number: usize,
    fields: &'a Map<String, Value>,
}

impl<'a> Row<'a> {
    fn new(index: usize, raw: &'a Value) -> Result<Self, RecordError> {
        match raw {
            Value::Object(fields) => Ok(Row {
                number: index + 1,
                fields,
            }),
            other => Err(RecordError::NotAnObject {
                row: index + 1,
                value: other.to_string(),
            }),
        }
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    fn required(&self, field: &'static str) -> Result<&'a Value, RecordError> {
        self.get(field).ok_or(RecordError::MissingField {
            row: self.number,
            field,
        })
    }

    fn invalid(&self, field: &'static str, value: &Value) -> RecordError {
        RecordError::InvalidValue {
            row: self.number,
            field,
            value: value.to_string(),
        }
    }

    fn as_text(&self, field: &'static str, value: &Value) -> Result<String, RecordError> {
        match value {
            Value::String(s) => Ok(s.trim().to_string()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(self.invalid(field, other)),
        }
    }

    fn as_float(&self, field: &'static str, value: &Value) -> Result<f64, RecordError> {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed
            .filter(|v| v.is_finite())
            .ok_or_else(|| self.invalid(field, value))
    }

    fn text(&self, field: &'static str) -> Result<String, RecordError> {
        let value = self.required(field)?;
        self.as_text(field, value)
    }

    fn optional_text(&self, field: &'static str) -> Result<String, RecordError> {
        match self.get(field) {
            Some(value) => self.as_text(field, value),
            None => Ok(String::new()),
        }
    }

    fn float(&self, field: &'static str) -> Result<f64, RecordError> {
        let value = self.required(field)?;
        self.as_float(field, value)
    }

    fn optional_float(&self, field: &'static str, default: f64) -> Result<f64, RecordError> {
        match self.get(field) {
            Some(value) => self.as_float(field, value),
            None => Ok(default),
        }
    }

    fn integer(&self, field: &'static str) -> Result<i64, RecordError> {
        let value = self.required(field)?;
        self.as_integer(field, value)
    }

    fn optional_integer(&self, field: &'static str) -> Result<Option<i64>, RecordError> {
        self.get(field)
            .map(|value| self.as_integer(field, value))
            .transpose()
    }

    /// Integers, floats (truncated toward zero) and integer strings.
    fn as_integer(&self, field: &'static str, value: &Value) -> Result<i64, RecordError> {
        let parsed = match value {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                    .map(|f| f.trunc() as i64)
            }),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| self.invalid(field, value))
    }

    fn folders(&self) -> Result<Vec<String>, RecordError> {
        FOLDER_KEYS
            .iter()
            .map(|key| self.optional_text(*key))
            .collect()
    }
}
