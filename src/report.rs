use serde::Serialize;

use crate::record::SegmentRecord;

/// JSON envelope printed on stdout after each run.
#[derive(Debug, Serialize)]
pub struct Report {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kml_file_path: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_routes_info: Option<Vec<RouteInfo>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RouteInfo {
    #[serde(rename = "row_number")]
    pub row_number: i64,
    pub line_name: String,
    pub latitude1: f64,
    pub longitude1: f64,
    pub latitude2: f64,
    pub longitude2: f64,
    pub color: String,
    pub width: i64,
    pub description: String,
    pub folder_name: String,
    pub second_folder_name: String,
    pub third_folder_name: String,
    #[serde(rename = "distance_km")]
    pub distance_km: Option<f64>,
    #[serde(rename = "duration_minutes")]
    pub duration_minutes: Option<f64>,
}

impl From<&SegmentRecord> for RouteInfo {
    fn from(r: &SegmentRecord) -> Self {
        let folder = |i: usize| r.folders.get(i).cloned().unwrap_or_default();
        RouteInfo {
            row_number: r.source_row.unwrap_or(r.row as i64),
            line_name: r.name.clone(),
            latitude1: r.start.lat,
            longitude1: r.start.lon,
            latitude2: r.end.lat,
            longitude2: r.end.lon,
            color: r.color.clone(),
            width: r.width,
            description: r.description.clone(),
            folder_name: folder(0),
            second_folder_name: folder(1),
            third_folder_name: folder(2),
            distance_km: r.route.as_ref().and_then(|x| x.distance_km),
            duration_minutes: r.route.as_ref().and_then(|x| x.duration_minutes),
        }
    }
}

impl Report {
    pub fn success(path: &str, message: String) -> Self {
        Report {
            status: "success",
            kml_file_path: Some(path.to_string()),
            message,
            generated_routes_info: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Report {
            status: "error",
            kml_file_path: None,
            message: message.into(),
            generated_routes_info: None,
        }
    }

    pub fn with_routes(mut self, routes: &[SegmentRecord]) -> Self {
        self.generated_routes_info = Some(routes.iter().map(RouteInfo::from).collect());
        self
    }

    pub fn to_json(&self) -> String {
        // Serializing plain strings and numbers cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Coordinate;
    use crate::record::Route;
    use serde_json::{Value, json};

    #[test]
    fn test_error_report() {
        let v: Value = serde_json::from_str(&Report::error("boom").to_json()).unwrap();
        assert_eq!(v, json!({"status": "error", "message": "boom"}));
    }

    #[test]
    fn test_route_report() {
        let seg = SegmentRecord {
            row: 2,
            name: "L".to_string(),
            start: Coordinate::new(108.5, 15.5),
            end: Coordinate::new(108.25, 15.75),
            color: "ff00ffff".to_string(),
            width: 3,
            description: "d".to_string(),
            folders: vec!["A".to_string(), "B".to_string()],
            source_row: None,
            route: Some(Route {
                path: vec![],
                distance_km: Some(1.25),
                duration_minutes: None,
            }),
        };
        let report = Report::success("/tmp/out.kml", "ok".to_string()).with_routes(&[seg]);
        let v: Value = serde_json::from_str(&report.to_json()).unwrap();
        assert_eq!(v["status"], "success");
        assert_eq!(v["kml_file_path"], "/tmp/out.kml");
        let info = &v["generated_routes_info"][0];
        assert_eq!(info["row_number"], 2);
        assert_eq!(info["LineName"], "L");
        assert_eq!(info["Longitude1"], 108.5);
        assert_eq!(info["SecondFolderName"], "B");
        assert_eq!(info["ThirdFolderName"], "");
        assert_eq!(info["distance_km"], 1.25);
        assert_eq!(info["duration_minutes"], Value::Null);
    }

    #[test]
    fn test_route_report_keeps_input_row_number() {
        let raw = json!({
            "row_number": 7,
            "LineName": "L",
            "Latitude1": 15.5, "Longitude1": 108.5,
            "Latitude2": 15.75, "Longitude2": 108.25,
            "Color": "ff00ffff", "Width": 3,
        });
        let seg = SegmentRecord::from_raw(0, &raw).unwrap();
        let report = Report::success("out.kml", "ok".to_string()).with_routes(&[seg]);
        let v: Value = serde_json::from_str(&report.to_json()).unwrap();
        assert_eq!(v["generated_routes_info"][0]["row_number"], 7);
    }
}
