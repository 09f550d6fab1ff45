use kml_folders::document::{self, KmlBuilder};
use kml_folders::error::{BuildError, RecordError, RoutingError};
use kml_folders::point::Coordinate;
use kml_folders::read_kml::summarize;
use kml_folders::record::{RecordKind, Route, SegmentRecord};
use kml_folders::report::Report;
use kml_folders::routing::{self, RateLimiter, RouteResolver};
use kml_folders::{convert, input};
use serde_json::{Value, json};

fn fixture(name: &str) -> Vec<Value> {
    let path = format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name);
    input::load_records(&path).unwrap()
}

fn folder_names(kml: &str) -> Vec<&str> {
    kml.split("<Folder>\n      <name>")
        .skip(1)
        .map(|s| &s[..s.find("</name>").unwrap()])
        .collect()
}

#[test]
fn test_lines_fixture() {
    let rows = fixture("lines.json");
    assert_eq!(rows.len(), 12);
    let c = convert(RecordKind::Segment, &rows, &KmlBuilder::new("Tuyến"));
    assert_eq!(c.accepted, 10);
    assert_eq!(
        c.rejected,
        vec![
            RecordError::MissingField {
                row: 11,
                field: "Color"
            },
            RecordError::InvalidValue {
                row: 12,
                field: "Width",
                value: "\"abc\"".to_string()
            },
        ]
    );
    let kml = c.kml.unwrap();
    assert_eq!(kml.matches("<Style id=").count(), 10);

    let s = summarize(&kml).unwrap();
    assert_eq!(s.total_placemarks(), 10);
    assert_eq!(s.total_folders(), 10);
    // empty FolderName with a SecondFolderName still lands at the root
    assert_eq!(s.placemarks, ["Ngoài thư mục"]);
    assert_eq!(s.folders.len(), 2);
    assert_eq!(
        s.at(&[0, 0, 0]).unwrap().placemarks,
        ["TTCMKV Điện Bàn - An Thắng", "An Thắng - Điện Bàn Đông"]
    );
    assert_eq!(s.at(&[0, 1, 0]).unwrap().placemarks.len(), 3);
    assert_eq!(s.at(&[1, 1, 0]).unwrap().placemarks.len(), 2);
    assert!(!kml.contains("<name>X</name>"));
    assert_eq!(
        folder_names(&kml),
        [
            "Quảng Nam 1",
            "Quảng Nam - Ring 1",
            "Nhóm A",
            "Quảng Nam - Ring 11",
            "Nhóm B",
            "Quảng Nam 2",
            "Quảng Nam - Ring 2",
            "Nhóm C",
            "Quảng Nam - Ring 22",
            "Nhóm D",
        ]
    );
}

#[test]
fn test_output_is_deterministic() {
    let rows = fixture("lines.json");
    let builder = KmlBuilder::new("d");
    let first = convert(RecordKind::Segment, &rows, &builder).kml.unwrap();
    let second = convert(RecordKind::Segment, &rows, &builder).kml.unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_folder_order_ignores_input_order() {
    let rows = fixture("lines.json");
    let mut reversed = rows.clone();
    reversed.reverse();
    let builder = KmlBuilder::new("d");
    let a = convert(RecordKind::Segment, &rows, &builder).kml.unwrap();
    let b = convert(RecordKind::Segment, &reversed, &builder).kml.unwrap();
    assert_eq!(folder_names(&a), folder_names(&b));

    // with one placemark per leaf the whole document is identical
    let singles: Vec<Value> = ["c", "a", "b"]
        .iter()
        .map(|f| {
            json!({
                "SiteName": f, "Latitude": 1.5, "Longitude": 2.5,
                "Icon": "i.png", "FolderName": f,
            })
        })
        .collect();
    let mut reversed = singles.clone();
    reversed.reverse();
    assert_eq!(
        convert(RecordKind::Point, &singles, &builder).kml.unwrap(),
        convert(RecordKind::Point, &reversed, &builder).kml.unwrap()
    );
}

#[test]
fn test_sites_fixture() {
    let rows = fixture("sites.json");
    let c = convert(RecordKind::Point, &rows, &KmlBuilder::new("Trạm"));
    assert_eq!(c.accepted, 3);
    assert!(matches!(
        c.rejected[..],
        [RecordError::MissingField { row: 4, .. }]
    ));
    let kml = c.kml.unwrap();
    assert!(kml.contains("<scale>1.2</scale>"));
    assert!(kml.contains("<scale>1</scale>"));
    let s = summarize(&kml).unwrap();
    assert_eq!(s.placemarks, ["Đà Nẵng"]);
    assert_eq!(s.at(&[0, 0, 0]).unwrap().placemarks, ["Hội An"]);
    assert_eq!(s.at(&[0, 1]).unwrap().placemarks, ["TTCMKV Điện Bàn"]);
    assert_eq!(folder_names(&kml), ["Quảng Nam", "Hội An", "Trạm", "Điện Bàn"]);
}

#[test]
fn test_markup_in_text_stays_well_formed() {
    let rows = vec![json!({
        "LineName": "A & B <x>",
        "Latitude1": 1.0, "Longitude1": 2.0, "Latitude2": 1.5, "Longitude2": 2.5,
        "Color": "ff00ffff", "Width": 2,
        "Description": "\"quoted\" & <b>bold</b>",
        "FolderName": "R&D",
    })];
    let kml = convert(RecordKind::Segment, &rows, &KmlBuilder::new("a<b"))
        .kml
        .unwrap();
    let s = summarize(&kml).unwrap();
    assert_eq!(s.total_placemarks(), 1);
    assert_eq!(s.total_folders(), 1);
    assert!(kml.contains("<name>R&amp;D</name>"));
}

#[test]
fn test_all_invalid_is_no_valid_data() {
    let rows = vec![json!({"LineName": "x"}), json!("row"), Value::Null];
    let c = convert(RecordKind::Segment, &rows, &KmlBuilder::new("d"));
    assert!(matches!(c.kml, Err(BuildError::NoValidData)));
    assert_eq!(c.rejected.len(), 3);
}

struct StraightLine;

impl RouteResolver for StraightLine {
    fn resolve(&mut self, start: &Coordinate, end: &Coordinate) -> Result<Route, RoutingError> {
        let mid = Coordinate::new((start.lon + end.lon) / 2f64, (start.lat + end.lat) / 2f64);
        let path = vec![*start, mid, *end];
        Ok(Route {
            distance_km: Some(routing::path_length_km(&path)),
            duration_minutes: Some(10f64),
            path,
        })
    }
}

#[test]
fn test_routes_under_main_folder() {
    let rows = fixture("lines.json");
    let (segments, rejected): (Vec<SegmentRecord>, _) =
        document::validate(&rows, SegmentRecord::from_raw);
    assert_eq!(rejected.len(), 2);
    let routed = routing::enrich(
        segments,
        &mut StraightLine,
        &mut RateLimiter::per_minute(0),
    );
    assert_eq!(routed.len(), 10);
    let kml = KmlBuilder::new("Routes")
        .root_folder("Các Tuyến Đường")
        .build(&routed)
        .unwrap();
    let s = summarize(&kml).unwrap();
    assert!(s.placemarks.is_empty());
    assert_eq!(s.folders.len(), 1);
    assert_eq!(s.at(&[0]).unwrap().placemarks, ["Ngoài thư mục"]);
    assert_eq!(s.total_placemarks(), 10);
    assert_eq!(kml.matches("<altitudeMode>clampToGround</altitudeMode>").count(), 10);
    assert!(kml.contains("Estimated time: 10 min"));

    // spreadsheet rows start at 2, below the header
    let report = Report::success("routes.kml", "ok".to_string()).with_routes(&routed);
    let numbers: Vec<i64> = report
        .generated_routes_info
        .unwrap()
        .iter()
        .map(|r| r.row_number)
        .collect();
    assert_eq!(numbers, (2..=11).collect::<Vec<i64>>());
}
