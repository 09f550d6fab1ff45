pub mod document;
pub mod error;
pub mod input;
pub mod placemark;
pub mod point;
pub mod read_kml;
pub mod record;
pub mod report;
pub mod routing;
pub mod style;
pub mod tree;
pub mod xml;

pub use document::{Conversion, KmlBuilder, convert};
pub use error::{BuildError, InputError, InspectError, RecordError, RoutingError};
pub use placemark::Feature;
pub use record::{GeoRecord, PointRecord, RecordKind, SegmentRecord};
pub use tree::FolderNode;
