use crate::point::Coordinate;
use crate::record::{GeoRecord, PointRecord, SegmentRecord};
use crate::style::StyleDefinition;
use crate::xml::escape;

/// Anything that can be placed in the folder tree: it knows its folder
/// levels, its style and how to render itself as a `<Placemark>`.
pub trait Feature {
    fn folders(&self) -> &[String];
    fn style(&self) -> StyleDefinition;
    fn placemark(&self, style: &StyleDefinition) -> String;
}

fn description_line(description: &str) -> String {
    if description.is_empty() {
        String::new()
    } else {
        format!("\n      <description>{}</description>", escape(description))
    }
}

fn coordinates_block(coords: &[Coordinate]) -> String {
    coords
        .iter()
        .map(|c| format!("\n          {}", c.kml()))
        .collect()
}

impl Feature for SegmentRecord {
    fn folders(&self) -> &[String] {
        &self.folders
    }

    fn style(&self) -> StyleDefinition {
        StyleDefinition::for_segment(&self.name, &self.start, &self.color, self.width)
    }

    fn placemark(&self, style: &StyleDefinition) -> String {
        let (coords, altitude) = match &self.route {
            Some(route) if !route.path.is_empty() => (
                route.path.clone(),
                "\n        <altitudeMode>clampToGround</altitudeMode>",
            ),
            _ => (vec![self.start, self.end], ""),
        };
        format!(
            r#"
    <Placemark>
      <name>{}</name>{}
      <styleUrl>{}</styleUrl>
      <LineString>{}
        <coordinates>{}
        </coordinates>
      </LineString>
    </Placemark>"#,
            escape(&self.name),
            description_line(&self.full_description()),
            style.url(),
            altitude,
            coordinates_block(&coords)
        )
    }
}

impl Feature for PointRecord {
    fn folders(&self) -> &[String] {
        &self.folders
    }

    fn style(&self) -> StyleDefinition {
        StyleDefinition::for_point(&self.name, &self.position, &self.icon, self.icon_scale)
    }

    fn placemark(&self, style: &StyleDefinition) -> String {
        format!(
            r#"
    <Placemark>
      <name>{}</name>{}
      <styleUrl>{}</styleUrl>
      <Point>
        <coordinates>{}
        </coordinates>
      </Point>
    </Placemark>"#,
            escape(&self.name),
            description_line(&self.description),
            style.url(),
            coordinates_block(&[self.position])
        )
    }
}

impl Feature for GeoRecord {
    fn folders(&self) -> &[String] {
        match self {
            GeoRecord::Point(p) => p.folders(),
            GeoRecord::Segment(s) => s.folders(),
        }
    }

    fn style(&self) -> StyleDefinition {
        match self {
            GeoRecord::Point(p) => p.style(),
            GeoRecord::Segment(s) => s.style(),
        }
    }

    fn placemark(&self, style: &StyleDefinition) -> String {
        match self {
            GeoRecord::Point(p) => p.placemark(style),
            GeoRecord::Segment(s) => s.placemark(style),
        }
    }
}
