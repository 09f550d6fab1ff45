use crate::point::Coordinate;
use crate::xml::escape;

/// A `<Style>` block and the id placemarks use to refer to it.
///
/// The id is derived from the record itself (name plus truncated anchor
/// coordinate), so the same input always produces the same block and blocks
/// can be deduplicated by value.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StyleDefinition {
    pub id: String,
    pub fragment: String,
}

pub fn style_key(prefix: &str, name: &str, anchor: &Coordinate) -> String {
    let sanitized: String = name
        .chars()
        .filter(|c| *c != '.')
        .map(|c| if c == ' ' { '_' } else { c })
        .collect();
    let (lon, lat) = anchor.millis();
    format!("{}_{}_{}_{}", prefix, sanitized, lon, lat)
}

impl StyleDefinition {
    pub fn for_segment(name: &str, start: &Coordinate, color: &str, width: i64) -> Self {
        let id = style_key("lineStyle", name, start);
        let fragment = format!(
            r#"
    <Style id="{}">
      <LineStyle>
        <color>{}</color>
        <width>{}</width>
      </LineStyle>
    </Style>"#,
            escape(&id),
            escape(color),
            width
        );
        StyleDefinition { id, fragment }
    }

    pub fn for_point(name: &str, position: &Coordinate, icon: &str, scale: f64) -> Self {
        let id = style_key("pointStyle", name, position);
        let fragment = format!(
            r#"
    <Style id="{}">
      <IconStyle>
        <scale>{}</scale>
        <Icon>
          <href>{}</href>
        </Icon>
      </IconStyle>
    </Style>"#,
            escape(&id),
            scale,
            escape(icon)
        );
        StyleDefinition { id, fragment }
    }

    /// `#id`, as written in a placemark's `<styleUrl>`.
    pub fn url(&self) -> String {
        format!("#{}", escape(&self.id))
    }
}
