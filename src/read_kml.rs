use kml::Kml;

use crate::error::InspectError;

/// Shape of a parsed KML folder tree: placemark names in document order and
/// nested folders in document order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FolderSummary {
    pub placemarks: Vec<String>,
    pub folders: Vec<FolderSummary>,
}

impl FolderSummary {
    pub fn total_placemarks(&self) -> usize {
        self.placemarks.len()
            + self
                .folders
                .iter()
                .map(|f| f.total_placemarks())
                .sum::<usize>()
    }

    pub fn total_folders(&self) -> usize {
        self.folders.len()
            + self
                .folders
                .iter()
                .map(|f| f.total_folders())
                .sum::<usize>()
    }

    /// Follows folder positions from the top, e.g. `&[0, 1]` is the second
    /// subfolder of the first folder.
    pub fn at(&self, positions: &[usize]) -> Option<&FolderSummary> {
        positions
            .iter()
            .try_fold(self, |node, i| node.folders.get(*i))
    }
}

fn collect(elements: &[Kml], into: &mut FolderSummary) {
    for element in elements {
        match element {
            Kml::KmlDocument(doc) => collect(&doc.elements, into),
            Kml::Document { elements, .. } => collect(elements, into),
            Kml::Folder(z) => {
                let mut folder = FolderSummary::default();
                collect(&z.elements, &mut folder);
                into.folders.push(folder);
            }
            Kml::Placemark(p) => into
                .placemarks
                .push(p.name.clone().unwrap_or_default()),
            _ => {}
        }
    }
}

/// Parses KML text and summarizes the folder tree under its Document.
pub fn summarize(content: &str) -> Result<FolderSummary, InspectError> {
    let kml: Kml = content.parse()?;
    let has_document = match &kml {
        Kml::KmlDocument(doc) => doc
            .elements
            .iter()
            .any(|e| matches!(e, Kml::Document { .. })),
        Kml::Document { .. } => true,
        _ => false,
    };
    if !has_document {
        return Err(InspectError::NoDocument);
    }
    let mut summary = FolderSummary::default();
    collect(std::slice::from_ref(&kml), &mut summary);
    log::trace!(
        "kml: {} folders, {} placemarks",
        summary.total_folders(),
        summary.total_placemarks()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <name>doc</name>
    <Placemark><name>root</name><Point><coordinates>1,2,0</coordinates></Point></Placemark>
    <Folder>
      <name>A</name>
      <Placemark><name>a1</name><Point><coordinates>1,2,0</coordinates></Point></Placemark>
      <Folder>
        <name>B</name>
        <Placemark><name>b1</name><Point><coordinates>1,2,0</coordinates></Point></Placemark>
      </Folder>
    </Folder>
  </Document>
</kml>
"#;

    #[test]
    fn test_summarize() {
        let s = summarize(SAMPLE).unwrap();
        assert_eq!(s.placemarks, ["root"]);
        assert_eq!(s.total_placemarks(), 3);
        assert_eq!(s.total_folders(), 2);
        assert_eq!(s.at(&[0]).unwrap().placemarks, ["a1"]);
        assert_eq!(s.at(&[0, 0]).unwrap().placemarks, ["b1"]);
        assert!(s.at(&[1]).is_none());
    }

    #[test]
    fn test_missing_document() {
        assert!(summarize(r#"<kml xmlns="http://www.opengis.net/kml/2.2"></kml>"#).is_err());
    }
}
