//! Assembly of the final KML document.
//!
//! [`KmlBuilder::build`] takes validated features, collects their styles
//! into a sorted set (which also deduplicates them), grows one
//! [`FolderNode`] tree from their folder paths and writes both into the
//! fixed `<kml><Document>` envelope. [`convert`] runs validation first and
//! keeps the per-row rejections as diagnostics.

use std::collections::BTreeSet;
use std::fmt::Write;

use serde_json::Value;

use crate::error::{BuildError, RecordError};
use crate::placemark::Feature;
use crate::record::{GeoRecord, RecordKind};
use crate::tree::FolderNode;
use crate::xml::escape;

pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

#[derive(Clone, Debug)]
pub struct KmlBuilder {
    document_name: String,
    root_folder: Option<String>,
}

impl KmlBuilder {
    pub fn new(document_name: impl Into<String>) -> Self {
        Self {
            document_name: document_name.into(),
            root_folder: None,
        }
    }

    /// Wraps every folder and placemark in one top-level folder.
    pub fn root_folder(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        let name = name.trim();
        self.root_folder = if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        };
        self
    }

    pub fn build<F: Feature>(&self, features: &[F]) -> Result<String, BuildError> {
        if features.is_empty() {
            return Err(BuildError::NoValidData);
        }

        let mut styles = BTreeSet::new();
        let mut root = FolderNode::new();
        for feature in features {
            let style = feature.style();
            let placemark = feature.placemark(&style);
            match &self.root_folder {
                Some(main) => {
                    let mut path = vec![main.clone()];
                    path.extend(feature.folders().iter().cloned());
                    root.insert(&path, placemark);
                }
                None => root.insert(feature.folders(), placemark),
            }
            styles.insert(style.fragment);
        }
        log::trace!(
            "kml: {} features, {} unique styles",
            features.len(),
            styles.len()
        );

        let mut doc = String::new();
        writeln!(doc, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(doc, r#"<kml xmlns="{}">"#, KML_NAMESPACE)?;
        writeln!(doc, "  <Document>")?;
        write!(doc, "    <name>{}</name>", escape(&self.document_name))?;
        for fragment in &styles {
            doc.push_str(fragment);
        }
        root.render(&mut doc)?;
        writeln!(doc)?;
        writeln!(doc, "  </Document>")?;
        writeln!(doc, "</kml>")?;
        Ok(doc)
    }
}

/// Result of validating and building one batch.
#[derive(Debug)]
pub struct Conversion {
    pub kml: Result<String, BuildError>,
    pub accepted: usize,
    pub rejected: Vec<RecordError>,
}

/// Runs `parse` over every row, keeping the rows that pass and the reasons
/// the others were skipped.
pub fn validate<T, P>(raw: &[Value], parse: P) -> (Vec<T>, Vec<RecordError>)
where
    P: Fn(usize, &Value) -> Result<T, RecordError>,
{
    let mut records = Vec::new();
    let mut rejected = Vec::new();
    for (i, item) in raw.iter().enumerate() {
        match parse(i, item) {
            Ok(record) => records.push(record),
            Err(e) => {
                log::warn!("skipping {}", e);
                rejected.push(e);
            }
        }
    }
    (records, rejected)
}

pub fn convert(kind: RecordKind, raw: &[Value], builder: &KmlBuilder) -> Conversion {
    let (records, rejected): (Vec<GeoRecord>, _) = validate(raw, |i, v| kind.parse(i, v));
    log::info!(
        "validated {} rows: {} accepted, {} rejected",
        raw.len(),
        records.len(),
        rejected.len()
    );
    Conversion {
        kml: builder.build(&records),
        accepted: records.len(),
        rejected,
    }
}
