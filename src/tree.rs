use std::collections::BTreeMap;
use std::fmt::{self, Write};

use crate::xml::escape;

/// One level of the folder hierarchy. The root node is the Document body.
///
/// Children are kept in a `BTreeMap` so serialization visits them in
/// lexicographic order regardless of insertion order. Placemarks keep their
/// insertion order.
#[derive(Debug, Default)]
pub struct FolderNode {
    children: BTreeMap<String, FolderNode>,
    placemarks: Vec<String>,
}

impl FolderNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `placemark` under `path`, creating intermediate folders as
    /// needed. The path ends at the first empty level: a record without a
    /// first-level folder lands at the root whatever its deeper levels say.
    pub fn insert(&mut self, path: &[String], placemark: String) {
        match path.split_first() {
            Some((name, rest)) if !name.is_empty() => self
                .children
                .entry(name.clone())
                .or_default()
                .insert(rest, placemark),
            _ => self.placemarks.push(placemark),
        }
    }

    pub fn child(&self, name: &str) -> Option<&FolderNode> {
        self.children.get(name)
    }

    pub fn placemarks(&self) -> &[String] {
        &self.placemarks
    }

    pub fn is_empty(&self) -> bool {
        self.placemarks.is_empty() && self.children.values().all(|c| c.is_empty())
    }

    /// Own placemarks first, then each non-empty child wrapped in a `<Folder>`.
    pub fn render<W: Write>(&self, out: &mut W) -> fmt::Result {
        for p in &self.placemarks {
            out.write_str(p)?;
        }
        for (name, child) in &self.children {
            let mut content = String::new();
            child.render(&mut content)?;
            if content.is_empty() {
                continue;
            }
            write!(
                out,
                "\n    <Folder>\n      <name>{}</name>{}\n    </Folder>",
                escape(name),
                content
            )?;
        }
        Ok(())
    }
}
