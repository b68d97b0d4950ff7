//! Label catalog: the lookup table pairing label ids with names and colors.
//!
//! Two independent sets exist, one for area annotations (rectangles and
//! polygons) and one for line measurements. The catalog can change at
//! runtime; consumers look values up at render time instead of caching
//! colors on annotations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which label set an annotation tool draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelKind {
    /// Labels for rectangles and polygons
    Area,
    /// Labels for line measurements
    Line,
}

/// A label definition with display name and RGB color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    /// Unique id within its label set
    pub id: u32,
    /// Display name
    pub name: String,
    /// RGB color
    pub color: [u8; 3],
}

impl Label {
    pub fn new(id: u32, name: &str, color: [u8; 3]) -> Self {
        Self {
            id,
            name: name.to_string(),
            color,
        }
    }

    /// Hex representation, `#RRGGBB`.
    pub fn hex(&self) -> String {
        format!(
            "#{:02X}{:02X}{:02X}",
            self.color[0], self.color[1], self.color[2]
        )
    }
}

/// Default area labels for plan object detection.
pub fn default_area_labels() -> Vec<Label> {
    vec![
        Label::new(1, "Window", [0, 0, 255]),
        Label::new(2, "Door", [255, 0, 0]),
        Label::new(3, "Wall", [212, 214, 56]),
        Label::new(4, "Dormer", [255, 165, 0]),
        Label::new(5, "Roof", [128, 0, 128]),
    ]
}

/// Default line labels for distance measurements.
pub fn default_line_labels() -> Vec<Label> {
    vec![
        Label::new(1, "Distance", [255, 149, 0]),
        Label::new(2, "Height", [0, 170, 255]),
        Label::new(3, "Width", [76, 175, 80]),
        Label::new(4, "Clearance", [156, 39, 176]),
    ]
}

/// Current catalog file format version.
pub const CATALOG_VERSION: u32 = 1;

/// Errors that can occur when loading or saving the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// JSON parsing error
    #[error("failed to parse label catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// Catalog file version is newer than supported
    #[error("catalog file version {file_version} is newer than supported version {supported_version}")]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing the catalog
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The label catalog: area and line label sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelCatalog {
    /// Catalog file format version
    pub version: u32,
    area: Vec<Label>,
    line: Vec<Label>,
}

impl LabelCatalog {
    /// Catalog with the built-in default label sets.
    pub fn new() -> Self {
        Self {
            version: CATALOG_VERSION,
            area: default_area_labels(),
            line: default_line_labels(),
        }
    }

    /// Look up a label by id within a set.
    pub fn get(&self, kind: LabelKind, id: u32) -> Option<&Label> {
        self.set(kind).iter().find(|l| l.id == id)
    }

    /// All labels of a set, e.g. to fill the label dropdown for a tool.
    pub fn labels(&self, kind: LabelKind) -> &[Label] {
        self.set(kind)
    }

    fn set(&self, kind: LabelKind) -> &[Label] {
        match kind {
            LabelKind::Area => &self.area,
            LabelKind::Line => &self.line,
        }
    }

    fn set_mut(&mut self, kind: LabelKind) -> &mut Vec<Label> {
        match kind {
            LabelKind::Area => &mut self.area,
            LabelKind::Line => &mut self.line,
        }
    }

    /// Add or overwrite a label definition.
    pub fn upsert(&mut self, kind: LabelKind, label: Label) {
        let set = self.set_mut(kind);
        match set.iter_mut().find(|l| l.id == label.id) {
            Some(existing) => *existing = label,
            None => set.push(label),
        }
    }

    /// Remove a label definition. Annotations referencing it fall back to
    /// the unknown-label rendering.
    pub fn remove(&mut self, kind: LabelKind, id: u32) -> Option<Label> {
        let set = self.set_mut(kind);
        let index = set.iter().position(|l| l.id == id)?;
        Some(set.remove(index))
    }

    /// Restore the built-in defaults for one set.
    pub fn reset(&mut self, kind: LabelKind) {
        *self.set_mut(kind) = match kind {
            LabelKind::Area => default_area_labels(),
            LabelKind::Line => default_line_labels(),
        };
    }

    /// Serialize the catalog to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a catalog, rejecting files from a newer version.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        if catalog.version > CATALOG_VERSION {
            return Err(CatalogError::VersionTooNew {
                file_version: catalog.version,
                supported_version: CATALOG_VERSION,
            });
        }
        Ok(catalog)
    }

    /// Default catalog file path under the user config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("plat").join("labels.json"))
    }

    /// Load the catalog from the default path, falling back to the built-in
    /// defaults when the file is missing or unreadable.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::new();
        };
        if !path.exists() {
            log::debug!("no label catalog at {:?}, using defaults", path);
            return Self::new();
        }
        match std::fs::read_to_string(&path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(catalog) => {
                    log::info!("loaded label catalog from {:?}", path);
                    catalog
                }
                Err(e) => {
                    log::warn!("failed to parse label catalog {:?}: {}", path, e);
                    Self::new()
                }
            },
            Err(e) => {
                log::warn!("failed to read label catalog {:?}: {}", path, e);
                Self::new()
            }
        }
    }

    /// Save the catalog to the default path.
    pub fn save(&self) -> Result<(), CatalogError> {
        let path = Self::default_path().ok_or_else(|| {
            CatalogError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not determine config directory",
            ))
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, self.to_json()?)?;
        log::info!("saved label catalog to {:?}", path);
        Ok(())
    }
}

impl Default for LabelCatalog {
    fn default() -> Self {
        Self::new()
    }
}
