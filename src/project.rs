//! Project persistence: versioned JSON save/load of the annotation state.
//!
//! A project file carries the full serialization of the annotation store
//! (geometry, label, measurement, score, provenance) plus the scale
//! settings and a snapshot of the label catalog. Loading feeds the rows
//! back wholesale through `replace_all`; measurements are recomputed from
//! geometry on the way in, so a file with stale values can never poison
//! the store.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::annotation::{Annotation, AnnotationStore, Measurement, NewAnnotation, Shape, Source};
use crate::catalog::LabelCatalog;
use crate::units::PlanScale;

/// Current project file format version.
pub const PROJECT_VERSION: u32 = 1;

/// Errors that can occur during project save/load.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Project file version is newer than supported
    #[error("project file version {file_version} is newer than supported version {supported_version}")]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },
}

/// Source image reference stored with a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub path: String,
    pub width: u32,
    pub height: u32,
}

/// One persisted annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationEntry {
    pub shape: Shape,
    pub label: u32,
    pub score: f32,
    pub source: Source,
    /// Stored for external consumers; recomputed from geometry on load
    pub measurement: Measurement,
}

impl From<&Annotation> for AnnotationEntry {
    fn from(ann: &Annotation) -> Self {
        Self {
            shape: ann.shape.clone(),
            label: ann.label_id,
            score: ann.score,
            source: ann.source,
            measurement: ann.measurement,
        }
    }
}

/// Complete project data for save/load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    /// Format version for compatibility checking
    pub version: u32,
    /// Scale settings the measurements were computed under
    pub scale: PlanScale,
    /// Source image reference, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageInfo>,
    /// Label catalog snapshot
    pub labels: LabelCatalog,
    /// Annotations in display order
    pub annotations: Vec<AnnotationEntry>,
}

impl ProjectData {
    /// Capture the current session state into a project.
    pub fn capture(
        store: &AnnotationStore,
        scale: PlanScale,
        catalog: &LabelCatalog,
        image: Option<ImageInfo>,
    ) -> Self {
        Self {
            version: PROJECT_VERSION,
            scale,
            image,
            labels: catalog.clone(),
            annotations: store.iter().map(AnnotationEntry::from).collect(),
        }
    }

    /// Convert the persisted annotations back into store rows.
    pub fn rows(&self) -> Vec<NewAnnotation> {
        self.annotations
            .iter()
            .map(|entry| NewAnnotation {
                shape: entry.shape.clone(),
                label_id: entry.label,
                score: entry.score,
                source: entry.source,
            })
            .collect()
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize, rejecting files from a newer format version.
    pub fn from_json(json: &str) -> Result<Self, ProjectError> {
        let data: Self = serde_json::from_str(json)?;
        if data.version > PROJECT_VERSION {
            return Err(ProjectError::VersionTooNew {
                file_version: data.version,
                supported_version: PROJECT_VERSION,
            });
        }
        Ok(data)
    }

    /// Write the project to a file.
    pub fn save(&self, path: &Path) -> Result<(), ProjectError> {
        std::fs::write(path, self.to_json()?)?;
        log::info!(
            "saved project with {} annotations to {:?}",
            self.annotations.len(),
            path
        );
        Ok(())
    }

    /// Read a project from a file.
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let json = std::fs::read_to_string(path)?;
        let data = Self::from_json(&json)?;
        log::info!(
            "loaded project with {} annotations from {:?}",
            data.annotations.len(),
            path
        );
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Point, Rect};

    fn sample_store(scale: &PlanScale) -> AnnotationStore {
        let mut store = AnnotationStore::new();
        let _ = store.insert(
            NewAnnotation {
                shape: Shape::Rectangle(Rect::from_corners(
                    Point::new(0.0, 0.0),
                    Point::new(100.0, 50.0),
                )),
                label_id: 1,
                score: 0.92,
                source: Source::Detected,
            },
            scale,
        );
        let _ = store.insert(
            NewAnnotation::user(
                Shape::Line(vec![Point::new(0.0, 0.0), Point::new(200.0, 0.0)]),
                2,
            ),
            scale,
        );
        store
    }

    #[test]
    fn test_capture_preserves_rows_in_order() {
        let scale = PlanScale::default();
        let store = sample_store(&scale);
        let data = ProjectData::capture(&store, scale, &LabelCatalog::new(), None);

        assert_eq!(data.version, PROJECT_VERSION);
        assert_eq!(data.annotations.len(), 2);
        assert!(matches!(data.annotations[0].shape, Shape::Rectangle(_)));
        assert_eq!(data.annotations[0].score, 0.92);
        assert_eq!(data.annotations[1].source, Source::UserAdded);
    }

    #[test]
    fn test_json_round_trip() {
        let scale = PlanScale::new(300.0, 50.0).unwrap();
        let store = sample_store(&scale);
        let data = ProjectData::capture(
            &store,
            scale,
            &LabelCatalog::new(),
            Some(ImageInfo {
                path: "plans/floor1.png".to_string(),
                width: 2480,
                height: 3508,
            }),
        );

        let json = data.to_json().unwrap();
        let back = ProjectData::from_json(&json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_file_round_trip_through_store() {
        let scale = PlanScale::default();
        let store = sample_store(&scale);
        let data = ProjectData::capture(&store, scale, &LabelCatalog::new(), None);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.plat.json");
        data.save(&path).unwrap();

        let loaded = ProjectData::load(&path).unwrap();
        let mut restored = AnnotationStore::new();
        restored.replace_all(loaded.rows(), &loaded.scale);

        assert_eq!(restored.len(), store.len());
        let originals: Vec<Shape> = store.iter().map(|a| a.shape.clone()).collect();
        let reloaded: Vec<Shape> = restored.iter().map(|a| a.shape.clone()).collect();
        assert_eq!(originals, reloaded);
    }

    #[test]
    fn test_load_recomputes_stale_measurements() {
        // A tampered file with a wrong measurement value cannot poison the
        // store: replace_all recomputes from geometry
        let scale = PlanScale::new(300.0, 100.0).unwrap();
        let ppm = scale.pixels_per_meter();
        let mut data = ProjectData::capture(
            &{
                let mut store = AnnotationStore::new();
                let _ = store.insert(
                    NewAnnotation::user(
                        Shape::Rectangle(Rect::from_corners(
                            Point::new(0.0, 0.0),
                            Point::new(ppm, ppm),
                        )),
                        1,
                    ),
                    &scale,
                );
                store
            },
            scale,
            &LabelCatalog::new(),
            None,
        );
        data.annotations[0].measurement = Measurement::Area(999.0);

        let mut store = AnnotationStore::new();
        store.replace_all(data.rows(), &data.scale);
        let value = store.iter().next().unwrap().measurement.value();
        assert!((value - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_newer_version_rejected() {
        let json = format!(
            r#"{{"version":{},"scale":{{"dpi":300.0,"plan_scale":100.0}},"labels":{{"version":1,"area":[],"line":[]}},"annotations":[]}}"#,
            PROJECT_VERSION + 1
        );
        assert!(matches!(
            ProjectData::from_json(&json),
            Err(ProjectError::VersionTooNew { .. })
        ));
    }

    #[test]
    fn test_invalid_scale_in_file_rejected() {
        let json = r#"{"version":1,"scale":{"dpi":0.0,"plan_scale":100.0},"labels":{"version":1,"area":[],"line":[]},"annotations":[]}"#;
        assert!(matches!(
            ProjectData::from_json(json),
            Err(ProjectError::Json(_))
        ));
    }
}
