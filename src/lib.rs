//! PLAT - Plan Annotation Tool
//!
//! An annotation engine for architectural plan images: a detection backend
//! proposes rectangles, polygons, and lines with semantic labels, and this
//! crate keeps one coherent annotation model synchronized with a
//! zoomable/pannable vector overlay, a results table, and a per-label
//! summary while areas and lengths are recomputed live from the plan
//! scale and DPI settings.
//!
//! The engine is presentation-agnostic: rendering goes through the
//! [`overlay::RenderBackend`] seam, and an [`session::EditorSession`] owns
//! all state, so hosts (and tests) drive it headlessly.

pub mod annotation;
pub mod catalog;
pub mod constants;
pub mod editor;
pub mod ingest;
pub mod overlay;
pub mod project;
pub mod session;
pub mod sync;
pub mod transform;
pub mod units;

pub use annotation::{Annotation, AnnotationId, AnnotationStore, NewAnnotation, Point, Shape};
pub use catalog::{Label, LabelCatalog, LabelKind};
pub use editor::{Editor, EditorTool, KeyEvent, PointerEvent};
pub use overlay::{OverlayRenderer, RenderBackend, SceneBackend};
pub use session::EditorSession;
pub use transform::{DisplayRect, NaturalSize, ViewTransform};
pub use units::PlanScale;
