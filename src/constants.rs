//! Shared constants for interaction thresholds, overlay styling, and scale
//! defaults.
//!
//! This module centralizes all hardcoded values so that the editor, the
//! overlay renderer, and the session agree on them.

/// Zoom constants.
pub mod zoom {
    /// Zoom increment/decrement factor
    pub const FACTOR: f32 = 1.2;
    /// Maximum zoom level
    pub const MAX: f32 = 5.0;
    /// Minimum zoom level
    pub const MIN: f32 = 0.1;
}

/// Interaction threshold constants. All values are view-space pixels,
/// since that is what the user perceives.
pub mod threshold {
    /// Minimum rectangle edge length for a drawn rectangle to be kept
    pub const MIN_RECT_SIZE: f32 = 10.0;
    /// Distance to the first vertex that closes an in-progress polygon
    pub const POLYGON_CLOSE: f32 = 15.0;
    /// Hit radius for picking polylines and vertex handles
    pub const HIT_TOLERANCE: f32 = 6.0;
    /// Hit radius for grabbing a resize handle
    pub const HANDLE_SIZE: f32 = 8.0;
    /// Epsilon for float comparison in tests and change detection
    pub const FLOAT_EPSILON: f32 = 0.001;
}

/// Overlay styling constants.
pub mod style {
    /// Fill opacity of an annotation body
    pub const FILL_OPACITY: f32 = 0.2;
    /// Fill opacity while hovered/selected
    pub const FILL_OPACITY_HIGHLIGHT: f32 = 0.5;
    /// Stroke width of an annotation body
    pub const STROKE_WIDTH: f32 = 2.0;
    /// Stroke width while hovered/selected
    pub const STROKE_WIDTH_HIGHLIGHT: f32 = 3.0;
    /// Radius of the marker circle on each line vertex
    pub const VERTEX_MARKER_RADIUS: f32 = 4.0;
    /// Vertical offset lifting a text label above its shape
    pub const LABEL_OFFSET_Y: f32 = 20.0;
    /// Horizontal offset of a line label past the last vertex
    pub const LINE_LABEL_OFFSET_X: f32 = 5.0;
    /// Vertical offset of a line label above the last vertex
    pub const LINE_LABEL_OFFSET_Y: f32 = 5.0;
    /// Label opacity at rest
    pub const LABEL_OPACITY: f32 = 0.8;
    /// Fallback color for annotations whose label id is unknown
    pub const FALLBACK_COLOR: [u8; 3] = [128, 128, 128];
}

/// Scale and detection defaults, matching the backend's defaults.
pub mod defaults {
    /// Default scan resolution in dots per inch
    pub const DPI: f32 = 300.0;
    /// Default architectural plan scale denominator (1:100)
    pub const PLAN_SCALE: f32 = 100.0;
    /// Default detection score threshold
    pub const SCORE_THRESHOLD: f32 = 0.5;
    /// Default page format width in mm (A4 portrait)
    pub const FORMAT_WIDTH_MM: f32 = 210.0;
    /// Default page format height in mm (A4 portrait)
    pub const FORMAT_HEIGHT_MM: f32 = 297.0;
}

/// Coordinate transform constants.
pub mod transform {
    /// Floor for the effective view scale, so annotations never collapse
    /// into invisible artifacts at extreme zoom-out
    pub const MIN_VIEW_SCALE: f32 = 0.05;
    /// Relative difference between the x and y view scales above which an
    /// aspect-ratio mismatch is reported
    pub const ASPECT_WARN_RATIO: f32 = 0.001;
}
