//! Annotation data model and store.
//!
//! This module provides the core types for plan annotations:
//! - Geometry types (points, rectangles) in natural image coordinates
//! - The tagged [`Shape`] union (rectangle, polygon, line)
//! - [`Annotation`] records with label, derived measurement, and provenance
//! - The ordered [`AnnotationStore`], the single source of truth every view
//!   element is a projection of

use serde::{Deserialize, Serialize};

use crate::catalog::LabelKind;
use crate::units::PlanScale;

/// Unique identifier for an annotation. Stable across deletes, unlike the
/// display index.
pub type AnnotationId = u64;

/// Minimum number of vertices for a closeable polygon.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Minimum number of vertices for a completable line.
pub const MIN_LINE_VERTICES: usize = 2;

// ============================================================================
// Core Geometry Types
// ============================================================================

/// A 2D point in natural image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point.
    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// An axis-aligned rectangle stored as two corners with `x2 > x1` and
/// `y2 > y1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Rect {
    /// Create a normalized rectangle from two arbitrary corner points.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x1: a.x.min(b.x),
            y1: a.y.min(b.y),
            x2: a.x.max(b.x),
            y2: a.y.max(b.y),
        }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Check if a point is inside the rectangle.
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x1 && point.x <= self.x2 && point.y >= self.y1 && point.y <= self.y2
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self {
            x1: self.x1 + dx,
            y1: self.y1 + dy,
            x2: self.x2 + dx,
            y2: self.y2 + dy,
        }
    }
}

/// Distance from a point to a line segment.
fn segment_distance(p: &Point, a: &Point, b: &Point) -> f32 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len_sq = abx * abx + aby * aby;
    if len_sq == 0.0 {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0);
    let proj = Point::new(a.x + t * abx, a.y + t * aby);
    p.distance_to(&proj)
}

/// Check if a point is inside a closed polygon (ray casting).
fn polygon_contains(vertices: &[Point], point: &Point) -> bool {
    if vertices.len() < MIN_POLYGON_VERTICES {
        return false;
    }
    let mut inside = false;
    let n = vertices.len();
    let mut j = n - 1;
    for i in 0..n {
        let vi = &vertices[i];
        let vj = &vertices[j];
        if ((vi.y > point.y) != (vj.y > point.y))
            && (point.x < (vj.x - vi.x) * (point.y - vi.y) / (vj.y - vi.y) + vi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

// ============================================================================
// Shape
// ============================================================================

/// The geometry of an annotation, decided once at ingestion.
///
/// All coordinates are natural image pixels. Rectangles and polygons carry
/// an area measurement; lines carry a length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Axis-aligned rectangle.
    Rectangle(Rect),
    /// Closed polygon with at least 3 vertices.
    Polygon(Vec<Point>),
    /// Open polyline with at least 2 vertices.
    Line(Vec<Point>),
}

impl Shape {
    /// Display name of the shape kind, as shown in the results table.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Rectangle(_) => "Rectangle",
            Shape::Polygon(_) => "Polygon",
            Shape::Line(_) => "Line",
        }
    }

    /// Which label set applies to this shape.
    pub fn label_kind(&self) -> LabelKind {
        match self {
            Shape::Rectangle(_) | Shape::Polygon(_) => LabelKind::Area,
            Shape::Line(_) => LabelKind::Line,
        }
    }

    /// Geometry validity: rectangles must have positive extent, polygons
    /// at least 3 vertices, lines at least 2.
    pub fn is_valid(&self) -> bool {
        match self {
            Shape::Rectangle(r) => r.width() > 0.0 && r.height() > 0.0,
            Shape::Polygon(points) => points.len() >= MIN_POLYGON_VERTICES,
            Shape::Line(points) => points.len() >= MIN_LINE_VERTICES,
        }
    }

    /// Hit test against this shape. `tolerance` (natural pixels) widens
    /// line picking; rectangles and polygons use plain containment.
    pub fn hit(&self, point: &Point, tolerance: f32) -> bool {
        match self {
            Shape::Rectangle(r) => r.contains(point),
            Shape::Polygon(vertices) => polygon_contains(vertices, point),
            Shape::Line(points) => points
                .windows(2)
                .any(|pair| segment_distance(point, &pair[0], &pair[1]) <= tolerance),
        }
    }

    /// Move the whole shape by a natural-space delta.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        match self {
            Shape::Rectangle(r) => *r = r.translated(dx, dy),
            Shape::Polygon(points) | Shape::Line(points) => {
                for p in points.iter_mut() {
                    p.x += dx;
                    p.y += dy;
                }
            }
        }
    }

    /// Arithmetic-mean centroid, used to anchor polygon labels.
    pub fn centroid(&self) -> Point {
        match self {
            Shape::Rectangle(r) => r.center(),
            Shape::Polygon(points) | Shape::Line(points) => {
                if points.is_empty() {
                    return Point::new(0.0, 0.0);
                }
                let n = points.len() as f32;
                let (sx, sy) = points
                    .iter()
                    .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
                Point::new(sx / n, sy / n)
            }
        }
    }

    /// Measure this shape under the given scale settings.
    pub fn measure(&self, scale: &PlanScale) -> Measurement {
        match self {
            Shape::Rectangle(r) => Measurement::Area(scale.rectangle_area(r.width(), r.height())),
            Shape::Polygon(points) => Measurement::Area(scale.polygon_area(points)),
            Shape::Line(points) => Measurement::Length(scale.line_length(points)),
        }
    }
}

// ============================================================================
// Annotation
// ============================================================================

/// Derived real-world measurement of an annotation. Always recomputed from
/// the current geometry and scale settings, never hand-edited.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Measurement {
    /// Area in square meters (rectangles and polygons)
    Area(f32),
    /// Length in meters (lines)
    Length(f32),
}

impl Measurement {
    pub fn value(&self) -> f32 {
        match self {
            Measurement::Area(v) | Measurement::Length(v) => *v,
        }
    }

    /// Unit-suffixed text, two decimals: `12.34 m²` or `5.67 m`.
    pub fn text(&self) -> String {
        match self {
            Measurement::Area(v) => format!("{v:.2} m²"),
            Measurement::Length(v) => format!("{v:.2} m"),
        }
    }
}

/// Provenance of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    /// Produced by the detection backend
    Detected,
    /// Drawn by the user
    UserAdded,
    /// A detected annotation the user has since modified
    UserEdited,
}

/// Score assigned to user-drawn and user-edited annotations: the sentinel
/// for "not a model prediction".
pub const USER_SCORE: f32 = 1.0;

/// A single annotation: one detected or user-created object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Stable unique identifier (not the display index)
    pub id: AnnotationId,
    /// Geometry in natural image pixels
    pub shape: Shape,
    /// Reference into the label catalog; looked up, never copied
    pub label_id: u32,
    /// Derived measurement under the current scale settings
    pub measurement: Measurement,
    /// Detection confidence in [0, 1]; [`USER_SCORE`] for user rows
    pub score: f32,
    /// Provenance tag, preserved across edits
    pub source: Source,
}

/// An annotation about to be inserted; the store assigns the id and
/// computes the measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnnotation {
    pub shape: Shape,
    pub label_id: u32,
    pub score: f32,
    pub source: Source,
}

impl NewAnnotation {
    /// A user-drawn annotation with the sentinel score.
    pub fn user(shape: Shape, label_id: u32) -> Self {
        Self {
            shape,
            label_id,
            score: USER_SCORE,
            source: Source::UserAdded,
        }
    }
}

// ============================================================================
// Annotation Store
// ============================================================================

/// Deep-copy snapshot of the store, backing cancel-on-exit.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    annotations: Vec<Annotation>,
    next_id: AnnotationId,
}

/// The canonical ordered collection of annotations.
///
/// Position in the store defines the 1-based display index shown to the
/// user; the index is derived, never stored, so deletes shift all later
/// rows down without touching ids. Every mutating operation recomputes the
/// affected measurements before returning, so observers never see geometry
/// and measurement disagree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
    /// Counter for generating unique annotation ids.
    next_id: AnnotationId,
    /// Currently selected annotation id.
    #[serde(skip)]
    selected_id: Option<AnnotationId>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self {
            annotations: Vec::new(),
            next_id: 1,
            selected_id: None,
        }
    }

    /// Replace the entire contents, e.g. when new detection results arrive
    /// or a project is loaded. Prior rows, ids, and selection are wiped.
    pub fn replace_all(&mut self, rows: Vec<NewAnnotation>, scale: &PlanScale) {
        self.annotations.clear();
        self.selected_id = None;
        self.next_id = 1;
        for row in rows {
            self.insert(row, scale);
        }
        log::debug!("store replaced: {} annotations", self.annotations.len());
    }

    /// Append an annotation and return its id. Invalid geometry is refused.
    pub fn insert(&mut self, row: NewAnnotation, scale: &PlanScale) -> Option<AnnotationId> {
        if !row.shape.is_valid() {
            log::debug!("discarding invalid {} geometry", row.shape.kind_name());
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        let measurement = row.shape.measure(scale);
        self.annotations.push(Annotation {
            id,
            shape: row.shape,
            label_id: row.label_id,
            measurement,
            score: row.score,
            source: row.source,
        });
        Some(id)
    }

    /// Replace an annotation's geometry, recomputing its measurement in the
    /// same step. A detected annotation becomes user-edited and takes the
    /// sentinel score.
    pub fn update_shape(&mut self, id: AnnotationId, shape: Shape, scale: &PlanScale) -> bool {
        if !shape.is_valid() {
            return false;
        }
        let Some(ann) = self.get_mut(id) else {
            return false;
        };
        ann.measurement = shape.measure(scale);
        ann.shape = shape;
        if ann.source == Source::Detected {
            ann.source = Source::UserEdited;
            ann.score = USER_SCORE;
        }
        true
    }

    /// Move an annotation by a natural-space delta.
    pub fn translate(&mut self, id: AnnotationId, dx: f32, dy: f32, scale: &PlanScale) -> bool {
        let Some(ann) = self.get_mut(id) else {
            return false;
        };
        let mut shape = ann.shape.clone();
        shape.translate(dx, dy);
        self.update_shape(id, shape, scale)
    }

    /// Re-label an annotation.
    pub fn update_label(&mut self, id: AnnotationId, label_id: u32) -> bool {
        match self.get_mut(id) {
            Some(ann) => {
                ann.label_id = label_id;
                true
            }
            None => false,
        }
    }

    /// Remove an annotation by id. All later display indices shift down by
    /// one; ids are untouched.
    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        let index = self.index_of(id)?;
        if self.selected_id == Some(id) {
            self.selected_id = None;
        }
        Some(self.annotations.remove(index))
    }

    /// Recompute every measurement, e.g. after the global scale settings
    /// changed.
    pub fn recompute_all(&mut self, scale: &PlanScale) {
        for ann in self.annotations.iter_mut() {
            ann.measurement = ann.shape.measure(scale);
        }
        log::debug!(
            "recomputed {} measurements at 1:{} / {} dpi",
            self.annotations.len(),
            scale.plan_scale(),
            scale.dpi()
        );
    }

    /// Deep-copy snapshot for later [`restore`](Self::restore).
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            annotations: self.annotations.clone(),
            next_id: self.next_id,
        }
    }

    /// Restore a snapshot, discarding all edits made since it was taken.
    pub fn restore(&mut self, snapshot: StoreSnapshot) {
        self.annotations = snapshot.annotations;
        self.next_id = snapshot.next_id;
        if let Some(id) = self.selected_id
            && self.get(id).is_none()
        {
            self.selected_id = None;
        }
    }

    /// Get an annotation by id.
    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    fn get_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|a| a.id == id)
    }

    /// 0-based position of an annotation.
    pub fn index_of(&self, id: AnnotationId) -> Option<usize> {
        self.annotations.iter().position(|a| a.id == id)
    }

    /// 1-based display index, as shown to the user (`#N`).
    pub fn display_index(&self, id: AnnotationId) -> Option<usize> {
        self.index_of(id).map(|i| i + 1)
    }

    /// Annotation id at a 0-based position.
    pub fn id_at(&self, index: usize) -> Option<AnnotationId> {
        self.annotations.get(index).map(|a| a.id)
    }

    /// All annotations in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Select an annotation (or clear the selection with `None`).
    pub fn select(&mut self, id: Option<AnnotationId>) {
        self.selected_id = id;
    }

    /// Currently selected annotation id.
    pub fn selected(&self) -> Option<AnnotationId> {
        self.selected_id
    }

    /// Find the annotation under a natural-space point. When shapes
    /// overlap, the topmost (most recently added, highest index) wins.
    pub fn hit_test(&self, point: &Point, tolerance: f32) -> Option<AnnotationId> {
        self.annotations
            .iter()
            .rev()
            .find(|a| a.shape.hit(point, tolerance))
            .map(|a| a.id)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn scale() -> PlanScale {
        PlanScale::new(300.0, 100.0).unwrap()
    }

    fn rect(x1: f32, y1: f32, x2: f32, y2: f32) -> Shape {
        Shape::Rectangle(Rect {
            x1,
            y1,
            x2,
            y2,
        })
    }

    #[test]
    fn test_point_distance() {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(3.0, 4.0);
        assert!((p1.distance_to(&p2) - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_rect_from_corners_normalizes() {
        let r = Rect::from_corners(Point::new(50.0, 80.0), Point::new(10.0, 20.0));
        assert_eq!(r.x1, 10.0);
        assert_eq!(r.y1, 20.0);
        assert_eq!(r.x2, 50.0);
        assert_eq!(r.y2, 80.0);
        assert!(r.width() > 0.0 && r.height() > 0.0);
    }

    #[test]
    fn test_polygon_contains() {
        let square = vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ];
        assert!(polygon_contains(&square, &Point::new(50.0, 50.0)));
        assert!(!polygon_contains(&square, &Point::new(150.0, 50.0)));
    }

    #[test]
    fn test_line_hit_with_tolerance() {
        let line = Shape::Line(vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)]);
        assert!(line.hit(&Point::new(50.0, 4.0), 5.0));
        assert!(!line.hit(&Point::new(50.0, 10.0), 5.0));
        assert!(!line.hit(&Point::new(120.0, 0.0), 5.0));
    }

    #[test]
    fn test_measurement_follows_shape_kind() {
        let s = scale();
        assert!(matches!(
            rect(0.0, 0.0, 10.0, 10.0).measure(&s),
            Measurement::Area(_)
        ));
        assert!(matches!(
            Shape::Line(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]).measure(&s),
            Measurement::Length(_)
        ));
    }

    #[test]
    fn test_insert_assigns_sequential_display_indices() {
        let s = scale();
        let mut store = AnnotationStore::new();
        let a = store
            .insert(NewAnnotation::user(rect(0.0, 0.0, 20.0, 20.0), 1), &s)
            .unwrap();
        let b = store
            .insert(NewAnnotation::user(rect(30.0, 0.0, 50.0, 20.0), 1), &s)
            .unwrap();
        assert_eq!(store.display_index(a), Some(1));
        assert_eq!(store.display_index(b), Some(2));
    }

    #[test]
    fn test_insert_rejects_invalid_geometry() {
        let s = scale();
        let mut store = AnnotationStore::new();
        assert!(
            store
                .insert(
                    NewAnnotation::user(Shape::Polygon(vec![Point::new(0.0, 0.0)]), 1),
                    &s
                )
                .is_none()
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_shifts_display_indices_not_ids() {
        // Deleting index k shifts everything after k down by one, and no id
        // changes: two rectangles, delete the first, one row left at #1
        let s = scale();
        let mut store = AnnotationStore::new();
        let a = store
            .insert(NewAnnotation::user(rect(0.0, 0.0, 20.0, 20.0), 1), &s)
            .unwrap();
        let b = store
            .insert(NewAnnotation::user(rect(30.0, 0.0, 50.0, 20.0), 1), &s)
            .unwrap();

        store.remove(a);
        assert_eq!(store.len(), 1);
        assert_eq!(store.display_index(b), Some(1));
        assert_eq!(store.get(b).unwrap().id, b);
        assert!(store.get(a).is_none());
    }

    #[test]
    fn test_update_shape_recomputes_measurement() {
        let s = scale();
        let ppm = s.pixels_per_meter();
        let mut store = AnnotationStore::new();
        let id = store
            .insert(NewAnnotation::user(rect(0.0, 0.0, ppm, ppm), 1), &s)
            .unwrap();
        assert!((store.get(id).unwrap().measurement.value() - 1.0).abs() < 0.001);

        store.update_shape(id, rect(0.0, 0.0, 2.0 * ppm, ppm), &s);
        assert!((store.get(id).unwrap().measurement.value() - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_editing_detected_annotation_marks_user_edited() {
        let s = scale();
        let mut store = AnnotationStore::new();
        let id = store
            .insert(
                NewAnnotation {
                    shape: rect(0.0, 0.0, 50.0, 50.0),
                    label_id: 1,
                    score: 0.87,
                    source: Source::Detected,
                },
                &s,
            )
            .unwrap();

        store.translate(id, 10.0, 10.0, &s);
        let ann = store.get(id).unwrap();
        assert_eq!(ann.source, Source::UserEdited);
        assert_eq!(ann.score, USER_SCORE);

        // A user-added annotation keeps its provenance when edited
        let id2 = store
            .insert(NewAnnotation::user(rect(0.0, 0.0, 30.0, 30.0), 1), &s)
            .unwrap();
        store.translate(id2, 5.0, 5.0, &s);
        assert_eq!(store.get(id2).unwrap().source, Source::UserAdded);
    }

    #[test]
    fn test_recompute_all_after_scale_change() {
        // Changing the plan scale recomputes every measurement without any
        // geometry edit
        let coarse = PlanScale::new(300.0, 100.0).unwrap();
        let fine = PlanScale::new(300.0, 50.0).unwrap();
        let mut store = AnnotationStore::new();
        let id = store
            .insert(NewAnnotation::user(rect(0.0, 0.0, 200.0, 100.0), 1), &coarse)
            .unwrap();
        let before = store.get(id).unwrap().measurement.value();

        store.recompute_all(&fine);
        let after = store.get(id).unwrap().measurement.value();
        assert!((after * 4.0 - before).abs() < 0.001);
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let s = scale();
        let mut store = AnnotationStore::new();
        let _ = store.insert(NewAnnotation::user(rect(0.0, 0.0, 20.0, 20.0), 1), &s);
        let before = store.snapshot();
        let reference: Vec<Annotation> = store.iter().cloned().collect();

        // Arbitrary mutations
        let id = store
            .insert(NewAnnotation::user(rect(50.0, 50.0, 90.0, 90.0), 2), &s)
            .unwrap();
        store.translate(id, 5.0, 5.0, &s);
        store.remove(store.id_at(0).unwrap());

        store.restore(before);
        let restored: Vec<Annotation> = store.iter().cloned().collect();
        assert_eq!(restored, reference);
    }

    #[test]
    fn test_restored_ids_do_not_collide() {
        let s = scale();
        let mut store = AnnotationStore::new();
        let first = store
            .insert(NewAnnotation::user(rect(0.0, 0.0, 20.0, 20.0), 1), &s)
            .unwrap();
        let snap = store.snapshot();
        let _ = store.insert(NewAnnotation::user(rect(30.0, 0.0, 60.0, 20.0), 1), &s);
        store.restore(snap);
        let next = store
            .insert(NewAnnotation::user(rect(30.0, 0.0, 60.0, 20.0), 1), &s)
            .unwrap();
        assert_ne!(next, first);
    }

    #[test]
    fn test_hit_test_topmost_wins() {
        let s = scale();
        let mut store = AnnotationStore::new();
        let below = store
            .insert(NewAnnotation::user(rect(0.0, 0.0, 100.0, 100.0), 1), &s)
            .unwrap();
        let above = store
            .insert(NewAnnotation::user(rect(25.0, 25.0, 75.0, 75.0), 2), &s)
            .unwrap();

        assert_eq!(store.hit_test(&Point::new(50.0, 50.0), 0.0), Some(above));
        assert_eq!(store.hit_test(&Point::new(10.0, 10.0), 0.0), Some(below));
        assert_eq!(store.hit_test(&Point::new(500.0, 500.0), 0.0), None);
    }

    #[test]
    fn test_replace_all_wipes_selection_and_rows() {
        let s = scale();
        let mut store = AnnotationStore::new();
        let id = store
            .insert(NewAnnotation::user(rect(0.0, 0.0, 20.0, 20.0), 1), &s)
            .unwrap();
        store.select(Some(id));

        store.replace_all(
            vec![NewAnnotation::user(rect(5.0, 5.0, 25.0, 25.0), 2)],
            &s,
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.selected(), None);
        assert_eq!(store.iter().next().unwrap().label_id, 2);
    }
}
