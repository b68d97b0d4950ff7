//! Overlay renderer: projects annotation store rows into visible vector
//! elements.
//!
//! The renderer is a pure projection. It never mutates the store; it reads
//! rows and emits draw calls against a [`RenderBackend`], keyed by
//! annotation id (not display index, which shifts on delete). Shape
//! geometry stays in natural pixels; the backend applies one container
//! scale+translate from the [`ViewTransform`], so zoom never touches
//! per-shape coordinates.
//!
//! The re-render policy is full clear-and-redraw: annotation counts are
//! tens, not thousands. Each pass is timed and logged at debug level so a
//! per-row patching backend can be justified with data if it ever matters.

use std::collections::{HashMap, HashSet};

use web_time::Instant;

use crate::annotation::{Annotation, AnnotationId, AnnotationStore, Point, Shape};
use crate::catalog::LabelCatalog;
use crate::constants::style;
use crate::transform::{ContainerTransform, ViewTransform};

/// Reserved id for the in-progress drawing preview (store ids start at 1).
pub const PREVIEW_ID: AnnotationId = 0;

/// Key of one visual element. An annotation projects into a body element
/// plus, for lines, one marker element per vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementKey {
    pub annotation: AnnotationId,
    /// 0 = body, 1.. = vertex markers
    pub part: u16,
}

impl ElementKey {
    pub fn body(annotation: AnnotationId) -> Self {
        Self {
            annotation,
            part: 0,
        }
    }

    pub fn marker(annotation: AnnotationId, index: usize) -> Self {
        Self {
            annotation,
            part: index as u16 + 1,
        }
    }
}

/// Backend-facing shape vocabulary, in natural pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayShape {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Polygon {
        vertices: Vec<Point>,
        closed: bool,
    },
    Circle {
        center: Point,
        radius: f32,
    },
}

/// Visual style of one element.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeStyle {
    pub stroke: [u8; 3],
    pub stroke_width: f32,
    /// `None` for open polylines
    pub fill: Option<[u8; 3]>,
    pub fill_opacity: f32,
}

/// A text label attached to an annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSpec {
    /// Anchor position in natural pixels
    pub position: Point,
    pub text: String,
    /// Background color (text renders white on top)
    pub color: [u8; 3],
    pub opacity: f32,
}

/// Rendering backend seam.
///
/// Implementations retain elements keyed by [`ElementKey`] / annotation id
/// and are free to map them onto SVG nodes, a retained canvas scene, or
/// anything else. They must treat `set_highlight` as idempotent.
pub trait RenderBackend {
    /// Apply the whole-overlay scale+translate.
    fn set_container(&mut self, transform: ContainerTransform);

    fn draw_shape(&mut self, key: ElementKey, shape: &OverlayShape, style: &ShapeStyle);

    fn update_shape(&mut self, key: ElementKey, shape: &OverlayShape, style: &ShapeStyle);

    fn remove_shape(&mut self, key: ElementKey);

    fn draw_label(&mut self, annotation: AnnotationId, label: &LabelSpec);

    fn update_label(&mut self, annotation: AnnotationId, label: &LabelSpec);

    fn remove_label(&mut self, annotation: AnnotationId);

    /// Toggle the emphasized visual state (wider stroke, higher fill
    /// opacity) of an annotation's elements and its label.
    fn set_highlight(&mut self, annotation: AnnotationId, highlighted: bool);

    /// Remove every element and label.
    fn clear(&mut self);
}

/// Stateless projection of store rows onto a backend.
#[derive(Debug, Default)]
pub struct OverlayRenderer;

impl OverlayRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Clear the backend and redraw every row of the store.
    pub fn render_all(
        &self,
        store: &AnnotationStore,
        catalog: &LabelCatalog,
        transform: &ViewTransform,
        backend: &mut dyn RenderBackend,
    ) {
        let start = Instant::now();

        backend.clear();
        backend.set_container(transform.container());

        for (index, ann) in store.iter().enumerate() {
            self.draw_annotation(ann, index + 1, catalog, backend);
        }
        if let Some(selected) = store.selected() {
            backend.set_highlight(selected, true);
        }

        log::debug!(
            "overlay rebuilt: {} annotations in {:?}",
            store.len(),
            start.elapsed()
        );
    }

    fn draw_annotation(
        &self,
        ann: &Annotation,
        display_index: usize,
        catalog: &LabelCatalog,
        backend: &mut dyn RenderBackend,
    ) {
        let color = catalog
            .get(ann.shape.label_kind(), ann.label_id)
            .map(|l| l.color)
            .unwrap_or(style::FALLBACK_COLOR);

        let key = ElementKey::body(ann.id);
        backend.draw_shape(key, &body_shape(&ann.shape), &body_style(&ann.shape, color));

        if let Shape::Line(points) = &ann.shape {
            for (i, p) in points.iter().enumerate() {
                backend.draw_shape(
                    ElementKey::marker(ann.id, i),
                    &OverlayShape::Circle {
                        center: *p,
                        radius: style::VERTEX_MARKER_RADIUS,
                    },
                    &ShapeStyle {
                        stroke: color,
                        stroke_width: 0.0,
                        fill: Some(color),
                        fill_opacity: 1.0,
                    },
                );
            }
        }

        backend.draw_label(
            ann.id,
            &LabelSpec {
                position: label_anchor(&ann.shape),
                text: label_text(display_index, ann),
                color,
                opacity: style::LABEL_OPACITY,
            },
        );
    }

    /// Draw the in-progress drawing preview under the reserved id.
    pub fn render_preview(
        &self,
        shape: &Shape,
        color: [u8; 3],
        backend: &mut dyn RenderBackend,
    ) {
        backend.draw_shape(
            ElementKey::body(PREVIEW_ID),
            &body_shape(shape),
            &body_style(shape, color),
        );
    }

    /// Remove the drawing preview, if present.
    pub fn clear_preview(&self, backend: &mut dyn RenderBackend) {
        backend.remove_shape(ElementKey::body(PREVIEW_ID));
    }

    /// Toggle the emphasized state of one annotation. Idempotent.
    pub fn highlight(
        &self,
        id: AnnotationId,
        highlighted: bool,
        backend: &mut dyn RenderBackend,
    ) {
        backend.set_highlight(id, highlighted);
    }
}

/// Project a store shape into the backend vocabulary.
fn body_shape(shape: &Shape) -> OverlayShape {
    match shape {
        Shape::Rectangle(r) => OverlayShape::Rect {
            x: r.x1,
            y: r.y1,
            width: r.width(),
            height: r.height(),
        },
        Shape::Polygon(points) => OverlayShape::Polygon {
            vertices: points.clone(),
            closed: true,
        },
        Shape::Line(points) => OverlayShape::Polygon {
            vertices: points.clone(),
            closed: false,
        },
    }
}

/// Resting style of an annotation body: label-colored stroke, low-opacity
/// fill for closed shapes, no fill for lines.
fn body_style(shape: &Shape, color: [u8; 3]) -> ShapeStyle {
    let fill = match shape {
        Shape::Line(_) => None,
        _ => Some(color),
    };
    ShapeStyle {
        stroke: color,
        stroke_width: style::STROKE_WIDTH,
        fill,
        fill_opacity: style::FILL_OPACITY,
    }
}

/// Label text: `#N: <measurement>`, uniformly for all shape kinds.
fn label_text(display_index: usize, ann: &Annotation) -> String {
    format!("#{}: {}", display_index, ann.measurement.text())
}

/// Label anchor: rectangle top-left and polygon centroid lift the label
/// above the shape; line labels sit just past the last vertex.
fn label_anchor(shape: &Shape) -> Point {
    match shape {
        Shape::Rectangle(r) => Point::new(r.x1, r.y1 - style::LABEL_OFFSET_Y),
        Shape::Polygon(_) => {
            let c = shape.centroid();
            Point::new(c.x, c.y - style::LABEL_OFFSET_Y)
        }
        Shape::Line(points) => {
            let last = points.last().copied().unwrap_or(Point::new(0.0, 0.0));
            Point::new(
                last.x + style::LINE_LABEL_OFFSET_X,
                last.y - style::LINE_LABEL_OFFSET_Y,
            )
        }
    }
}

// ============================================================================
// Retained scene backend
// ============================================================================

/// One retained element of the scene backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneElement {
    pub shape: OverlayShape,
    pub style: ShapeStyle,
}

/// Retained-mode backend holding the projected scene in memory.
///
/// Backs headless sessions and tests; a DOM or canvas backend mirrors the
/// same calls onto real visual elements.
#[derive(Debug, Default)]
pub struct SceneBackend {
    container: Option<ContainerTransform>,
    elements: HashMap<ElementKey, SceneElement>,
    labels: HashMap<AnnotationId, LabelSpec>,
    highlighted: HashSet<AnnotationId>,
}

impl SceneBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn container(&self) -> Option<ContainerTransform> {
        self.container
    }

    pub fn element(&self, key: ElementKey) -> Option<&SceneElement> {
        self.elements.get(&key)
    }

    pub fn label(&self, annotation: AnnotationId) -> Option<&LabelSpec> {
        self.labels.get(&annotation)
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn is_highlighted(&self, annotation: AnnotationId) -> bool {
        self.highlighted.contains(&annotation)
    }

    /// Effective stroke width of an element, highlight applied.
    pub fn effective_stroke_width(&self, key: ElementKey) -> Option<f32> {
        let element = self.elements.get(&key)?;
        if self.highlighted.contains(&key.annotation) {
            Some(style::STROKE_WIDTH_HIGHLIGHT)
        } else {
            Some(element.style.stroke_width)
        }
    }

    /// Effective fill opacity of an element, highlight applied.
    pub fn effective_fill_opacity(&self, key: ElementKey) -> Option<f32> {
        let element = self.elements.get(&key)?;
        if element.style.fill.is_some() && self.highlighted.contains(&key.annotation) {
            Some(style::FILL_OPACITY_HIGHLIGHT)
        } else {
            Some(element.style.fill_opacity)
        }
    }
}

impl RenderBackend for SceneBackend {
    fn set_container(&mut self, transform: ContainerTransform) {
        self.container = Some(transform);
    }

    fn draw_shape(&mut self, key: ElementKey, shape: &OverlayShape, style: &ShapeStyle) {
        self.elements.insert(
            key,
            SceneElement {
                shape: shape.clone(),
                style: style.clone(),
            },
        );
    }

    fn update_shape(&mut self, key: ElementKey, shape: &OverlayShape, style: &ShapeStyle) {
        self.draw_shape(key, shape, style);
    }

    fn remove_shape(&mut self, key: ElementKey) {
        self.elements.remove(&key);
    }

    fn draw_label(&mut self, annotation: AnnotationId, label: &LabelSpec) {
        self.labels.insert(annotation, label.clone());
    }

    fn update_label(&mut self, annotation: AnnotationId, label: &LabelSpec) {
        self.draw_label(annotation, label);
    }

    fn remove_label(&mut self, annotation: AnnotationId) {
        self.labels.remove(&annotation);
    }

    fn set_highlight(&mut self, annotation: AnnotationId, highlighted: bool) {
        if highlighted {
            self.highlighted.insert(annotation);
        } else {
            self.highlighted.remove(&annotation);
        }
    }

    fn clear(&mut self) {
        self.elements.clear();
        self.labels.clear();
        self.highlighted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{NewAnnotation, Rect};
    use crate::transform::{DisplayRect, NaturalSize};
    use crate::units::PlanScale;

    fn setup() -> (AnnotationStore, LabelCatalog, ViewTransform, PlanScale) {
        let scale = PlanScale::new(300.0, 100.0).unwrap();
        let transform = ViewTransform::compute(
            NaturalSize::new(2000.0, 1500.0),
            DisplayRect::new(0.0, 0.0, 1000.0, 750.0),
            1.0,
        )
        .unwrap();
        (
            AnnotationStore::new(),
            LabelCatalog::new(),
            transform,
            scale,
        )
    }

    fn rect_shape(x1: f32, y1: f32, x2: f32, y2: f32) -> Shape {
        Shape::Rectangle(Rect::from_corners(Point::new(x1, y1), Point::new(x2, y2)))
    }

    #[test]
    fn test_rectangle_projects_body_and_label() {
        let (mut store, catalog, transform, scale) = setup();
        let id = store
            .insert(NewAnnotation::user(rect_shape(10.0, 20.0, 110.0, 80.0), 1), &scale)
            .unwrap();

        let mut backend = SceneBackend::new();
        OverlayRenderer::new().render_all(&store, &catalog, &transform, &mut backend);

        assert_eq!(backend.element_count(), 1);
        assert_eq!(backend.label_count(), 1);
        let body = backend.element(ElementKey::body(id)).unwrap();
        assert!(matches!(
            body.shape,
            OverlayShape::Rect { x, y, width, height }
                if x == 10.0 && y == 20.0 && width == 100.0 && height == 60.0
        ));
        // Window label: blue fill at 20%, stroke width 2
        assert_eq!(body.style.stroke, [0, 0, 255]);
        assert_eq!(body.style.fill, Some([0, 0, 255]));
        assert_eq!(body.style.fill_opacity, style::FILL_OPACITY);
        assert_eq!(body.style.stroke_width, style::STROKE_WIDTH);
    }

    #[test]
    fn test_line_projects_vertex_markers() {
        let (mut store, catalog, transform, scale) = setup();
        let id = store
            .insert(
                NewAnnotation::user(
                    Shape::Line(vec![
                        Point::new(0.0, 0.0),
                        Point::new(50.0, 50.0),
                        Point::new(100.0, 40.0),
                    ]),
                    1,
                ),
                &scale,
            )
            .unwrap();

        let mut backend = SceneBackend::new();
        OverlayRenderer::new().render_all(&store, &catalog, &transform, &mut backend);

        // Body + one marker per vertex
        assert_eq!(backend.element_count(), 4);
        let marker = backend.element(ElementKey::marker(id, 2)).unwrap();
        assert!(matches!(
            marker.shape,
            OverlayShape::Circle { center, radius }
                if center == Point::new(100.0, 40.0) && radius == style::VERTEX_MARKER_RADIUS
        ));
        // Lines have no fill on the body
        let body = backend.element(ElementKey::body(id)).unwrap();
        assert_eq!(body.style.fill, None);
    }

    #[test]
    fn test_label_text_format() {
        let (mut store, catalog, transform, scale) = setup();
        let ppm = scale.pixels_per_meter();
        let rect_id = store
            .insert(NewAnnotation::user(rect_shape(0.0, 0.0, ppm, ppm), 1), &scale)
            .unwrap();
        let line_id = store
            .insert(
                NewAnnotation::user(
                    Shape::Line(vec![Point::new(0.0, 0.0), Point::new(2.0 * ppm, 0.0)]),
                    1,
                ),
                &scale,
            )
            .unwrap();

        let mut backend = SceneBackend::new();
        OverlayRenderer::new().render_all(&store, &catalog, &transform, &mut backend);

        assert_eq!(backend.label(rect_id).unwrap().text, "#1: 1.00 m²");
        // Lines carry the same index prefix as area annotations
        assert_eq!(backend.label(line_id).unwrap().text, "#2: 2.00 m");
    }

    #[test]
    fn test_polygon_label_anchored_at_centroid() {
        let (mut store, catalog, transform, scale) = setup();
        let id = store
            .insert(
                NewAnnotation::user(
                    Shape::Polygon(vec![
                        Point::new(0.0, 0.0),
                        Point::new(100.0, 0.0),
                        Point::new(100.0, 100.0),
                        Point::new(0.0, 100.0),
                    ]),
                    1,
                ),
                &scale,
            )
            .unwrap();

        let mut backend = SceneBackend::new();
        OverlayRenderer::new().render_all(&store, &catalog, &transform, &mut backend);

        let label = backend.label(id).unwrap();
        assert_eq!(label.position, Point::new(50.0, 50.0 - style::LABEL_OFFSET_Y));
    }

    #[test]
    fn test_unknown_label_uses_fallback_color() {
        let (mut store, catalog, transform, scale) = setup();
        let id = store
            .insert(NewAnnotation::user(rect_shape(0.0, 0.0, 50.0, 50.0), 99), &scale)
            .unwrap();

        let mut backend = SceneBackend::new();
        OverlayRenderer::new().render_all(&store, &catalog, &transform, &mut backend);
        assert_eq!(
            backend.element(ElementKey::body(id)).unwrap().style.stroke,
            style::FALLBACK_COLOR
        );
    }

    #[test]
    fn test_catalog_changes_apply_on_next_render() {
        use crate::catalog::{Label, LabelKind};

        let (mut store, mut catalog, transform, scale) = setup();
        let id = store
            .insert(NewAnnotation::user(rect_shape(0.0, 0.0, 50.0, 50.0), 1), &scale)
            .unwrap();

        let renderer = OverlayRenderer::new();
        let mut backend = SceneBackend::new();
        renderer.render_all(&store, &catalog, &transform, &mut backend);
        assert_eq!(backend.element(ElementKey::body(id)).unwrap().style.stroke, [0, 0, 255]);

        // Recolor the label at runtime; the next render picks it up
        catalog.upsert(LabelKind::Area, Label::new(1, "Window", [9, 9, 9]));
        renderer.render_all(&store, &catalog, &transform, &mut backend);
        assert_eq!(backend.element(ElementKey::body(id)).unwrap().style.stroke, [9, 9, 9]);
    }

    #[test]
    fn test_rerender_after_delete_leaves_no_stale_elements() {
        let (mut store, catalog, transform, scale) = setup();
        let a = store
            .insert(NewAnnotation::user(rect_shape(0.0, 0.0, 50.0, 50.0), 1), &scale)
            .unwrap();
        let b = store
            .insert(NewAnnotation::user(rect_shape(60.0, 0.0, 120.0, 50.0), 2), &scale)
            .unwrap();

        let renderer = OverlayRenderer::new();
        let mut backend = SceneBackend::new();
        renderer.render_all(&store, &catalog, &transform, &mut backend);
        assert_eq!(backend.element_count(), 2);

        store.remove(a);
        renderer.render_all(&store, &catalog, &transform, &mut backend);
        assert_eq!(backend.element_count(), 1);
        assert!(backend.element(ElementKey::body(a)).is_none());
        // The surviving row renumbers to #1 while keeping its id
        assert!(backend.label(b).unwrap().text.starts_with("#1:"));
    }

    #[test]
    fn test_highlight_is_idempotent_and_reversible() {
        let (mut store, catalog, transform, scale) = setup();
        let id = store
            .insert(NewAnnotation::user(rect_shape(0.0, 0.0, 50.0, 50.0), 1), &scale)
            .unwrap();

        let renderer = OverlayRenderer::new();
        let mut backend = SceneBackend::new();
        renderer.render_all(&store, &catalog, &transform, &mut backend);

        let key = ElementKey::body(id);
        assert_eq!(backend.effective_stroke_width(key), Some(style::STROKE_WIDTH));

        renderer.highlight(id, true, &mut backend);
        renderer.highlight(id, true, &mut backend);
        assert_eq!(
            backend.effective_stroke_width(key),
            Some(style::STROKE_WIDTH_HIGHLIGHT)
        );
        assert_eq!(
            backend.effective_fill_opacity(key),
            Some(style::FILL_OPACITY_HIGHLIGHT)
        );

        renderer.highlight(id, false, &mut backend);
        assert_eq!(backend.effective_stroke_width(key), Some(style::STROKE_WIDTH));
        assert_eq!(backend.effective_fill_opacity(key), Some(style::FILL_OPACITY));
    }

    #[test]
    fn test_preview_draw_and_clear() {
        let renderer = OverlayRenderer::new();
        let mut backend = SceneBackend::new();
        renderer.render_preview(&rect_shape(0.0, 0.0, 40.0, 40.0), [0, 255, 0], &mut backend);
        assert!(backend.element(ElementKey::body(PREVIEW_ID)).is_some());

        renderer.clear_preview(&mut backend);
        assert!(backend.element(ElementKey::body(PREVIEW_ID)).is_none());
    }

    #[test]
    fn test_container_transform_forwarded() {
        let (mut store, catalog, transform, scale) = setup();
        let _ = store.insert(NewAnnotation::user(rect_shape(0.0, 0.0, 50.0, 50.0), 1), &scale);

        let mut backend = SceneBackend::new();
        OverlayRenderer::new().render_all(&store, &catalog, &transform, &mut backend);
        let container = backend.container().unwrap();
        assert!((container.scale_x - 0.5).abs() < 0.001);
    }
}
