//! Interaction controller: a state machine over drawing/editing tools.
//!
//! Raw pointer events arrive in view space. The controller collects them in
//! view space (where thresholds like minimum size are user-perceptible) and
//! converts to natural space exactly once, on commit, so no rounding error
//! accumulates across pointer moves. All store mutations flow through here;
//! the overlay renderer and dependent UI only ever observe.

use crate::annotation::{
    AnnotationId, AnnotationStore, MIN_LINE_VERTICES, MIN_POLYGON_VERTICES, NewAnnotation, Point,
    Rect, Shape,
};
use crate::catalog::LabelKind;
use crate::constants::threshold;
use crate::transform::ViewTransform;
use crate::units::PlanScale;

/// Annotation tools available in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorTool {
    /// Pure inspection, no drawing or editing
    #[default]
    View,
    /// Drag out a rectangle
    DrawRectangle,
    /// Click vertices, close near the first one or double-click
    DrawPolygon,
    /// Click vertices, double-click to complete
    DrawLine,
    /// Select, move, resize, relabel existing annotations
    EditSelect,
    /// Click an annotation to remove it
    Delete,
}

impl EditorTool {
    /// Display name for this tool.
    pub fn name(&self) -> &'static str {
        match self {
            EditorTool::View => "View",
            EditorTool::DrawRectangle => "Rectangle",
            EditorTool::DrawPolygon => "Polygon",
            EditorTool::DrawLine => "Line",
            EditorTool::EditSelect => "Edit",
            EditorTool::Delete => "Delete",
        }
    }

    /// Whether this tool creates new shapes.
    pub fn is_drawing_tool(&self) -> bool {
        matches!(
            self,
            EditorTool::DrawRectangle | EditorTool::DrawPolygon | EditorTool::DrawLine
        )
    }
}

/// A pointer event in view-space coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up(Point),
    DoubleClick(Point),
}

/// Keyboard events the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    /// Delete or Backspace
    Delete,
    Escape,
}

/// What an event changed, so the host knows which views to refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditorResponse {
    pub store_changed: bool,
    pub selection_changed: bool,
    pub preview_changed: bool,
}

impl EditorResponse {
    pub const NONE: Self = Self {
        store_changed: false,
        selection_changed: false,
        preview_changed: false,
    };

    fn store() -> Self {
        Self {
            store_changed: true,
            ..Self::NONE
        }
    }

    fn selection() -> Self {
        Self {
            selection_changed: true,
            ..Self::NONE
        }
    }

    fn preview() -> Self {
        Self {
            preview_changed: true,
            ..Self::NONE
        }
    }

    /// Whether anything observable changed.
    pub fn any(&self) -> bool {
        self.store_changed || self.selection_changed || self.preview_changed
    }
}

/// State of the shape currently being drawn, in view space.
#[derive(Debug, Clone, Default)]
struct DrawingState {
    /// Committed vertices
    points: Vec<Point>,
    /// Current pointer position, included in the preview between clicks
    pointer: Option<Point>,
    is_drawing: bool,
}

impl DrawingState {
    fn start(&mut self, point: Point) {
        self.points.clear();
        self.points.push(point);
        self.pointer = Some(point);
        self.is_drawing = true;
    }

    fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    fn cancel(&mut self) {
        self.points.clear();
        self.pointer = None;
        self.is_drawing = false;
    }

    /// Committed vertices plus the pending pointer position.
    fn preview_points(&self) -> Vec<Point> {
        let mut points = self.points.clone();
        if let Some(p) = self.pointer
            && points.last() != Some(&p)
        {
            points.push(p);
        }
        points
    }
}

/// Resize handles of a selected shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    NW,
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    /// Polygon or line vertex by index
    Vertex(usize),
}

/// In-flight drag of a selected shape.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum DragState {
    #[default]
    Idle,
    /// Dragging the shape body; `last` is the previous pointer position in
    /// natural space
    MoveBody { id: AnnotationId, last: Point },
    /// Dragging a resize/reshape handle
    Resize { id: AnnotationId, handle: Handle },
}

/// The interaction controller.
#[derive(Debug, Clone)]
pub struct Editor {
    tool: EditorTool,
    drawing: DrawingState,
    drag: DragState,
    /// Label assigned to newly drawn rectangles and polygons
    area_label: u32,
    /// Label assigned to newly drawn lines
    line_label: u32,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// Controller in the initial `View` state, with label id 1 of each set
    /// preselected (the catalog defaults start at 1).
    pub fn new() -> Self {
        Self {
            tool: EditorTool::View,
            drawing: DrawingState::default(),
            drag: DragState::Idle,
            area_label: 1,
            line_label: 1,
        }
    }

    pub fn tool(&self) -> EditorTool {
        self.tool
    }

    /// Switch tools. Any in-progress shape is cancelled and its preview
    /// discarded; transitions never leak drawing state.
    pub fn set_tool(&mut self, tool: EditorTool) -> EditorResponse {
        if self.tool == tool {
            return EditorResponse::NONE;
        }
        let had_preview = self.drawing.is_drawing;
        self.drawing.cancel();
        self.drag = DragState::Idle;
        self.tool = tool;
        log::debug!("🖌️ tool: {}", tool.name());
        if had_preview {
            EditorResponse::preview()
        } else {
            EditorResponse::NONE
        }
    }

    /// Label used for newly drawn area shapes.
    pub fn area_label(&self) -> u32 {
        self.area_label
    }

    /// Label used for newly drawn lines.
    pub fn line_label(&self) -> u32 {
        self.line_label
    }

    pub fn set_area_label(&mut self, label_id: u32) {
        self.area_label = label_id;
    }

    pub fn set_line_label(&mut self, label_id: u32) {
        self.line_label = label_id;
    }

    /// Whether a shape is currently being drawn.
    pub fn is_drawing(&self) -> bool {
        self.drawing.is_drawing
    }

    /// Re-label the selected annotation with the currently chosen label for
    /// its kind, re-coloring it on the next render.
    pub fn relabel_selected(&mut self, store: &mut AnnotationStore) -> EditorResponse {
        let Some(id) = store.selected() else {
            return EditorResponse::NONE;
        };
        let Some(ann) = store.get(id) else {
            return EditorResponse::NONE;
        };
        let label_id = match ann.shape.label_kind() {
            LabelKind::Area => self.area_label,
            LabelKind::Line => self.line_label,
        };
        if store.update_label(id, label_id) {
            log::debug!("🏷️ annotation {} relabeled to {}", id, label_id);
            EditorResponse::store()
        } else {
            EditorResponse::NONE
        }
    }

    /// The in-progress shape converted to natural space, for the preview
    /// overlay. Polygons preview as open polylines until closed.
    pub fn preview_shape(&self, transform: &ViewTransform) -> Option<Shape> {
        if !self.drawing.is_drawing {
            return None;
        }
        let points: Vec<Point> = self
            .drawing
            .preview_points()
            .iter()
            .map(|p| transform.to_natural(*p))
            .collect();
        match self.tool {
            EditorTool::DrawRectangle => {
                let first = *points.first()?;
                let last = *points.last()?;
                Some(Shape::Rectangle(Rect::from_corners(first, last)))
            }
            EditorTool::DrawPolygon | EditorTool::DrawLine => Some(Shape::Line(points)),
            _ => None,
        }
    }

    /// Feed a pointer event through the state machine.
    pub fn on_pointer(
        &mut self,
        event: PointerEvent,
        store: &mut AnnotationStore,
        transform: &ViewTransform,
        scale: &PlanScale,
    ) -> EditorResponse {
        match self.tool {
            EditorTool::View => EditorResponse::NONE,
            EditorTool::DrawRectangle => self.pointer_rectangle(event, store, transform, scale),
            EditorTool::DrawPolygon => self.pointer_polygon(event, store, transform, scale),
            EditorTool::DrawLine => self.pointer_line(event, store, transform, scale),
            EditorTool::EditSelect => self.pointer_edit(event, store, transform, scale),
            EditorTool::Delete => self.pointer_delete(event, store, transform),
        }
    }

    /// Feed a keyboard event through the state machine.
    pub fn on_key(&mut self, event: KeyEvent, store: &mut AnnotationStore) -> EditorResponse {
        match event {
            KeyEvent::Delete => {
                if self.tool != EditorTool::EditSelect {
                    return EditorResponse::NONE;
                }
                let Some(id) = store.selected() else {
                    return EditorResponse::NONE;
                };
                store.remove(id);
                log::info!("🗑️ deleted annotation {}", id);
                EditorResponse {
                    store_changed: true,
                    selection_changed: true,
                    preview_changed: false,
                }
            }
            KeyEvent::Escape => {
                let had_preview = self.drawing.is_drawing;
                self.drawing.cancel();
                self.drag = DragState::Idle;
                if self.tool.is_drawing_tool() {
                    self.tool = EditorTool::EditSelect;
                }
                log::debug!("❌ drawing cancelled");
                if had_preview {
                    EditorResponse::preview()
                } else {
                    EditorResponse::NONE
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Per-tool pointer handling
    // ------------------------------------------------------------------

    fn pointer_rectangle(
        &mut self,
        event: PointerEvent,
        store: &mut AnnotationStore,
        transform: &ViewTransform,
        scale: &PlanScale,
    ) -> EditorResponse {
        match event {
            PointerEvent::Down(p) => {
                self.drawing.start(p);
                EditorResponse::preview()
            }
            PointerEvent::Move(p) => {
                if !self.drawing.is_drawing {
                    return EditorResponse::NONE;
                }
                self.drawing.pointer = Some(p);
                EditorResponse::preview()
            }
            PointerEvent::Up(p) => {
                if !self.drawing.is_drawing {
                    return EditorResponse::NONE;
                }
                let anchor = self.drawing.points[0];
                self.drawing.cancel();

                // Minimum size is checked in view pixels, since that is
                // what the user perceives
                if (p.x - anchor.x).abs() < threshold::MIN_RECT_SIZE
                    || (p.y - anchor.y).abs() < threshold::MIN_RECT_SIZE
                {
                    log::debug!("rectangle below minimum size, discarded");
                    return EditorResponse::preview();
                }

                let rect = Rect::from_corners(transform.to_natural(anchor), transform.to_natural(p));
                let id = store.insert(
                    NewAnnotation::user(Shape::Rectangle(rect), self.area_label),
                    scale,
                );
                if let Some(id) = id {
                    log::info!("✅ rectangle annotation {} created", id);
                }
                EditorResponse {
                    store_changed: id.is_some(),
                    selection_changed: false,
                    preview_changed: true,
                }
            }
            PointerEvent::DoubleClick(_) => EditorResponse::NONE,
        }
    }

    fn pointer_polygon(
        &mut self,
        event: PointerEvent,
        store: &mut AnnotationStore,
        transform: &ViewTransform,
        scale: &PlanScale,
    ) -> EditorResponse {
        match event {
            PointerEvent::Down(p) => {
                if !self.drawing.is_drawing {
                    self.drawing.start(p);
                    return EditorResponse::preview();
                }
                // Clicking near the first vertex closes the polygon
                let closes = self.drawing.points.len() >= MIN_POLYGON_VERTICES
                    && self
                        .drawing
                        .points
                        .first()
                        .is_some_and(|first| first.distance_to(&p) < threshold::POLYGON_CLOSE);
                if closes {
                    return self.commit_polygon(store, transform, scale);
                }
                self.drawing.add_point(p);
                EditorResponse::preview()
            }
            PointerEvent::Move(p) => {
                if !self.drawing.is_drawing {
                    return EditorResponse::NONE;
                }
                self.drawing.pointer = Some(p);
                EditorResponse::preview()
            }
            PointerEvent::Up(_) => EditorResponse::NONE,
            PointerEvent::DoubleClick(_) => {
                if !self.drawing.is_drawing {
                    return EditorResponse::NONE;
                }
                if self.drawing.points.len() >= MIN_POLYGON_VERTICES {
                    self.commit_polygon(store, transform, scale)
                } else {
                    log::debug!("polygon needs at least 3 points, discarded");
                    self.drawing.cancel();
                    EditorResponse::preview()
                }
            }
        }
    }

    fn commit_polygon(
        &mut self,
        store: &mut AnnotationStore,
        transform: &ViewTransform,
        scale: &PlanScale,
    ) -> EditorResponse {
        let points: Vec<Point> = self
            .drawing
            .points
            .iter()
            .map(|p| transform.to_natural(*p))
            .collect();
        self.drawing.cancel();
        let id = store.insert(
            NewAnnotation::user(Shape::Polygon(points), self.area_label),
            scale,
        );
        if let Some(id) = id {
            log::info!("✅ polygon annotation {} closed", id);
        }
        EditorResponse {
            store_changed: id.is_some(),
            selection_changed: false,
            preview_changed: true,
        }
    }

    fn pointer_line(
        &mut self,
        event: PointerEvent,
        store: &mut AnnotationStore,
        transform: &ViewTransform,
        scale: &PlanScale,
    ) -> EditorResponse {
        match event {
            PointerEvent::Down(p) => {
                if self.drawing.is_drawing {
                    self.drawing.add_point(p);
                } else {
                    self.drawing.start(p);
                }
                EditorResponse::preview()
            }
            PointerEvent::Move(p) => {
                if !self.drawing.is_drawing {
                    return EditorResponse::NONE;
                }
                self.drawing.pointer = Some(p);
                EditorResponse::preview()
            }
            PointerEvent::Up(_) => EditorResponse::NONE,
            PointerEvent::DoubleClick(p) => {
                if !self.drawing.is_drawing {
                    return EditorResponse::NONE;
                }
                // The press half of a double-click has usually appended a
                // vertex at the same position already; drop the duplicate
                let duplicate = self.drawing.points.len() > 1
                    && self
                        .drawing
                        .points
                        .last()
                        .is_some_and(|last| last.distance_to(&p) < 1.0);
                if duplicate {
                    self.drawing.points.pop();
                }
                if self.drawing.points.len() < MIN_LINE_VERTICES {
                    log::debug!("line needs at least 2 points, discarded");
                    self.drawing.cancel();
                    return EditorResponse::preview();
                }
                let points: Vec<Point> = self
                    .drawing
                    .points
                    .iter()
                    .map(|q| transform.to_natural(*q))
                    .collect();
                self.drawing.cancel();
                let id = store.insert(
                    NewAnnotation::user(Shape::Line(points), self.line_label),
                    scale,
                );
                if let Some(id) = id {
                    log::info!("✅ line annotation {} completed", id);
                }
                EditorResponse {
                    store_changed: id.is_some(),
                    selection_changed: false,
                    preview_changed: true,
                }
            }
        }
    }

    fn pointer_edit(
        &mut self,
        event: PointerEvent,
        store: &mut AnnotationStore,
        transform: &ViewTransform,
        scale: &PlanScale,
    ) -> EditorResponse {
        match event {
            PointerEvent::Down(p) => {
                // Handles of the already-selected shape win over body hits
                if let Some(id) = store.selected()
                    && let Some(handle) = self.handle_at(id, p, store, transform)
                {
                    self.drag = DragState::Resize { id, handle };
                    return EditorResponse::NONE;
                }

                let natural = transform.to_natural(p);
                let tolerance = transform.to_natural_distance(threshold::HIT_TOLERANCE);
                let hit = store.hit_test(&natural, tolerance);
                let changed = hit != store.selected();
                store.select(hit);

                if let Some(id) = hit {
                    // Reflect the clicked annotation's label in the
                    // label-select control
                    if let Some(ann) = store.get(id) {
                        match ann.shape.label_kind() {
                            LabelKind::Area => self.area_label = ann.label_id,
                            LabelKind::Line => self.line_label = ann.label_id,
                        }
                    }
                    self.drag = DragState::MoveBody { id, last: natural };
                    log::debug!("🔍 selected annotation {}", id);
                }
                if changed {
                    EditorResponse::selection()
                } else {
                    EditorResponse::NONE
                }
            }
            PointerEvent::Move(p) => {
                let natural = transform.to_natural(p);
                match self.drag {
                    DragState::Idle => EditorResponse::NONE,
                    DragState::MoveBody { id, last } => {
                        let dx = natural.x - last.x;
                        let dy = natural.y - last.y;
                        if dx == 0.0 && dy == 0.0 {
                            return EditorResponse::NONE;
                        }
                        self.drag = DragState::MoveBody { id, last: natural };
                        if store.translate(id, dx, dy, scale) {
                            EditorResponse::store()
                        } else {
                            EditorResponse::NONE
                        }
                    }
                    DragState::Resize { id, handle } => {
                        if self.apply_resize(id, handle, natural, store, scale) {
                            EditorResponse::store()
                        } else {
                            EditorResponse::NONE
                        }
                    }
                }
            }
            PointerEvent::Up(_) => {
                self.drag = DragState::Idle;
                EditorResponse::NONE
            }
            PointerEvent::DoubleClick(_) => EditorResponse::NONE,
        }
    }

    fn pointer_delete(
        &mut self,
        event: PointerEvent,
        store: &mut AnnotationStore,
        transform: &ViewTransform,
    ) -> EditorResponse {
        let PointerEvent::Down(p) = event else {
            return EditorResponse::NONE;
        };
        let natural = transform.to_natural(p);
        let tolerance = transform.to_natural_distance(threshold::HIT_TOLERANCE);
        let Some(id) = store.hit_test(&natural, tolerance) else {
            return EditorResponse::NONE;
        };
        store.remove(id);
        log::info!("🗑️ deleted annotation {}", id);
        EditorResponse {
            store_changed: true,
            selection_changed: true,
            preview_changed: false,
        }
    }

    /// Find the handle of the given annotation under a view-space point.
    fn handle_at(
        &self,
        id: AnnotationId,
        view_point: Point,
        store: &AnnotationStore,
        transform: &ViewTransform,
    ) -> Option<Handle> {
        let ann = store.get(id)?;
        let near = |p: &Point| transform.to_view(*p).distance_to(&view_point) <= threshold::HANDLE_SIZE;

        match &ann.shape {
            Shape::Rectangle(r) => {
                let cx = (r.x1 + r.x2) / 2.0;
                let cy = (r.y1 + r.y2) / 2.0;
                let handles = [
                    (Handle::NW, Point::new(r.x1, r.y1)),
                    (Handle::N, Point::new(cx, r.y1)),
                    (Handle::NE, Point::new(r.x2, r.y1)),
                    (Handle::E, Point::new(r.x2, cy)),
                    (Handle::SE, Point::new(r.x2, r.y2)),
                    (Handle::S, Point::new(cx, r.y2)),
                    (Handle::SW, Point::new(r.x1, r.y2)),
                    (Handle::W, Point::new(r.x1, cy)),
                ];
                handles
                    .iter()
                    .find(|(_, p)| near(p))
                    .map(|(handle, _)| *handle)
            }
            Shape::Polygon(points) | Shape::Line(points) => points
                .iter()
                .enumerate()
                .find(|(_, p)| near(p))
                .map(|(i, _)| Handle::Vertex(i)),
        }
    }

    /// Apply a handle drag to the annotation's geometry.
    fn apply_resize(
        &self,
        id: AnnotationId,
        handle: Handle,
        natural: Point,
        store: &mut AnnotationStore,
        scale: &PlanScale,
    ) -> bool {
        let Some(ann) = store.get(id) else {
            return false;
        };
        let shape = match (&ann.shape, handle) {
            (Shape::Rectangle(r), handle) => {
                let (mut x1, mut y1, mut x2, mut y2) = (r.x1, r.y1, r.x2, r.y2);
                match handle {
                    Handle::NW => {
                        x1 = natural.x;
                        y1 = natural.y;
                    }
                    Handle::N => y1 = natural.y,
                    Handle::NE => {
                        x2 = natural.x;
                        y1 = natural.y;
                    }
                    Handle::E => x2 = natural.x,
                    Handle::SE => {
                        x2 = natural.x;
                        y2 = natural.y;
                    }
                    Handle::S => y2 = natural.y,
                    Handle::SW => {
                        x1 = natural.x;
                        y2 = natural.y;
                    }
                    Handle::W => x1 = natural.x,
                    Handle::Vertex(_) => return false,
                }
                Shape::Rectangle(Rect::from_corners(Point::new(x1, y1), Point::new(x2, y2)))
            }
            (Shape::Polygon(points), Handle::Vertex(i)) => {
                let mut points = points.clone();
                let Some(v) = points.get_mut(i) else {
                    return false;
                };
                *v = natural;
                Shape::Polygon(points)
            }
            (Shape::Line(points), Handle::Vertex(i)) => {
                let mut points = points.clone();
                let Some(v) = points.get_mut(i) else {
                    return false;
                };
                *v = natural;
                Shape::Line(points)
            }
            _ => return false,
        };
        store.update_shape(id, shape, scale)
    }
}

// ============================================================================
// Tests
// ============================================================================
