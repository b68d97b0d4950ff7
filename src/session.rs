//! Editor session: the constructed owner of all annotation state.
//!
//! One session owns the annotation store, the coordinate transform, the
//! scale settings, the label catalog, and the tool state, and hands them by
//! reference to the interaction controller, the overlay renderer, and the
//! dependent-UI builders. Nothing reads ambient globals; multiple sessions
//! can coexist and tests construct them directly.
//!
//! The session is also where the asynchronous detection boundary is made
//! safe: responses are keyed to a request token, a stale (out-of-order)
//! response is dropped, and editing is refused while a request is in
//! flight, so user interaction can never race a `replace_all`.

use std::path::Path;

use thiserror::Error;

use crate::annotation::{AnnotationId, AnnotationStore, NewAnnotation, StoreSnapshot};
use crate::catalog::{LabelCatalog, LabelKind};
use crate::constants::{style, zoom};
use crate::editor::{Editor, EditorResponse, EditorTool, KeyEvent, PointerEvent};
use crate::overlay::{OverlayRenderer, RenderBackend};
use crate::project::{ImageInfo, ProjectData, ProjectError};
use crate::sync::{self, SummaryLine, TableRow};
use crate::transform::{
    DisplayRect, NaturalSize, TransformError, ViewTransform, clamp_zoom,
};
use crate::units::{PlanScale, ScaleError};

/// Errors surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The plan image could not be read
    #[error("failed to read image: {0}")]
    Image(#[from] image::ImageError),

    /// Transform not computable yet (image unloaded, zero-sized container)
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// Invalid scale settings
    #[error(transparent)]
    Scale(#[from] ScaleError),

    /// Project save/load failure
    #[error(transparent)]
    Project(#[from] ProjectError),
}

/// Token identifying one detection request. A response is applied only if
/// its token is still the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// An editing session over one plan image.
#[derive(Debug)]
pub struct EditorSession {
    store: AnnotationStore,
    editor: Editor,
    renderer: OverlayRenderer,
    catalog: LabelCatalog,
    scale: PlanScale,
    zoom: f32,
    natural: Option<NaturalSize>,
    /// Image rectangle at zoom 1, as last reported by the host layout
    base_rect: Option<DisplayRect>,
    transform: Option<ViewTransform>,
    image: Option<ImageInfo>,
    pending_request: Option<RequestToken>,
    next_request: u64,
    edit_snapshot: Option<StoreSnapshot>,
}

impl EditorSession {
    /// Session with default scale settings and the default label catalog.
    pub fn new() -> Self {
        Self::with_scale(PlanScale::default())
    }

    pub fn with_scale(scale: PlanScale) -> Self {
        Self {
            store: AnnotationStore::new(),
            editor: Editor::new(),
            renderer: OverlayRenderer::new(),
            catalog: LabelCatalog::new(),
            scale,
            zoom: 1.0,
            natural: None,
            base_rect: None,
            transform: None,
            image: None,
            pending_request: None,
            next_request: 1,
            edit_snapshot: None,
        }
    }

    // ------------------------------------------------------------------
    // Image and viewport
    // ------------------------------------------------------------------

    /// Load a plan image by path. Reads only the header for the natural
    /// dimensions. Resets the store, any in-flight detection request, and
    /// any edit snapshot: annotations of the previous image must never be
    /// edited against the new one.
    pub fn load_image(&mut self, path: &Path) -> Result<(), SessionError> {
        let (width, height) = image::image_dimensions(path)?;
        self.set_natural_size(width as f32, height as f32);
        self.image = Some(ImageInfo {
            path: path.display().to_string(),
            width,
            height,
        });
        log::info!("loaded plan image {:?} ({}x{})", path, width, height);
        Ok(())
    }

    /// Provide natural dimensions directly, for hosts that decode images
    /// themselves. Same reset semantics as [`load_image`](Self::load_image).
    pub fn set_natural_size(&mut self, width: f32, height: f32) {
        self.natural = Some(NaturalSize::new(width, height));
        self.store = AnnotationStore::new();
        self.pending_request = None;
        self.edit_snapshot = None;
        self.transform = None;
        self.image = None;
    }

    /// Report the image rectangle at zoom 1, after load, container resize,
    /// or scroll. Recomputes the transform; [`TransformError::NotReady`]
    /// means retry after the next layout pass.
    pub fn update_viewport(&mut self, base_rect: DisplayRect) -> Result<(), SessionError> {
        self.base_rect = Some(base_rect);
        self.recompute_transform()
    }

    fn recompute_transform(&mut self) -> Result<(), SessionError> {
        let natural = self.natural.ok_or(TransformError::NotReady)?;
        let base_rect = self.base_rect.ok_or(TransformError::NotReady)?;
        self.transform = Some(ViewTransform::compute(natural, base_rect, self.zoom)?);
        Ok(())
    }

    /// Current transform, once image and layout are known.
    pub fn transform(&self) -> Option<&ViewTransform> {
        self.transform.as_ref()
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, value: f32) {
        self.zoom = clamp_zoom(value);
        let _ = self.recompute_transform();
        log::debug!("🔍 zoom: {:.2}x", self.zoom);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom * zoom::FACTOR);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom / zoom::FACTOR);
    }

    pub fn reset_zoom(&mut self) {
        self.set_zoom(1.0);
    }

    // ------------------------------------------------------------------
    // Scale settings
    // ------------------------------------------------------------------

    pub fn scale(&self) -> PlanScale {
        self.scale
    }

    /// Change the scale settings. Validation happens before anything is
    /// committed; on success every measurement is recomputed, so table,
    /// summary, and overlay labels refresh from consistent values.
    pub fn set_scale(&mut self, dpi: f32, plan_scale: f32) -> Result<(), ScaleError> {
        self.scale = PlanScale::new(dpi, plan_scale)?;
        self.store.recompute_all(&self.scale);
        Ok(())
    }

    pub fn set_dpi(&mut self, dpi: f32) -> Result<(), ScaleError> {
        self.set_scale(dpi, self.scale.plan_scale())
    }

    pub fn set_plan_scale(&mut self, plan_scale: f32) -> Result<(), ScaleError> {
        self.set_scale(self.scale.dpi(), plan_scale)
    }

    // ------------------------------------------------------------------
    // Detection handoff
    // ------------------------------------------------------------------

    /// Start a detection request. The returned token must be passed back
    /// with the response; issuing a newer request invalidates older tokens,
    /// which handles out-of-order responses from overlapping requests.
    pub fn begin_detection(&mut self) -> RequestToken {
        let token = RequestToken(self.next_request);
        self.next_request += 1;
        self.pending_request = Some(token);
        log::debug!("detection request {} started", token.0);
        token
    }

    /// Abandon the in-flight detection request, unblocking editing.
    pub fn cancel_detection(&mut self) {
        self.pending_request = None;
    }

    /// Whether user editing is currently refused (detection in flight).
    pub fn editing_blocked(&self) -> bool {
        self.pending_request.is_some()
    }

    /// Apply a detection response. Replaces the store wholesale exactly
    /// once per request; a stale token (superseded or already applied) is
    /// dropped with a warning and leaves the store untouched.
    pub fn apply_detections(&mut self, token: RequestToken, rows: Vec<NewAnnotation>) -> bool {
        if self.pending_request != Some(token) {
            log::warn!("dropping stale detection response {}", token.0);
            return false;
        }
        self.pending_request = None;
        self.store.replace_all(rows, &self.scale);
        true
    }

    // ------------------------------------------------------------------
    // Edit lifecycle
    // ------------------------------------------------------------------

    /// Enter edit mode: snapshot the store so cancel can revert.
    pub fn begin_edit(&mut self) {
        self.edit_snapshot = Some(self.store.snapshot());
        log::debug!("edit session started ({} annotations)", self.store.len());
    }

    /// Leave edit mode keeping all changes.
    pub fn commit_edit(&mut self) {
        self.edit_snapshot = None;
    }

    /// Leave edit mode discarding every change made since
    /// [`begin_edit`](Self::begin_edit).
    pub fn cancel_edit(&mut self) {
        if let Some(snapshot) = self.edit_snapshot.take() {
            self.store.restore(snapshot);
            log::info!("edit session cancelled, store reverted");
        }
    }

    // ------------------------------------------------------------------
    // Tools and input
    // ------------------------------------------------------------------

    pub fn tool(&self) -> EditorTool {
        self.editor.tool()
    }

    pub fn set_tool(&mut self, tool: EditorTool) -> EditorResponse {
        self.editor.set_tool(tool)
    }

    /// Choose the label for newly drawn shapes of a set. If an annotation
    /// of that kind is selected, it is re-labeled (and re-colored on the
    /// next render) immediately.
    pub fn set_label(&mut self, kind: LabelKind, label_id: u32) -> EditorResponse {
        match kind {
            LabelKind::Area => self.editor.set_area_label(label_id),
            LabelKind::Line => self.editor.set_line_label(label_id),
        }
        let selection_matches = self
            .store
            .selected()
            .and_then(|id| self.store.get(id))
            .is_some_and(|ann| ann.shape.label_kind() == kind);
        if selection_matches {
            return self.editor.relabel_selected(&mut self.store);
        }
        EditorResponse::NONE
    }

    /// Feed a pointer event into the interaction controller. Ignored while
    /// a detection request is in flight or before the transform is ready.
    pub fn pointer(&mut self, event: PointerEvent) -> EditorResponse {
        if self.editing_blocked() {
            log::debug!("pointer ignored: detection in flight");
            return EditorResponse::NONE;
        }
        let Some(transform) = self.transform else {
            return EditorResponse::NONE;
        };
        self.editor
            .on_pointer(event, &mut self.store, &transform, &self.scale)
    }

    /// Feed a keyboard event into the interaction controller.
    pub fn key(&mut self, event: KeyEvent) -> EditorResponse {
        if self.editing_blocked() {
            return EditorResponse::NONE;
        }
        self.editor.on_key(event, &mut self.store)
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn catalog(&self) -> &LabelCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut LabelCatalog {
        &mut self.catalog
    }

    /// Results table rows, in display order.
    pub fn table(&self) -> Vec<TableRow> {
        sync::build_table(&self.store, &self.catalog)
    }

    /// Per-label summary lines.
    pub fn summary(&self) -> Vec<SummaryLine> {
        sync::build_summary(&self.store, &self.catalog)
    }

    /// Total annotated area in m².
    pub fn total_area(&self) -> f32 {
        sync::total_area(&self.store)
    }

    /// Annotation id behind a 1-based table row index, for hover/select
    /// bridging.
    pub fn row_annotation(&self, row_index: usize) -> Option<AnnotationId> {
        if row_index == 0 {
            return None;
        }
        self.store.id_at(row_index - 1)
    }

    /// Select from the table side (click on a row).
    pub fn select_annotation(&mut self, id: Option<AnnotationId>) {
        self.store.select(id);
    }

    /// Project the store (and any in-progress drawing preview) onto a
    /// render backend. A full redraw from the store recovers the correct
    /// visual state from scratch at any time.
    pub fn render(&self, backend: &mut dyn RenderBackend) {
        let Some(transform) = self.transform.as_ref() else {
            return;
        };
        self.renderer
            .render_all(&self.store, &self.catalog, transform, backend);

        if let Some(shape) = self.editor.preview_shape(transform) {
            let kind = shape.label_kind();
            let label_id = match kind {
                LabelKind::Area => self.editor.area_label(),
                LabelKind::Line => self.editor.line_label(),
            };
            let color = self
                .catalog
                .get(kind, label_id)
                .map(|l| l.color)
                .unwrap_or(style::FALLBACK_COLOR);
            self.renderer.render_preview(&shape, color, backend);
        }
    }

    /// Toggle hover emphasis of one annotation on a backend.
    pub fn highlight(&self, id: AnnotationId, on: bool, backend: &mut dyn RenderBackend) {
        self.renderer.highlight(id, on, backend);
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Serialize the current state for the external save operation.
    pub fn capture_project(&self) -> ProjectData {
        ProjectData::capture(&self.store, self.scale, &self.catalog, self.image.clone())
    }

    pub fn save_project(&self, path: &Path) -> Result<(), SessionError> {
        self.capture_project().save(path)?;
        Ok(())
    }

    /// Load a project wholesale: scale settings, catalog, and annotations.
    pub fn load_project(&mut self, path: &Path) -> Result<(), SessionError> {
        let data = ProjectData::load(path)?;
        self.scale = data.scale;
        self.catalog = data.labels.clone();
        self.image = data.image.clone();
        self.pending_request = None;
        self.edit_snapshot = None;
        self.store.replace_all(data.rows(), &self.scale);
        Ok(())
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}
