//! Natural-to-view coordinate mapping.
//!
//! Stored geometry lives in natural image pixels; pointer input arrives in
//! view pixels. The mapping between the two depends on how large the image
//! is currently displayed, where it sits inside the scrollable viewport,
//! and the user zoom. All of that is folded into a single [`ViewTransform`]
//! recomputed from one function, instead of scattering scale-factor math
//! across resize/scroll/zoom handlers.

use thiserror::Error;

use crate::annotation::Point;
use crate::constants::{transform as limits, zoom};

/// Errors from transform computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransformError {
    /// The image has not finished loading or the container has no size yet.
    /// Transient startup race: retry after the next layout/load event.
    #[error("image or container not ready, retry after layout")]
    NotReady,
}

/// Natural pixel dimensions of the loaded source image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NaturalSize {
    pub width: f32,
    pub height: f32,
}

impl NaturalSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// On-screen rectangle of the displayed image, relative to the scrollable
/// viewport (scroll offset already folded into `left`/`top`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl DisplayRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Bidirectional mapping between natural image space and view space.
///
/// The recommended rendering design keeps all shape geometry in natural
/// pixels and applies one scale+translate to the whole overlay container;
/// [`ViewTransform::container`] exposes exactly that transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    natural: NaturalSize,
    /// Displayed-size / natural-size per axis. Normally equal on both axes
    /// (the image is never stretched), computed independently to detect
    /// aspect-ratio mismatches.
    scale_x: f32,
    scale_y: f32,
    /// Top-left of the displayed image in view space.
    origin_x: f32,
    origin_y: f32,
    /// User zoom multiplier on top of the base view scale.
    zoom: f32,
}

/// Scale+translate applied to the overlay container as a whole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerTransform {
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

/// Clamp a zoom value to the supported range.
pub fn clamp_zoom(value: f32) -> f32 {
    value.clamp(zoom::MIN, zoom::MAX)
}

impl ViewTransform {
    /// Compute the transform from the current layout state.
    ///
    /// `displayed` is the image rectangle at zoom 1; `zoom` multiplies on
    /// top and is clamped to the supported range. Returns
    /// [`TransformError::NotReady`] while the image is unloaded
    /// (`natural` of zero) or the container has collapsed, so callers defer
    /// and retry instead of dividing by zero.
    pub fn compute(
        natural: NaturalSize,
        displayed: DisplayRect,
        zoom: f32,
    ) -> Result<Self, TransformError> {
        if natural.width <= 0.0 || natural.height <= 0.0 {
            return Err(TransformError::NotReady);
        }
        if displayed.width <= 0.0 || displayed.height <= 0.0 {
            return Err(TransformError::NotReady);
        }

        let scale_x = (displayed.width / natural.width).max(limits::MIN_VIEW_SCALE);
        let scale_y = (displayed.height / natural.height).max(limits::MIN_VIEW_SCALE);

        if (scale_x - scale_y).abs() / scale_x > limits::ASPECT_WARN_RATIO {
            log::warn!(
                "displayed image is stretched: scale x={:.4} vs y={:.4}",
                scale_x,
                scale_y
            );
        }

        Ok(Self {
            natural,
            scale_x,
            scale_y,
            origin_x: displayed.left,
            origin_y: displayed.top,
            zoom: clamp_zoom(zoom),
        })
    }

    /// Natural size of the source image.
    pub fn natural(&self) -> NaturalSize {
        self.natural
    }

    /// Current zoom multiplier.
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Effective natural-to-view scale on the x axis.
    pub fn effective_scale_x(&self) -> f32 {
        (self.scale_x * self.zoom).max(limits::MIN_VIEW_SCALE)
    }

    /// Effective natural-to-view scale on the y axis.
    pub fn effective_scale_y(&self) -> f32 {
        (self.scale_y * self.zoom).max(limits::MIN_VIEW_SCALE)
    }

    /// Map a natural-space point into view space.
    pub fn to_view(&self, p: Point) -> Point {
        Point::new(
            self.origin_x + p.x * self.effective_scale_x(),
            self.origin_y + p.y * self.effective_scale_y(),
        )
    }

    /// Map a view-space point back into natural space.
    pub fn to_natural(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.origin_x) / self.effective_scale_x(),
            (p.y - self.origin_y) / self.effective_scale_y(),
        )
    }

    /// Convert a view-space distance (a tolerance radius, a minimum size)
    /// into natural space. Uses the x axis; the axes only diverge on a
    /// stretched image, which is already warned about.
    pub fn to_natural_distance(&self, view_distance: f32) -> f32 {
        view_distance / self.effective_scale_x()
    }

    /// The single scale+translate to apply to the overlay container so that
    /// children keep their natural-pixel coordinates.
    pub fn container(&self) -> ContainerTransform {
        ContainerTransform {
            translate_x: self.origin_x,
            translate_y: self.origin_y,
            scale_x: self.effective_scale_x(),
            scale_y: self.effective_scale_y(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn transform(zoom: f32) -> ViewTransform {
        ViewTransform::compute(
            NaturalSize::new(2000.0, 1500.0),
            DisplayRect::new(40.0, 25.0, 1000.0, 750.0),
            zoom,
        )
        .unwrap()
    }

    #[test]
    fn test_identity_mapping_at_full_size() {
        let t = ViewTransform::compute(
            NaturalSize::new(800.0, 600.0),
            DisplayRect::new(0.0, 0.0, 800.0, 600.0),
            1.0,
        )
        .unwrap();
        let p = Point::new(123.0, 456.0);
        let v = t.to_view(p);
        assert!(approx_eq(v.x, 123.0));
        assert!(approx_eq(v.y, 456.0));
    }

    #[test]
    fn test_scaled_mapping() {
        let t = transform(1.0);
        // Image is displayed at half size with a (40, 25) offset
        let v = t.to_view(Point::new(200.0, 100.0));
        assert!(approx_eq(v.x, 40.0 + 100.0));
        assert!(approx_eq(v.y, 25.0 + 50.0));
    }

    #[test]
    fn test_round_trip() {
        // naturalToView(viewToNatural(p)) ~= p for arbitrary transform state
        for &zoom in &[0.1, 0.5, 1.0, 2.5, 5.0] {
            let t = transform(zoom);
            for &(x, y) in &[(0.0, 0.0), (17.3, 912.8), (1999.0, 1.0), (640.5, 480.25)] {
                let p = Point::new(x, y);
                let back = t.to_natural(t.to_view(p));
                assert!(approx_eq(back.x, p.x), "x mismatch at zoom {zoom}");
                assert!(approx_eq(back.y, p.y), "y mismatch at zoom {zoom}");
            }
        }
    }

    #[test]
    fn test_round_trip_view_side() {
        let t = transform(1.7);
        let v = Point::new(312.0, 64.0);
        let back = t.to_view(t.to_natural(v));
        assert!(approx_eq(back.x, v.x));
        assert!(approx_eq(back.y, v.y));
    }

    #[test]
    fn test_zoom_scales_mapping() {
        let t1 = transform(1.0);
        let t2 = transform(2.0);
        let p = Point::new(100.0, 100.0);
        let v1 = t1.to_view(p);
        let v2 = t2.to_view(p);
        // Distances from the origin double with zoom
        assert!(approx_eq((v2.x - 40.0) / (v1.x - 40.0), 2.0));
        assert!(approx_eq((v2.y - 25.0) / (v1.y - 25.0), 2.0));
    }

    #[test]
    fn test_zoom_is_clamped() {
        let t = transform(100.0);
        assert_eq!(t.zoom(), crate::constants::zoom::MAX);
        let t = transform(0.0001);
        assert_eq!(t.zoom(), crate::constants::zoom::MIN);
    }

    #[test]
    fn test_unloaded_image_is_not_ready() {
        let err = ViewTransform::compute(
            NaturalSize::new(0.0, 0.0),
            DisplayRect::new(0.0, 0.0, 100.0, 100.0),
            1.0,
        );
        assert_eq!(err, Err(TransformError::NotReady));
    }

    #[test]
    fn test_collapsed_container_is_not_ready() {
        let err = ViewTransform::compute(
            NaturalSize::new(800.0, 600.0),
            DisplayRect::new(0.0, 0.0, 0.0, 600.0),
            1.0,
        );
        assert_eq!(err, Err(TransformError::NotReady));
    }

    #[test]
    fn test_scale_floor() {
        // A 10000px image squeezed into 100px would scale at 0.01; the
        // floor keeps shapes legible instead
        let t = ViewTransform::compute(
            NaturalSize::new(10000.0, 10000.0),
            DisplayRect::new(0.0, 0.0, 100.0, 100.0),
            1.0,
        )
        .unwrap();
        assert!(t.effective_scale_x() >= limits::MIN_VIEW_SCALE);
        assert!(t.effective_scale_y() >= limits::MIN_VIEW_SCALE);
    }

    #[test]
    fn test_container_transform_matches_point_mapping() {
        let t = transform(1.5);
        let c = t.container();
        let p = Point::new(321.0, 123.0);
        let via_container = Point::new(
            c.translate_x + p.x * c.scale_x,
            c.translate_y + p.y * c.scale_y,
        );
        let direct = t.to_view(p);
        assert!(approx_eq(via_container.x, direct.x));
        assert!(approx_eq(via_container.y, direct.y));
    }

    #[test]
    fn test_natural_distance_conversion() {
        let t = transform(1.0); // effective scale 0.5
        assert!(approx_eq(t.to_natural_distance(10.0), 20.0));
    }
}
