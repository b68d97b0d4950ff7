//! Detection-response ingestion.
//!
//! The detection backend returns predictions whose geometry payload is one
//! of a bounding box (`box` or `bbox`), a polygon point-list, or a line
//! point-list. The duck-typing is resolved here, exactly once, into the
//! tagged [`Shape`] union; the rest of the crate never checks for payload
//! presence again.
//!
//! Also ports the backend's extended non-maximum suppression so that
//! prediction files loaded locally get the same overlap cleanup the server
//! applies.

use serde::{Deserialize, Serialize};

use crate::annotation::{
    MIN_LINE_VERTICES, MIN_POLYGON_VERTICES, NewAnnotation, Point, Rect, Shape, Source,
};
use crate::units::PlanScale;

/// Point list as the backend encodes it: parallel x/y arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointList {
    pub all_points_x: Vec<f32>,
    pub all_points_y: Vec<f32>,
}

impl PointList {
    /// Zip the parallel arrays into points. Extra entries in the longer
    /// array are dropped.
    pub fn points(&self) -> Vec<Point> {
        self.all_points_x
            .iter()
            .zip(self.all_points_y.iter())
            .map(|(&x, &y)| Point::new(x, y))
            .collect()
    }

    pub fn from_points(points: &[Point]) -> Self {
        Self {
            all_points_x: points.iter().map(|p| p.x).collect(),
            all_points_y: points.iter().map(|p| p.y).collect(),
        }
    }
}

/// One prediction as returned by the detection endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Bounding box `[x1, y1, x2, y2]`; older responses use `bbox`
    #[serde(default, rename = "box", alias = "bbox", skip_serializing_if = "Option::is_none")]
    pub rect: Option<[f32; 4]>,

    /// Polygon point list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<PointList>,

    /// Line point list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<PointList>,

    /// Numeric label id into the applicable label set
    pub label: u32,

    /// Confidence score in [0, 1]
    #[serde(default)]
    pub score: f32,

    /// Server-computed area in m² (area shapes only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f32>,

    /// Server-computed length in m (lines only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f32>,
}

impl Prediction {
    /// Resolve the geometry payload into the tagged shape union.
    ///
    /// Not every payload field is populated; the first present and valid
    /// one wins, in box → polygon → line order. Returns `None` for
    /// predictions carrying no usable geometry.
    pub fn shape(&self) -> Option<Shape> {
        if let Some([x1, y1, x2, y2]) = self.rect {
            let rect = Rect::from_corners(Point::new(x1, y1), Point::new(x2, y2));
            if rect.width() > 0.0 && rect.height() > 0.0 {
                return Some(Shape::Rectangle(rect));
            }
            log::warn!("skipping degenerate box prediction: {:?}", self.rect);
            return None;
        }
        if let Some(polygon) = &self.polygon {
            let points = polygon.points();
            if points.len() >= MIN_POLYGON_VERTICES {
                return Some(Shape::Polygon(points));
            }
            log::warn!("skipping polygon with {} points", points.len());
            return None;
        }
        if let Some(line) = &self.line {
            let points = line.points();
            if points.len() >= MIN_LINE_VERTICES {
                return Some(Shape::Line(points));
            }
            log::warn!("skipping line with {} points", points.len());
            return None;
        }
        None
    }
}

/// Full response body of the detection endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResponse {
    pub predictions: Vec<Prediction>,
    /// Server-side sum of all prediction areas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_area: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl DetectionResponse {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Convert a detection response into store rows.
///
/// Predictions below `threshold` are dropped, geometry is resolved to the
/// tagged union, and measurements are recomputed locally from the geometry
/// (the server-computed value is only cross-checked, so stored measurements
/// can never disagree with stored geometry).
pub fn to_annotations(
    response: &DetectionResponse,
    threshold: f32,
    scale: &PlanScale,
) -> Vec<NewAnnotation> {
    let mut rows = Vec::with_capacity(response.predictions.len());
    for pred in &response.predictions {
        if pred.score < threshold {
            continue;
        }
        let Some(shape) = pred.shape() else {
            log::warn!("prediction with label {} has no usable geometry", pred.label);
            continue;
        };

        if let Some(server_area) = pred.area {
            let local = shape.measure(scale).value();
            if (local - server_area).abs() > 0.05 {
                log::debug!(
                    "server area {:.2} differs from local {:.2} for label {}",
                    server_area,
                    local,
                    pred.label
                );
            }
        }

        rows.push(NewAnnotation {
            shape,
            label_id: pred.label,
            score: pred.score,
            source: Source::Detected,
        });
    }
    log::info!(
        "ingested {} of {} predictions (threshold {:.2})",
        rows.len(),
        response.predictions.len(),
        threshold
    );
    rows
}

// ============================================================================
// Overlap suppression
// ============================================================================

/// Overlap metrics between two rectangles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlap {
    /// Intersection over union
    pub iou: f32,
    /// Intersection area in px²
    pub overlap_area: f32,
    /// Share of `a` covered by the intersection
    pub a_ratio: f32,
    /// Share of `b` covered by the intersection
    pub b_ratio: f32,
}

/// Compute overlap metrics between two rectangles.
pub fn overlap_metrics(a: &Rect, b: &Rect) -> Overlap {
    let x_left = a.x1.max(b.x1);
    let y_top = a.y1.max(b.y1);
    let x_right = a.x2.min(b.x2);
    let y_bottom = a.y2.min(b.y2);

    let a_area = a.width() * a.height();
    let b_area = b.width() * b.height();

    if x_right < x_left || y_bottom < y_top {
        return Overlap {
            iou: 0.0,
            overlap_area: 0.0,
            a_ratio: 0.0,
            b_ratio: 0.0,
        };
    }

    let intersection = (x_right - x_left) * (y_bottom - y_top);
    let union = a_area + b_area - intersection;
    Overlap {
        iou: if union > 0.0 { intersection / union } else { 0.0 },
        overlap_area: intersection,
        a_ratio: if a_area > 0.0 { intersection / a_area } else { 0.0 },
        b_ratio: if b_area > 0.0 { intersection / b_area } else { 0.0 },
    }
}

/// Check if `inner` is (almost) fully contained in `outer`, within a pixel
/// tolerance.
pub fn is_contained(inner: &Rect, outer: &Rect, tolerance: f32) -> bool {
    inner.x1 >= outer.x1 - tolerance
        && inner.y1 >= outer.y1 - tolerance
        && inner.x2 <= outer.x2 + tolerance
        && inner.y2 <= outer.y2 + tolerance
}

/// Parameters for [`apply_nms`]. Defaults match the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NmsParams {
    /// Plain IoU suppression threshold
    pub iou_threshold: f32,
    /// Relative-overlap suppression threshold
    pub overlap_ratio_threshold: f32,
    /// Containment tolerance in pixels
    pub tolerance: f32,
}

impl Default for NmsParams {
    fn default() -> Self {
        Self {
            iou_threshold: 0.5,
            overlap_ratio_threshold: 0.7,
            tolerance: 5.0,
        }
    }
}

/// Extended non-maximum suppression over rectangle rows.
///
/// Walks rectangles in descending score order; a lower-scored rectangle of
/// the same label is suppressed when any of three criteria hits: IoU above
/// the threshold, (near-)containment in the kept rectangle, or a large
/// share of the smaller rectangle overlapping the kept one. Non-rectangle
/// rows pass through untouched. Output preserves the input order.
pub fn apply_nms(rows: Vec<NewAnnotation>, params: NmsParams) -> Vec<NewAnnotation> {
    let rects: Vec<(usize, Rect, u32, f32)> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| match &row.shape {
            Shape::Rectangle(r) => Some((i, *r, row.label_id, row.score)),
            _ => None,
        })
        .collect();

    let mut order: Vec<usize> = (0..rects.len()).collect();
    order.sort_by(|&a, &b| rects[b].3.total_cmp(&rects[a].3));

    let mut suppressed = vec![false; rects.len()];
    for (pos, &current) in order.iter().enumerate() {
        if suppressed[current] {
            continue;
        }
        let (_, current_rect, current_label, _) = rects[current];
        for &candidate in order.iter().skip(pos + 1) {
            if suppressed[candidate] {
                continue;
            }
            let (_, rect, label, _) = rects[candidate];
            if label != current_label {
                continue;
            }
            let overlap = overlap_metrics(&current_rect, &rect);
            let current_area = current_rect.width() * current_rect.height();
            let candidate_area = rect.width() * rect.height();

            let suppress = overlap.iou > params.iou_threshold
                || is_contained(&rect, &current_rect, params.tolerance)
                || (overlap.b_ratio > params.overlap_ratio_threshold
                    && candidate_area < current_area);
            if suppress {
                suppressed[candidate] = true;
            }
        }
    }

    let mut dropped: Vec<usize> = Vec::new();
    for (j, &(i, ..)) in rects.iter().enumerate() {
        if suppressed[j] {
            dropped.push(i);
        }
    }
    if !dropped.is_empty() {
        log::info!("suppressed {} overlapping boxes", dropped.len());
    }

    rows.into_iter()
        .enumerate()
        .filter(|(i, _)| !dropped.contains(i))
        .map(|(_, row)| row)
        .collect()
}
