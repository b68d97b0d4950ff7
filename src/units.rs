//! Pixel-to-meter conversion.
//!
//! All stored geometry lives in natural image pixels. Converting a pixel
//! distance into real-world meters needs the scan resolution (DPI) and the
//! architectural plan scale (the N of a 1:N drawing). This module owns that
//! conversion; every measurement in the annotation store goes through it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::annotation::Point;

/// Millimeters per inch.
const MM_PER_INCH: f32 = 25.4;

/// Errors produced when scale settings are unusable.
///
/// An invalid DPI or plan scale is a configuration error: it is rejected
/// up front instead of letting `Infinity`/`NaN` measurements leak into the
/// annotation store.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ScaleError {
    /// DPI is zero, negative, or not finite
    #[error("invalid dpi: {0} (must be a positive number)")]
    InvalidDpi(f32),

    /// Plan scale is zero, negative, or not finite
    #[error("invalid plan scale: {0} (must be a positive number)")]
    InvalidPlanScale(f32),
}

/// Validated scale settings: scan resolution and plan scale.
///
/// Construction validates both values, so a `PlanScale` in hand is always
/// safe to divide by.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScale", into = "RawScale")]
pub struct PlanScale {
    dpi: f32,
    plan_scale: f32,
}

/// Unvalidated serde carrier for [`PlanScale`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawScale {
    dpi: f32,
    plan_scale: f32,
}

impl TryFrom<RawScale> for PlanScale {
    type Error = ScaleError;

    fn try_from(raw: RawScale) -> Result<Self, ScaleError> {
        PlanScale::new(raw.dpi, raw.plan_scale)
    }
}

impl From<PlanScale> for RawScale {
    fn from(scale: PlanScale) -> Self {
        Self {
            dpi: scale.dpi,
            plan_scale: scale.plan_scale,
        }
    }
}

impl PlanScale {
    /// Create validated scale settings.
    pub fn new(dpi: f32, plan_scale: f32) -> Result<Self, ScaleError> {
        if !dpi.is_finite() || dpi <= 0.0 {
            return Err(ScaleError::InvalidDpi(dpi));
        }
        if !plan_scale.is_finite() || plan_scale <= 0.0 {
            return Err(ScaleError::InvalidPlanScale(plan_scale));
        }
        Ok(Self { dpi, plan_scale })
    }

    /// Scan resolution in dots per inch.
    pub fn dpi(&self) -> f32 {
        self.dpi
    }

    /// Plan scale denominator (100 for a 1:100 drawing).
    pub fn plan_scale(&self) -> f32 {
        self.plan_scale
    }

    /// Pixels per real-world meter.
    ///
    /// At 1:100, 1 mm on the plan is 100 mm in reality, so one real meter
    /// covers `(dpi / 25.4) * (1000 / plan_scale)` pixels.
    pub fn pixels_per_meter(&self) -> f32 {
        (self.dpi / MM_PER_INCH) * (1000.0 / self.plan_scale)
    }

    /// Convert a pixel distance to meters.
    pub fn to_meters(&self, pixel_distance: f32) -> f32 {
        pixel_distance / self.pixels_per_meter()
    }

    /// Area of an axis-aligned rectangle, in square meters.
    pub fn rectangle_area(&self, width_px: f32, height_px: f32) -> f32 {
        self.to_meters(width_px) * self.to_meters(height_px)
    }

    /// Area of a closed polygon, in square meters.
    ///
    /// Shoelace formula on the raw pixel coordinates; the pixel-space area
    /// is divided once by `pixels_per_meter²` rather than converting each
    /// point first.
    pub fn polygon_area(&self, points: &[Point]) -> f32 {
        if points.len() < 3 {
            return 0.0;
        }

        let mut area = 0.0;
        let n = points.len();
        for i in 0..n {
            let j = (i + 1) % n;
            area += points[i].x * points[j].y;
            area -= points[j].x * points[i].y;
        }
        area = area.abs() / 2.0;

        let ppm = self.pixels_per_meter();
        area / (ppm * ppm)
    }

    /// Length of an open polyline, in meters.
    pub fn line_length(&self, points: &[Point]) -> f32 {
        if points.len() < 2 {
            return 0.0;
        }

        let total: f32 = points
            .windows(2)
            .map(|pair| pair[0].distance_to(&pair[1]))
            .sum();
        self.to_meters(total)
    }
}

impl Default for PlanScale {
    /// Backend defaults: 300 DPI, 1:100.
    fn default() -> Self {
        Self {
            dpi: crate::constants::defaults::DPI,
            plan_scale: crate::constants::defaults::PLAN_SCALE,
        }
    }
}
