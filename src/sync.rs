//! Dependent-UI synchronization: the results table and the per-label
//! summary.
//!
//! Both views are pure projections of the annotation store, rebuilt after
//! every user-visible mutation (draw, edit, delete, relabel, scale change).
//! A stale table or summary is a correctness bug, not a cosmetic one, so
//! hosts rebuild on every store change rather than patching rows.

use serde::Serialize;

use crate::annotation::{AnnotationId, AnnotationStore, Measurement};
use crate::catalog::{LabelCatalog, LabelKind};

/// One row of the results table, in display-index order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    /// 1-based display index, as shown to the user
    pub index: usize,
    /// Stable annotation id, for hover/select bridging to the overlay
    pub id: AnnotationId,
    pub label_name: String,
    pub kind: &'static str,
    pub score: f32,
    pub measurement: Measurement,
}

impl TableRow {
    /// Score as a percentage, one decimal: `87.0%`.
    pub fn score_text(&self) -> String {
        format!("{:.1}%", self.score * 100.0)
    }

    /// Measurement with unit suffix, two decimals.
    pub fn measurement_text(&self) -> String {
        self.measurement.text()
    }
}

/// Display name of an annotation's label, falling back to "Other" for ids
/// missing from the catalog.
fn label_name(catalog: &LabelCatalog, kind: LabelKind, id: u32) -> String {
    catalog
        .get(kind, id)
        .map(|l| l.name.clone())
        .unwrap_or_else(|| "Other".to_string())
}

/// Build the results table: one row per annotation in display order.
pub fn build_table(store: &AnnotationStore, catalog: &LabelCatalog) -> Vec<TableRow> {
    store
        .iter()
        .enumerate()
        .map(|(i, ann)| TableRow {
            index: i + 1,
            id: ann.id,
            label_name: label_name(catalog, ann.shape.label_kind(), ann.label_id),
            kind: ann.shape.kind_name(),
            score: ann.score,
            measurement: ann.measurement,
        })
        .collect()
}

/// One line of the per-label summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryLine {
    pub label_name: String,
    pub kind: LabelKind,
    pub count: usize,
    /// Summed area in m² for area labels, summed length in m for line
    /// labels
    pub total: f32,
}

impl SummaryLine {
    /// Rendered summary line, e.g. `Window: 3 (4.52 m²)`.
    pub fn text(&self) -> String {
        let unit = match self.kind {
            LabelKind::Area => "m²",
            LabelKind::Line => "m",
        };
        format!("{}: {} ({:.2} {})", self.label_name, self.count, self.total, unit)
    }
}

/// Build the per-label summary.
///
/// Labels are walked in catalog order, area set first; zero-count labels
/// are omitted entirely. Lines are tallied by summed length and never enter
/// an area total. Annotations whose label id is missing from the catalog
/// land in a trailing "Other" bucket per kind.
pub fn build_summary(store: &AnnotationStore, catalog: &LabelCatalog) -> Vec<SummaryLine> {
    let mut lines = Vec::new();

    for kind in [LabelKind::Area, LabelKind::Line] {
        for label in catalog.labels(kind) {
            let mut count = 0;
            let mut total = 0.0;
            for ann in store.iter() {
                if ann.shape.label_kind() == kind && ann.label_id == label.id {
                    count += 1;
                    total += ann.measurement.value();
                }
            }
            if count > 0 {
                lines.push(SummaryLine {
                    label_name: label.name.clone(),
                    kind,
                    count,
                    total,
                });
            }
        }

        // Unknown label ids
        let mut count = 0;
        let mut total = 0.0;
        for ann in store.iter() {
            if ann.shape.label_kind() == kind && catalog.get(kind, ann.label_id).is_none() {
                count += 1;
                total += ann.measurement.value();
            }
        }
        if count > 0 {
            lines.push(SummaryLine {
                label_name: "Other".to_string(),
                kind,
                count,
                total,
            });
        }
    }

    lines
}

/// Total annotated area in m², across all area annotations.
pub fn total_area(store: &AnnotationStore) -> f32 {
    store
        .iter()
        .filter_map(|ann| match ann.measurement {
            Measurement::Area(v) => Some(v),
            Measurement::Length(_) => None,
        })
        .sum()
}
