//! Reconciliation pass: merge a freshly loaded canvas with backend truth.
//!
//! Runs once per layout load, over top-level objects only. Group children
//! are looked at for styling (a group seat paints its inner circle) but never
//! get a category or status of their own.
//!
//! Precedence for a seat's `(category, status)`:
//!
//! 1. An existing seat record for the object's id overrides whatever the
//!    document embedded.
//! 2. A category that is not in the valid set is cleared, and the seat goes
//!    back to `available`.
//!
//! Nothing here fails. Missing ids are generated, missing statuses become
//! `available`, and unknown categories render as uncategorized.

use crate::canvas::{Canvas, Interaction};
use crate::category::{CategoryIndex, ExistingSeat, SeatIndex, TicketCategory};
use crate::id::ObjectId;
use crate::model::{Paint, SeatStatus};
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

/// What the pass did, for the loader and for diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub has_background: bool,
    pub background: Option<NodeIndex>,
    /// Stroke each seat had before any selection highlight.
    pub original_strokes: HashMap<ObjectId, Paint>,
    pub seats_total: usize,
    /// Seats whose category/status came from a backend record.
    pub seats_overridden: usize,
    pub categories_cleared: usize,
    pub ids_generated: usize,
}

/// Reconcile every top-level object on `canvas`.
pub fn reconcile(
    canvas: &mut Canvas,
    existing_seats: &[ExistingSeat],
    categories: &[TicketCategory],
) -> ReconcileReport {
    let seat_index = SeatIndex::build(existing_seats);
    let category_index = CategoryIndex::new(categories);
    let mut report = ReconcileReport::default();

    for idx in canvas.objects() {
        if canvas.graph[idx].object.id.is_empty() {
            let id = ObjectId::generate_unique(|id| canvas.contains_id(id));
            canvas.assign_id(idx, id);
            report.ids_generated += 1;
        }

        let object = &mut canvas.graph[idx].object;
        if !object.is_seat() {
            continue;
        }
        report.seats_total += 1;

        if let Some(record) = seat_index.as_ref().and_then(|s| s.get(object.id)) {
            object.category = record.ticket_category_id.clone();
            object.status = Some(record.status.clone().unwrap_or_default());
            report.seats_overridden += 1;
        }

        if let Some(category) = &object.category
            && !category_index.contains(category)
        {
            log::trace!("seat {}: category {category} no longer valid", object.id);
            object.category = None;
            object.status = Some(SeatStatus::Available);
            report.categories_cleared += 1;
        }

        if object.status.is_none() {
            object.status = Some(SeatStatus::Available);
        }
        object.mirror_attributes();

        let id = object.id;
        let original = paint_seat(canvas, idx, &category_index);
        report.original_strokes.insert(id, original);
    }

    let backgrounds: Vec<NodeIndex> = canvas
        .objects()
        .into_iter()
        .filter(|&idx| canvas.graph[idx].object.is_background())
        .collect();
    if backgrounds.len() > 1 {
        log::warn!(
            "{}: {} layout backgrounds, using the first",
            canvas.id(),
            backgrounds.len()
        );
    }
    if let Some(&bg) = backgrounds.first() {
        canvas.send_to_back(bg);
        canvas.graph[bg].interaction = Interaction::locked();
        report.has_background = true;
        report.background = Some(bg);
    }

    log::debug!(
        "{}: reconciled {} seats ({} from backend, {} categories cleared, {} ids generated)",
        canvas.id(),
        report.seats_total,
        report.seats_overridden,
        report.categories_cleared,
        report.ids_generated
    );
    report
}

/// Paint a seat's body from its category and return the stroke to restore
/// on deselect.
///
/// Known category: fill and stroke take the category color. Otherwise the
/// fill goes transparent and the existing stroke (or black) is kept.
pub fn paint_seat(canvas: &mut Canvas, idx: NodeIndex, categories: &CategoryIndex) -> Paint {
    let color = canvas.graph[idx]
        .object
        .category
        .as_ref()
        .and_then(|c| categories.color(c))
        .map(str::to_string);
    let body = canvas.body(idx);
    let object = &mut canvas.graph[body].object;

    match color {
        Some(color) => {
            object.fill = Some(Paint::color(&color));
            object.stroke = Some(Paint::color(&color));
            Paint::Color(color)
        }
        None => {
            object.fill = Some(Paint::transparent());
            object.stroke.clone().unwrap_or_else(Paint::black)
        }
    }
}
