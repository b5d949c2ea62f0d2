//! Organizer editing commands.
//!
//! Used when the loader drives the layout editor: recategorize seats, set
//! their sale status, and export the document for saving. Selected seats
//! keep their highlight across edits, and the export writes their original
//! stroke rather than the highlight.

use crate::selection::SelectionTable;
use seatmap_core::{
    CategoryIndex, CategoryRef, Canvas, ObjectId, Paint, SceneDocument, SceneObject, SeatStatus,
    paint_seat,
};

/// Put `ids` in `category` and repaint them. An unknown category leaves
/// the seats uncategorized and available. Returns how many seats changed.
pub fn assign_category(
    canvas: &mut Canvas,
    table: &mut SelectionTable,
    ids: &[ObjectId],
    category: Option<CategoryRef>,
    categories: &CategoryIndex,
) -> usize {
    let category = category.filter(|c| {
        let known = categories.contains(c);
        if !known {
            log::warn!("unknown category {c}, seats left uncategorized");
        }
        known
    });

    let mut changed = 0;
    for &id in ids {
        let Some(idx) = canvas.index_of(id) else {
            continue;
        };
        if !canvas.graph[idx].object.is_seat() {
            continue;
        }

        // Drop the highlight while repainting so the new backup is the real stroke.
        let reselect = table.deselect(canvas, id);

        let object = &mut canvas.graph[idx].object;
        object.category = category.clone();
        if category.is_none() {
            object.status = Some(SeatStatus::Available);
        }
        object.mirror_attributes();

        let original = paint_seat(canvas, idx, categories);
        table.set_original_stroke(id, original);
        if reselect {
            table.select(canvas, id);
        }
        changed += 1;
    }
    log::debug!("{}: recategorized {changed} seats", canvas.id());
    changed
}

/// Set the sale status of `ids`. Returns how many seats changed.
pub fn set_status(canvas: &mut Canvas, ids: &[ObjectId], status: SeatStatus) -> usize {
    let mut changed = 0;
    for &id in ids {
        let Some(idx) = canvas.index_of(id) else {
            continue;
        };
        let object = &mut canvas.graph[idx].object;
        if !object.is_seat() {
            continue;
        }
        object.status = Some(status.clone());
        object.mirror_attributes();
        changed += 1;
    }
    changed
}

/// The document as it should be saved: no decorations, attributes in sync,
/// and selected seats carrying their original stroke.
pub fn export_document(canvas: &Canvas, table: &SelectionTable) -> SceneDocument {
    let mut document = canvas.to_document();
    for object in document.objects.iter_mut().filter(|o| o.is_seat()) {
        object.mirror_attributes();
        if table.is_selected(object.id) {
            let stroke = table
                .original_stroke(object.id)
                .cloned()
                .unwrap_or_else(Paint::black);
            restore_body(object, stroke);
        }
    }
    document
}

fn restore_body(seat: &mut SceneObject, stroke: Paint) {
    let body = match seat.objects.iter().position(SceneObject::is_circle) {
        Some(pos) => &mut seat.objects[pos],
        None => seat,
    };
    body.stroke = Some(stroke);
    body.stroke_width = Some(crate::selection::DESELECTED_STROKE_WIDTH);
}
