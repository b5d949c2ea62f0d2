//! Seat-number labels.
//!
//! Labels are decorations owned by their seat: never exported, never
//! interactive, rebuilt from scratch on every load.

use seatmap_core::{
    Canvas, Decoration, DecorationKind, MergedStyle, ObjectId, OriginX, OriginY, Paint,
    SceneObject,
};

/// Draw a number label on every circle seat that has a number.
/// Returns how many labels were added.
pub fn apply_seat_numbers(canvas: &mut Canvas, style: &MergedStyle) -> usize {
    let mut added = 0;
    for idx in canvas.objects() {
        let object = &canvas.graph[idx].object;
        if !object.is_seat() || !object.is_circle() {
            continue;
        }
        let owner = object.id;
        let label = object.seat_number().map(|number| label_for(object, number, style));

        remove_labels(canvas, owner);
        if let Some(label) = label {
            canvas.add_decoration(
                label,
                Decoration {
                    owner,
                    kind: DecorationKind::SeatNumber,
                },
            );
            added += 1;
        }
    }
    log::debug!("{}: {added} seat-number labels", canvas.id());
    added
}

fn remove_labels(canvas: &mut Canvas, owner: ObjectId) {
    for idx in canvas.decorations_of(owner, DecorationKind::SeatNumber) {
        canvas.remove(idx);
    }
}

/// Text centered on the seat: `left`/`top` offset by the scaled radius.
fn label_for(seat: &SceneObject, number: &str, style: &MergedStyle) -> SceneObject {
    let radius = seat.radius.unwrap_or(style.seat_style.radius);
    let text_style = &style.seat_number_style;
    SceneObject {
        left: seat.left + radius * seat.scale_x,
        top: seat.top + radius * seat.scale_y,
        origin_x: OriginX::Center,
        origin_y: OriginY::Center,
        font_size: Some(text_style.font_size),
        font_family: Some(text_style.font_family.clone()),
        font_weight: Some(text_style.font_weight.clone()),
        fill: Some(Paint::color(&text_style.fill)),
        ..SceneObject::text(number)
    }
}
