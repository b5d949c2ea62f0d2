//! Hit testing: point → canvas object lookup.
//!
//! Reverse-walks the top-level draw order (front-to-back) to find which
//! object is at a given (x, y) canvas position. Only evented objects take
//! part; inert ones (background, non-seats in customer mode, decorations)
//! are transparent to the pointer.

use crate::geometry::{LocalShape, world_bounds, world_transform};
use kurbo::Point;
use seatmap_core::{Canvas, NodeIndex, ObjectType};

/// Find the topmost evented top-level object at (px, py).
/// Returns `None` if nothing is hit (empty canvas area).
pub fn hit_test(canvas: &Canvas, px: f64, py: f64) -> Option<NodeIndex> {
    canvas
        .top_level()
        .iter()
        .rev()
        .copied()
        .find(|&idx| canvas.graph[idx].interaction.evented && contains(canvas, idx, px, py))
}

/// Whether (px, py) lies inside the object's outline. Groups are hit through
/// their box or any of their children.
fn contains(canvas: &Canvas, idx: NodeIndex, px: f64, py: f64) -> bool {
    let object = &canvas.graph[idx].object;
    let local = world_transform(canvas, idx).inverse() * Point::new(px, py);
    if LocalShape::of(object).contains(local) {
        return true;
    }
    object.kind == ObjectType::Group
        && canvas
            .children(idx)
            .into_iter()
            .any(|child| contains(canvas, child, px, py))
}

/// Find all selectable top-level objects whose bounds intersect the given
/// rectangle. Used for marquee (box) selection; empty when the canvas has
/// marquee selection turned off.
pub fn hit_test_rect(canvas: &Canvas, rx: f64, ry: f64, rw: f64, rh: f64) -> Vec<NodeIndex> {
    if !canvas.settings.selection {
        return Vec::new();
    }
    canvas
        .top_level()
        .iter()
        .copied()
        .filter(|&idx| canvas.graph[idx].interaction.selectable)
        .filter(|&idx| world_bounds(canvas, idx).intersects_rect(rx, ry, rw, rh))
        .collect()
}
