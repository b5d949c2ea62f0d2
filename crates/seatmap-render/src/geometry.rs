//! Canvas object geometry.
//!
//! Every object is drawn in a local frame whose origin is the top-left of its
//! unscaled box. [`world_transform`] maps that frame to canvas coordinates,
//! folding in the origin anchor, the object's scale, and for group children
//! the parent's transform (children are positioned relative to the group's
//! center).

use kurbo::{Affine, Circle, Ellipse, Point, Rect, Shape};
use seatmap_core::{Bounds, Canvas, NodeIndex, ObjectType, SceneObject};

/// Unscaled width/height of an object's box.
pub fn local_size(object: &SceneObject) -> (f64, f64) {
    let (w, h) = object.size();
    (unscale(w, object.scale_x), unscale(h, object.scale_y))
}

fn unscale(v: f64, scale: f64) -> f64 {
    if scale.abs() < f64::EPSILON { 0.0 } else { v / scale }
}

/// Transform from the object's parent frame into its local frame.
pub fn local_transform(object: &SceneObject) -> Affine {
    let (w, h) = object.size();
    let x = object.left - w * object.origin_x.factor();
    let y = object.top - h * object.origin_y.factor();
    Affine::translate((x, y)) * Affine::scale_non_uniform(object.scale_x, object.scale_y)
}

/// Transform from the object's local frame into canvas coordinates.
pub fn world_transform(canvas: &Canvas, idx: NodeIndex) -> Affine {
    let local = local_transform(&canvas.graph[idx].object);
    match canvas.parent(idx) {
        Some(parent) => {
            let (pw, ph) = local_size(&canvas.graph[parent].object);
            world_transform(canvas, parent) * Affine::translate((pw / 2.0, ph / 2.0)) * local
        }
        None => local,
    }
}

/// The object's outline in its local frame.
pub enum LocalShape {
    Circle(Circle),
    Ellipse(Ellipse),
    Rect(Rect),
}

impl LocalShape {
    pub fn of(object: &SceneObject) -> Self {
        let (w, h) = local_size(object);
        match (&object.kind, object.radius) {
            (ObjectType::Circle, Some(r)) => Self::Circle(Circle::new((r, r), r)),
            (ObjectType::Ellipse, _) => {
                Self::Ellipse(Ellipse::new((w / 2.0, h / 2.0), (w / 2.0, h / 2.0), 0.0))
            }
            _ => Self::Rect(Rect::new(0.0, 0.0, w, h)),
        }
    }

    pub fn contains(&self, pt: Point) -> bool {
        match self {
            Self::Circle(c) => c.contains(pt),
            Self::Ellipse(e) => e.contains(pt),
            Self::Rect(r) => r.contains(pt),
        }
    }

    pub fn bounding_box(&self) -> Rect {
        match self {
            Self::Circle(c) => c.bounding_box(),
            Self::Ellipse(e) => e.bounding_box(),
            Self::Rect(r) => *r,
        }
    }
}

/// Axis-aligned canvas-space box of an object.
pub fn world_bounds(canvas: &Canvas, idx: NodeIndex) -> Bounds {
    let object = &canvas.graph[idx].object;
    let rect = world_transform(canvas, idx).transform_rect_bbox(LocalShape::of(object).bounding_box());
    Bounds {
        x: rect.x0,
        y: rect.y0,
        width: rect.width(),
        height: rect.height(),
    }
}

/// Canvas-space center of an object's box.
pub fn world_center(canvas: &Canvas, idx: NodeIndex) -> (f64, f64) {
    world_bounds(canvas, idx).center()
}
