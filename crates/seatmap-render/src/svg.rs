//! Canvas → SVG string, for read-only previews and thumbnails.
//!
//! Draws the top-level stack in order, groups recursively, each object in
//! its local frame under a `matrix(...)` transform nested inside its
//! parent's.

use crate::geometry::{LocalShape, local_size, local_transform, world_bounds};
use kurbo::Affine;
use seatmap_core::{Canvas, NodeIndex, ObjectType, Paint, SceneObject};
use serde_json::Value;
use std::fmt::Write;

/// Preview options.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgOptions {
    /// Space around the drawing, in canvas units.
    pub padding: f64,
    /// Draw checkmarks and seat-number labels.
    pub include_decorations: bool,
    /// Backdrop color; `None` leaves the SVG transparent.
    pub background: Option<String>,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            padding: 16.0,
            include_decorations: true,
            background: None,
        }
    }
}

pub fn render_svg(canvas: &Canvas, options: &SvgOptions) -> String {
    let roots: Vec<NodeIndex> = canvas
        .top_level()
        .iter()
        .copied()
        .filter(|&idx| options.include_decorations || !canvas.graph[idx].exclude_from_export())
        .collect();

    let mut min_x = f64::MAX;
    let mut min_y = f64::MAX;
    let mut max_x = f64::MIN;
    let mut max_y = f64::MIN;
    for &idx in &roots {
        let b = world_bounds(canvas, idx);
        min_x = min_x.min(b.x);
        min_y = min_y.min(b.y);
        max_x = max_x.max(b.x + b.width);
        max_y = max_y.max(b.y + b.height);
    }
    if roots.is_empty() {
        (min_x, min_y, max_x, max_y) = (0.0, 0.0, 800.0, 600.0);
    }

    let pad = options.padding;
    let width = max_x - min_x + pad * 2.0;
    let height = max_y - min_y + pad * 2.0;
    let offset_x = min_x - pad;
    let offset_y = min_y - pad;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">"
    );
    if let Some(bg) = &options.background {
        let _ = writeln!(
            svg,
            "<rect width=\"{width}\" height=\"{height}\" fill=\"{}\" />",
            escape(bg)
        );
    }
    let _ = writeln!(svg, "<g transform=\"translate({}, {})\">", -offset_x, -offset_y);
    for &idx in &roots {
        render_object(&mut svg, canvas, idx, Affine::IDENTITY);
    }
    svg.push_str("</g>\n</svg>");
    svg
}

fn render_object(out: &mut String, canvas: &Canvas, idx: NodeIndex, parent: Affine) {
    let object = &canvas.graph[idx].object;
    let transform = parent * local_transform(object);
    let opacity = object.opacity.unwrap_or(1.0);

    let _ = write!(out, "<g transform=\"{}\"", matrix(transform));
    if opacity < 1.0 {
        let _ = write!(out, " opacity=\"{opacity}\"");
    }
    out.push_str(">\n");

    let paint = paint_attrs(object);
    match &object.kind {
        ObjectType::Circle | ObjectType::Ellipse | ObjectType::Rect => {
            match LocalShape::of(object) {
                LocalShape::Circle(c) => {
                    let _ = writeln!(
                        out,
                        "  <circle cx=\"{}\" cy=\"{}\" r=\"{}\"{paint} />",
                        c.center.x, c.center.y, c.radius
                    );
                }
                LocalShape::Ellipse(e) => {
                    let center = e.center();
                    let radii = e.radii();
                    let _ = writeln!(
                        out,
                        "  <ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\"{paint} />",
                        center.x, center.y, radii.x, radii.y
                    );
                }
                LocalShape::Rect(r) => {
                    let _ = writeln!(
                        out,
                        "  <rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\"{paint} />",
                        r.width(),
                        r.height()
                    );
                }
            }
        }
        ObjectType::Text | ObjectType::IText | ObjectType::Textbox => {
            render_text(out, object);
        }
        ObjectType::Image => {
            if let Some(src) = object.extra.get("src").and_then(Value::as_str) {
                let (w, h) = local_size(object);
                let _ = writeln!(
                    out,
                    "  <image href=\"{}\" width=\"{w}\" height=\"{h}\" />",
                    escape(src)
                );
            }
        }
        ObjectType::Group => {
            // Children are placed relative to the group's center.
            let (w, h) = local_size(object);
            let center = Affine::translate((w / 2.0, h / 2.0));
            for child in canvas.children(idx) {
                render_object(out, canvas, child, center);
            }
        }
        other => {
            log::trace!("svg: skipping {} @{}", other.as_str(), object.id);
        }
    }
    out.push_str("</g>\n");
}

fn render_text(out: &mut String, object: &SceneObject) {
    let Some(text) = object.text.as_deref() else {
        return;
    };
    let (w, h) = local_size(object);
    let font_size = object.font_size.unwrap_or(16.0);
    let fill = object
        .fill
        .as_ref()
        .map_or_else(|| "#000000".to_string(), paint_to_svg_color);

    let _ = write!(
        out,
        "  <text x=\"{}\" y=\"{}\" font-size=\"{font_size}\" fill=\"{}\" text-anchor=\"middle\" dominant-baseline=\"central\"",
        w / 2.0,
        h / 2.0,
        escape(&fill)
    );
    if let Some(family) = &object.font_family {
        let _ = write!(out, " font-family=\"{}\"", escape(family));
    }
    match &object.font_weight {
        Some(Value::String(weight)) => {
            let _ = write!(out, " font-weight=\"{}\"", escape(weight));
        }
        Some(Value::Number(weight)) => {
            let _ = write!(out, " font-weight=\"{weight}\"");
        }
        _ => {}
    }
    let _ = writeln!(out, ">{}</text>", escape(text));
}

fn paint_attrs(object: &SceneObject) -> String {
    let fill = object
        .fill
        .as_ref()
        .map_or_else(|| "none".to_string(), paint_to_svg_color);
    let mut attrs = format!(" fill=\"{}\"", escape(&fill));
    if let Some(stroke) = &object.stroke {
        let _ = write!(
            attrs,
            " stroke=\"{}\" stroke-width=\"{}\"",
            escape(&paint_to_svg_color(stroke)),
            object.stroke_width.unwrap_or(1.0)
        );
        if object.stroke_uniform {
            attrs.push_str(" vector-effect=\"non-scaling-stroke\"");
        }
    }
    attrs
}

/// CSS color for SVG attributes. Gradients are flattened to their first stop.
fn paint_to_svg_color(paint: &Paint) -> String {
    match paint {
        Paint::Color(c) => c.clone(),
        Paint::Gradient(g) => g
            .get("colorStops")
            .and_then(Value::as_array)
            .and_then(|stops| stops.first())
            .and_then(|stop| stop.get("color"))
            .and_then(Value::as_str)
            .unwrap_or("none")
            .to_string(),
    }
}

fn matrix(a: Affine) -> String {
    let [a, b, c, d, e, f] = a.as_coeffs();
    format!("matrix({a} {b} {c} {d} {e} {f})")
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatmap_core::{Decoration, DecorationKind, ObjectId};
    use serde_json::json;

    fn seat(id: &str, left: f64, fill: &str) -> SceneObject {
        SceneObject {
            id: ObjectId::intern(id),
            left,
            fill: Some(Paint::color(fill)),
            stroke: Some(Paint::color("#000000")),
            ..SceneObject::circle(10.0)
        }
    }

    #[test]
    fn renders_circles_with_paint() {
        let mut canvas = Canvas::new();
        canvas.add(seat("a", 0.0, "#ff0000"));
        canvas.add(seat("b", 40.0, "transparent"));

        let svg = render_svg(&canvas, &SvgOptions::default());
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("<circle cx=\"10\" cy=\"10\" r=\"10\" fill=\"#ff0000\" stroke=\"#000000\" stroke-width=\"1\" />"));
        assert!(svg.contains("fill=\"transparent\""));
        // 60 wide drawing plus 16 padding on each side.
        assert!(svg.contains("width=\"92\""));
    }

    #[test]
    fn decorations_can_be_left_out() {
        let mut canvas = Canvas::new();
        canvas.add(seat("a", 0.0, "#ff0000"));
        canvas.add_decoration(
            SceneObject {
                font_size: Some(10.0),
                ..SceneObject::text("12")
            },
            Decoration {
                owner: ObjectId::intern("a"),
                kind: DecorationKind::SeatNumber,
            },
        );

        assert!(render_svg(&canvas, &SvgOptions::default()).contains(">12</text>"));
        let bare = SvgOptions {
            include_decorations: false,
            ..SvgOptions::default()
        };
        assert!(!render_svg(&canvas, &bare).contains("<text"));
    }

    #[test]
    fn text_is_escaped() {
        let mut canvas = Canvas::new();
        canvas.add(SceneObject::text("Stage <A & B>"));
        let svg = render_svg(&canvas, &SvgOptions::default());
        assert!(svg.contains(">Stage &lt;A &amp; B&gt;</text>"));
    }

    #[test]
    fn gradient_uses_first_stop() {
        let paint = Paint::Gradient(json!({
            "type": "linear",
            "colorStops": [{ "offset": 0, "color": "#123456" }, { "offset": 1, "color": "#fff" }]
        }));
        assert_eq!(paint_to_svg_color(&paint), "#123456");
    }

    #[test]
    fn empty_canvas_has_default_viewport() {
        let svg = render_svg(&Canvas::new(), &SvgOptions::default());
        assert!(svg.contains("viewBox=\"0 0 832 632\""));
    }
}
