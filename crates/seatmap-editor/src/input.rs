//! Pointer input normalization and dispatch.
//!
//! Host pointer events arrive as [`PointerEvent`]s in canvas coordinates.
//! [`dispatch_pointer`] resolves the target with the render crate's hit
//! test and fires the matching [`CanvasEvent`] on the canvas, which runs
//! whatever listeners the loader bound for the current load cycle.

use seatmap_core::{Canvas, CanvasEvent, CanvasEventKind, Cursor, NodeIndex};
use seatmap_render::{hit_test, hit_test_rect};

/// Keyboard modifiers held during a pointer event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// A pointer event in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f64, y: f64, modifiers: Modifiers },
    Move { x: f64, y: f64, modifiers: Modifiers },
    Up { x: f64, y: f64, modifiers: Modifiers },
}

impl PointerEvent {
    pub fn down(x: f64, y: f64) -> Self {
        Self::Down {
            x,
            y,
            modifiers: Modifiers::default(),
        }
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::Up {
            x,
            y,
            modifiers: Modifiers::default(),
        }
    }

    pub fn position(&self) -> (f64, f64) {
        match *self {
            Self::Down { x, y, .. } | Self::Move { x, y, .. } | Self::Up { x, y, .. } => (x, y),
        }
    }

    fn canvas_kind(&self) -> Option<CanvasEventKind> {
        match self {
            Self::Down { .. } => Some(CanvasEventKind::MouseDown),
            Self::Up { .. } => Some(CanvasEventKind::MouseUp),
            Self::Move { .. } => None,
        }
    }
}

/// Resolve the event's target and fire it on the canvas.
/// Returns the target, if any.
pub fn dispatch_pointer(canvas: &mut Canvas, event: &PointerEvent) -> Option<NodeIndex> {
    let (x, y) = event.position();
    let target = hit_test(canvas, x, y);
    if let Some(kind) = event.canvas_kind() {
        let fired = canvas.fire(&CanvasEvent { kind, target, x, y });
        log::trace!("{}: {kind:?} at ({x}, {y}) → {target:?}, {fired} listeners", canvas.id());
    }
    target
}

/// Cursor to show at (x, y): the hovered object's, or the canvas default.
pub fn cursor_at(canvas: &Canvas, x: f64, y: f64) -> Cursor {
    match hit_test(canvas, x, y) {
        Some(idx) => canvas.graph[idx].interaction.hover_cursor,
        None => canvas.settings.default_cursor,
    }
}

// ─── Marquee ─────────────────────────────────────────────────────────────

/// Rubber-band selection over empty canvas space.
///
/// Only starts when the canvas allows marquee selection and the pointer
/// went down on nothing.
#[derive(Debug, Clone, Default)]
pub struct Marquee {
    start: Option<(f64, f64)>,
    /// Current rectangle, normalized to `(x, y, w, h)`.
    pub rect: Option<(f64, f64, f64, f64)>,
}

impl Marquee {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.start.is_some()
    }

    /// Feed a pointer event. Returns the objects inside the rectangle when
    /// the drag ends.
    pub fn handle(
        &mut self,
        canvas: &Canvas,
        event: &PointerEvent,
        target: Option<NodeIndex>,
    ) -> Option<Vec<NodeIndex>> {
        match *event {
            PointerEvent::Down { x, y, .. } => {
                self.rect = None;
                self.start = (target.is_none() && canvas.settings.selection).then_some((x, y));
                None
            }
            PointerEvent::Move { x, y, .. } => {
                if let Some((sx, sy)) = self.start {
                    self.rect = Some(normalize_rect(sx, sy, x, y));
                }
                None
            }
            PointerEvent::Up { x, y, .. } => {
                let (sx, sy) = self.start.take()?;
                let (rx, ry, rw, rh) = normalize_rect(sx, sy, x, y);
                self.rect = None;
                Some(hit_test_rect(canvas, rx, ry, rw, rh))
            }
        }
    }
}

/// Normalize a drag rectangle from start + current positions.
fn normalize_rect(x1: f64, y1: f64, x2: f64, y2: f64) -> (f64, f64, f64, f64) {
    (x1.min(x2), y1.min(y2), (x2 - x1).abs(), (y2 - y1).abs())
}
