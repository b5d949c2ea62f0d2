//! Seat selection state machine.
//!
//! Each seat is `Deselected` (initial) or `Selected`. Runtime state lives in
//! a side-table keyed by object id rather than on the canvas objects:
//! whether the seat is selected, the stroke to restore on deselect, and the
//! checkmark decoration drawn while it is selected.
//!
//! Transitions are idempotent. Selecting a selected seat (or deselecting a
//! deselected one) changes nothing, so inward sync can re-evaluate every
//! seat on each change without diffing first.

use seatmap_core::{
    Canvas, Decoration, DecorationKind, NodeIndex, ObjectId, OriginX, OriginY, Paint, SceneObject,
};
use seatmap_render::world_center;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// Stroke color of a selected seat's body.
pub const HIGHLIGHT_STROKE: &str = "#1890ff";
pub const SELECTED_STROKE_WIDTH: f64 = 3.0;
pub const DESELECTED_STROKE_WIDTH: f64 = 1.0;
pub const CHECKMARK_OPACITY: f64 = 0.85;
const CHECKMARK_RADIUS: f64 = 8.0;

#[derive(Debug, Clone, Default)]
struct SeatState {
    selected: bool,
    original_stroke: Option<Paint>,
    decoration: Option<NodeIndex>,
}

/// Seats that changed state during an inward sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub selected: SmallVec<[ObjectId; 4]>,
    pub deselected: SmallVec<[ObjectId; 4]>,
}

impl SyncOutcome {
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty() && self.deselected.is_empty()
    }
}

/// Side-table of per-seat selection state for one loaded canvas.
#[derive(Debug, Clone, Default)]
pub struct SelectionTable {
    seats: HashMap<ObjectId, SeatState>,
}

impl SelectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.seats.clear();
    }

    /// Start a fresh load cycle: everything deselected, with the given
    /// stroke backups.
    pub fn seed(&mut self, original_strokes: HashMap<ObjectId, Paint>) {
        self.seats = original_strokes
            .into_iter()
            .map(|(id, stroke)| {
                let state = SeatState {
                    original_stroke: Some(stroke),
                    ..SeatState::default()
                };
                (id, state)
            })
            .collect();
    }

    pub fn is_selected(&self, id: ObjectId) -> bool {
        self.seats.get(&id).is_some_and(|s| s.selected)
    }

    pub fn original_stroke(&self, id: ObjectId) -> Option<&Paint> {
        self.seats.get(&id)?.original_stroke.as_ref()
    }

    pub fn set_original_stroke(&mut self, id: ObjectId, stroke: Paint) {
        self.seats.entry(id).or_default().original_stroke = Some(stroke);
    }

    /// Record a backup only if none exists. Returns true if recorded.
    pub fn backup_stroke_if_missing(&mut self, id: ObjectId, stroke: Paint) -> bool {
        let state = self.seats.entry(id).or_default();
        if state.original_stroke.is_some() {
            return false;
        }
        state.original_stroke = Some(stroke);
        true
    }

    /// Handle of the checkmark drawn for a selected seat.
    pub fn decoration(&self, id: ObjectId) -> Option<NodeIndex> {
        self.seats.get(&id)?.decoration
    }

    /// Ids of selected seats on the canvas, in draw order.
    pub fn selected_ids(&self, canvas: &Canvas) -> Vec<ObjectId> {
        canvas
            .objects()
            .into_iter()
            .map(|idx| canvas.graph[idx].object.id)
            .filter(|&id| self.is_selected(id))
            .collect()
    }

    /// Transition a seat to `Selected`. Returns false if it already was,
    /// or if `id` is not a seat on the canvas.
    pub fn select(&mut self, canvas: &mut Canvas, id: ObjectId) -> bool {
        let Some(idx) = seat_index(canvas, id) else {
            return false;
        };
        if self.is_selected(id) {
            return false;
        }

        let body = canvas.body(idx);
        let current = canvas.graph[body].object.stroke.clone();
        self.backup_stroke_if_missing(id, current.unwrap_or_else(Paint::black));

        let object = &mut canvas.graph[body].object;
        object.stroke = Some(Paint::color(HIGHLIGHT_STROKE));
        object.stroke_width = Some(SELECTED_STROKE_WIDTH);

        let (cx, cy) = world_center(canvas, idx);
        let mark = canvas.add_decoration(
            checkmark(cx, cy),
            Decoration {
                owner: id,
                kind: DecorationKind::SelectionMark,
            },
        );
        canvas.bring_to_front(mark);

        let state = self.seats.entry(id).or_default();
        state.selected = true;
        state.decoration = Some(mark);

        log_transition("selected", canvas, idx);
        true
    }

    /// Transition a seat to `Deselected`. Returns false if it already was.
    pub fn deselect(&mut self, canvas: &mut Canvas, id: ObjectId) -> bool {
        if !self.is_selected(id) {
            return false;
        }
        let state = self.seats.entry(id).or_default();
        state.selected = false;
        let stored = state.decoration.take();
        let restore = state.original_stroke.clone().unwrap_or_else(Paint::black);

        let mut marks = canvas.decorations_of(id, DecorationKind::SelectionMark);
        if let Some(mark) = stored
            && !marks.contains(&mark)
        {
            marks.push(mark);
        }
        for mark in marks {
            canvas.remove(mark);
        }

        let Some(idx) = seat_index(canvas, id) else {
            return true;
        };
        let body = canvas.body(idx);
        let object = &mut canvas.graph[body].object;
        object.stroke = Some(restore);
        object.stroke_width = Some(DESELECTED_STROKE_WIDTH);

        log_transition("deselected", canvas, idx);
        true
    }

    /// Inward sync: make the selected set equal `ids`.
    ///
    /// Only seats whose state differs from the target transition; the rest
    /// are left untouched.
    pub fn sync_to(&mut self, canvas: &mut Canvas, ids: &[ObjectId]) -> SyncOutcome {
        let target: HashSet<ObjectId> = ids.iter().copied().collect();
        let mut outcome = SyncOutcome::default();

        let seats: Vec<ObjectId> = canvas
            .objects()
            .into_iter()
            .filter(|&idx| canvas.graph[idx].object.is_seat())
            .map(|idx| canvas.graph[idx].object.id)
            .collect();

        for id in seats {
            let wanted = target.contains(&id);
            if wanted && self.select(canvas, id) {
                outcome.selected.push(id);
            } else if !wanted && self.deselect(canvas, id) {
                outcome.deselected.push(id);
            }
        }
        outcome
    }
}

fn seat_index(canvas: &Canvas, id: ObjectId) -> Option<NodeIndex> {
    let idx = canvas.index_of(id)?;
    canvas.graph[idx].object.is_seat().then_some(idx)
}

fn log_transition(what: &str, canvas: &Canvas, idx: NodeIndex) {
    let seat = canvas.graph[idx].object.seat_data();
    match serde_json::to_string(&seat) {
        Ok(json) => log::info!("seat {what}: {json}"),
        Err(_) => log::info!("seat {what}: {seat:?}"),
    }
}

/// Checkmark badge: a filled circle with a centered ✓, anchored at its center.
fn checkmark(cx: f64, cy: f64) -> SceneObject {
    let badge = SceneObject {
        left: -CHECKMARK_RADIUS,
        top: -CHECKMARK_RADIUS,
        fill: Some(Paint::color(HIGHLIGHT_STROKE)),
        ..SceneObject::circle(CHECKMARK_RADIUS)
    };
    let glyph = SceneObject {
        origin_x: OriginX::Center,
        origin_y: OriginY::Center,
        font_size: Some(12.0),
        fill: Some(Paint::color("#ffffff")),
        ..SceneObject::text("✓")
    };
    SceneObject {
        left: cx,
        top: cy,
        width: Some(2.0 * CHECKMARK_RADIUS),
        height: Some(2.0 * CHECKMARK_RADIUS),
        origin_x: OriginX::Center,
        origin_y: OriginY::Center,
        opacity: Some(CHECKMARK_OPACITY),
        ..SceneObject::group(vec![badge, glyph])
    }
}
