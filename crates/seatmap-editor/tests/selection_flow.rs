//! Integration tests: pointer clicks → selection state → host notifications
//! (seatmap-editor ↔ seatmap-core ↔ seatmap-render).

use pretty_assertions::assert_eq;
use seatmap_core::{
    Canvas, CategoryRef, DecorationKind, LayoutDocument, ObjectId, Paint, SeatStatus,
    TicketCategory,
};
use seatmap_editor::selection::{
    DESELECTED_STROKE_WIDTH, HIGHLIGHT_STROKE, SELECTED_STROKE_WIDTH,
};
use seatmap_editor::{
    LoaderOptions, PointerEvent, SeatMapLoader, SelectionChange, dispatch_pointer,
};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

fn layout() -> LayoutDocument {
    serde_json::from_value(json!({
        "objects": [
            { "id": "stage", "type": "rect", "left": 0, "top": 100, "width": 90, "height": 20 },
            { "id": "s1", "type": "circle", "customType": "seat", "left": 0, "top": 0, "radius": 10,
              "category": 5, "attributes": { "number": 1, "price": 30 } },
            { "id": "s2", "type": "circle", "customType": "seat", "left": 30, "top": 0, "radius": 10,
              "category": 5, "attributes": { "number": 2, "price": 30 } },
            { "id": "s3", "type": "circle", "customType": "seat", "left": 60, "top": 0, "radius": 10,
              "stroke": "#222222", "attributes": { "number": 3 } }
        ]
    }))
    .unwrap()
}

fn categories() -> Vec<TicketCategory> {
    vec![TicketCategory::new(5i64, "#ff0000")]
}

fn id(s: &str) -> ObjectId {
    ObjectId::intern(s)
}

/// Canvas-space center of each seat in `layout()`.
fn center(seat: &str) -> (f64, f64) {
    match seat {
        "s1" => (10.0, 10.0),
        "s2" => (40.0, 10.0),
        "s3" => (70.0, 10.0),
        "stage" => (45.0, 110.0),
        other => panic!("no seat {other}"),
    }
}

fn click(canvas: &mut Canvas, seat: &str) {
    let (x, y) = center(seat);
    dispatch_pointer(canvas, &PointerEvent::down(x, y));
}

struct Harness {
    canvas: Canvas,
    loader: SeatMapLoader,
    changes: Rc<RefCell<Vec<SelectionChange>>>,
}

fn harness(selected: Option<Vec<ObjectId>>) -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut canvas = Canvas::new();
    let mut loader = SeatMapLoader::new(LoaderOptions::default());
    let changes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&changes);
    loader.set_on_selection_change(Some(Rc::new(move |change: &SelectionChange| {
        sink.borrow_mut().push(change.clone());
    })));
    loader.set_selected_seat_ids(&mut canvas, selected);
    loader.load(&mut canvas, Some(layout()), &[], &categories());
    Harness {
        canvas,
        loader,
        changes,
    }
}

fn stroke_of(canvas: &Canvas, seat: &str) -> (Option<Paint>, Option<f64>) {
    let object = &canvas.get_by_id(id(seat)).unwrap().object;
    (object.stroke.clone(), object.stroke_width)
}

// ─── Uncontrolled ────────────────────────────────────────────────────────

#[test]
fn uncontrolled_click_round_trip() {
    let mut h = harness(None);

    click(&mut h.canvas, "s2");
    assert_eq!(h.loader.selected_ids(&h.canvas), vec![id("s2")]);
    assert_eq!(
        stroke_of(&h.canvas, "s2"),
        (Some(Paint::color(HIGHLIGHT_STROKE)), Some(SELECTED_STROKE_WIDTH))
    );

    click(&mut h.canvas, "s2");
    assert!(h.loader.selected_ids(&h.canvas).is_empty());
    assert_eq!(
        stroke_of(&h.canvas, "s2"),
        (Some(Paint::color("#ff0000")), Some(DESELECTED_STROKE_WIDTH))
    );

    let changes = h.changes.borrow();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].ids, vec![id("s2")]);
    assert!(changes[0].selected);
    assert!(changes[1].ids.is_empty());
    assert!(!changes[1].selected);
}

#[test]
fn notification_carries_seat_data() {
    let mut h = harness(None);

    click(&mut h.canvas, "s1");
    click(&mut h.canvas, "s3");

    let changes = h.changes.borrow();
    let last = changes.last().unwrap();
    assert_eq!(last.ids, vec![id("s1"), id("s3")]);
    assert_eq!(last.toggled, id("s3"));

    let s1 = &last.seats[0];
    assert_eq!(s1.number.as_deref(), Some("1"));
    assert_eq!(s1.price, Some(30.0));
    assert_eq!(s1.category, Some(CategoryRef::new("5")));
    assert_eq!(s1.status, SeatStatus::Available);

    let s3 = &last.seats[1];
    assert_eq!(s3.category, None);
    assert_eq!(s3.price, None);
}

#[test]
fn uncategorized_seat_restores_its_own_stroke() {
    let mut h = harness(None);
    let before = stroke_of(&h.canvas, "s3").0;

    click(&mut h.canvas, "s3");
    click(&mut h.canvas, "s3");

    assert_eq!(stroke_of(&h.canvas, "s3").0, before);
    assert_eq!(before, Some(Paint::color("#222222")));
}

#[test]
fn clicks_on_non_seats_and_empty_space_are_ignored() {
    let mut h = harness(None);

    click(&mut h.canvas, "stage");
    dispatch_pointer(&mut h.canvas, &PointerEvent::down(500.0, 500.0));

    assert!(h.changes.borrow().is_empty());
    assert!(h.loader.selected_ids(&h.canvas).is_empty());
}

#[test]
fn click_without_callback_still_toggles_uncontrolled() {
    let mut h = harness(None);
    h.loader.set_on_selection_change(None);

    click(&mut h.canvas, "s1");
    assert_eq!(h.loader.selected_ids(&h.canvas), vec![id("s1")]);
}

// ─── Controlled ──────────────────────────────────────────────────────────

#[test]
fn controlled_click_defers_visuals_to_host() {
    let mut h = harness(Some(vec![]));

    click(&mut h.canvas, "s1");

    // No speculative repaint.
    assert!(h.loader.selected_ids(&h.canvas).is_empty());
    assert_eq!(stroke_of(&h.canvas, "s1").0, Some(Paint::color("#ff0000")));
    let requested = h.changes.borrow()[0].ids.clone();
    assert_eq!(requested, vec![id("s1")]);

    // Host accepts the change.
    h.loader
        .set_selected_seat_ids(&mut h.canvas, Some(requested));
    assert_eq!(h.loader.selected_ids(&h.canvas), vec![id("s1")]);
    assert_eq!(
        h.canvas
            .decorations_of(id("s1"), DecorationKind::SelectionMark)
            .len(),
        1
    );

    click(&mut h.canvas, "s1");
    assert!(h.changes.borrow()[1].ids.is_empty());
    assert!(!h.changes.borrow()[1].selected);
}

#[test]
fn controlled_list_is_read_at_click_time() {
    let mut h = harness(Some(vec![id("s1")]));
    h.loader
        .set_selected_seat_ids(&mut h.canvas, Some(vec![id("s1"), id("s2")]));

    click(&mut h.canvas, "s3");

    assert_eq!(
        h.changes.borrow()[0].ids,
        vec![id("s1"), id("s2"), id("s3")]
    );
}

#[test]
fn controlled_ids_not_on_canvas_have_no_seat_data() {
    let mut h = harness(Some(vec![id("elsewhere")]));

    click(&mut h.canvas, "s2");

    let changes = h.changes.borrow();
    assert_eq!(changes[0].ids, vec![id("elsewhere"), id("s2")]);
    assert_eq!(changes[0].seats.len(), 1);
    assert_eq!(changes[0].seats[0].id, id("s2"));
}

#[test]
fn initial_selection_is_applied_on_load() {
    let h = harness(Some(vec![id("s1"), id("s3")]));

    assert_eq!(h.loader.selected_ids(&h.canvas), vec![id("s1"), id("s3")]);
    assert_eq!(
        stroke_of(&h.canvas, "s3").0,
        Some(Paint::color(HIGHLIGHT_STROKE))
    );
}

#[test]
fn inward_sync_transitions_only_differences() {
    let mut h = harness(Some(vec![id("s1"), id("s3")]));
    let s3_mark = h
        .canvas
        .decorations_of(id("s3"), DecorationKind::SelectionMark);

    let outcome = h
        .loader
        .set_selected_seat_ids(&mut h.canvas, Some(vec![id("s2"), id("s3")]))
        .unwrap();

    assert_eq!(outcome.selected.as_slice(), &[id("s2")]);
    assert_eq!(outcome.deselected.as_slice(), &[id("s1")]);
    assert_eq!(
        h.canvas
            .decorations_of(id("s3"), DecorationKind::SelectionMark),
        s3_mark
    );
}

#[test]
fn absent_list_is_a_no_op_but_empty_list_clears() {
    let mut h = harness(Some(vec![id("s1")]));

    assert!(h.loader.set_selected_seat_ids(&mut h.canvas, None).is_none());
    assert_eq!(h.loader.selected_ids(&h.canvas), vec![id("s1")]);
    assert!(!h.loader.is_controlled());

    let outcome = h
        .loader
        .set_selected_seat_ids(&mut h.canvas, Some(vec![]))
        .unwrap();
    assert_eq!(outcome.deselected.as_slice(), &[id("s1")]);
    assert!(h.loader.selected_ids(&h.canvas).is_empty());
}

#[test]
fn export_never_contains_selection_visuals() {
    let mut h = harness(None);
    click(&mut h.canvas, "s1");

    let document = h.loader.export_document(&h.canvas);
    assert_eq!(document.objects.len(), 4);
    let s1 = document.objects.iter().find(|o| o.id == id("s1")).unwrap();
    assert_eq!(s1.stroke, Some(Paint::color("#ff0000")));
}
