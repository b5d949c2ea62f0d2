//! WASM bridge for the seat map: exposes the loader to the ticketing web client.
//!
//! Compiled via `wasm-pack build --target web`. Structured data crosses the
//! boundary as JSON strings. Host callbacks are queued while the canvas is
//! being mutated and delivered once the triggering call has finished its
//! Rust-side work.

use js_sys::Function;
use seatmap_core::{
    Canvas, CanvasEvent, CanvasEventKind, CategoryRef, ExistingSeat, LayoutDocument,
    MergedStyle, ObjectId, SeatStatus, TicketCategory, parse_layout,
};
use seatmap_editor::{
    LoaderHooks, LoaderMode, LoaderOptions, Marquee, Modifiers, PointerEvent, SeatMapLoader,
    SelectionChange, cursor_at, dispatch_pointer,
};
use seatmap_render::{SvgOptions, render_svg, world_center};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

/// A host notification waiting to be delivered.
#[derive(Debug, Clone, PartialEq)]
enum Outgoing {
    Selection(String),
    Background(bool),
    Rows(String),
}

type Outbox = Rc<RefCell<Vec<Outgoing>>>;

/// The WASM-facing seat picker.
///
/// Owns one canvas and the loader driving it. All interaction from the
/// web client goes through this struct.
#[wasm_bindgen]
pub struct SeatPicker {
    canvas: Canvas,
    loader: SeatMapLoader,
    marquee: Marquee,
    outbox: Outbox,
    on_selection_change: Option<Function>,
    on_background: Option<Function>,
    on_rows: Option<Function>,
}

#[wasm_bindgen]
impl SeatPicker {
    /// Create a picker. `mode` is `customer`, `organizer` or `display`.
    #[wasm_bindgen(constructor)]
    pub fn new(mode: &str) -> Result<SeatPicker, JsValue> {
        console_setup();

        let mode: LoaderMode = mode.parse().map_err(|e: String| JsValue::from_str(&e))?;
        Ok(Self::with_mode(mode))
    }

    /// Replace the display style from its JSON form. Applies on the next load.
    pub fn set_style(&mut self, style_json: &str) -> bool {
        match MergedStyle::from_json(style_json) {
            Ok(style) => {
                self.loader.set_style(style);
                true
            }
            Err(e) => {
                log::warn!("ignoring style: {e}");
                false
            }
        }
    }

    /// The callback receives the change as a JSON string. It runs while this
    /// picker is still borrowed, so a callback that calls back into the
    /// picker (e.g. `set_selected_seat_ids` in a controlled round trip) must
    /// defer that call, for example with `queueMicrotask`.
    pub fn set_on_selection_change(&mut self, callback: Option<Function>) {
        self.on_selection_change = callback;
    }

    pub fn set_on_background(&mut self, callback: Option<Function>) {
        self.on_background = callback;
    }

    pub fn set_on_rows(&mut self, callback: Option<Function>) {
        self.on_rows = callback;
    }

    /// Load a layout. `layout_json` may be the layout object, a JSON string
    /// holding it, or `null` to clear the canvas.
    ///
    /// Returns `{"ok":true,"seats":N,...}` or `{"ok":false,"error":"..."}`.
    pub fn load_layout(
        &mut self,
        layout_json: &str,
        existing_seats_json: &str,
        categories_json: &str,
    ) -> String {
        let result = self.load_inner(layout_json, existing_seats_json, categories_json);
        self.flush();
        match result {
            Ok(summary) => summary.to_string(),
            Err(e) => error_json(&e),
        }
    }

    /// Set the host-controlled selection from a JSON array of ids.
    /// `null` or an empty string switches back to uncontrolled selection.
    pub fn set_selected_seat_ids(&mut self, ids_json: &str) -> bool {
        match parse_optional_ids(ids_json) {
            Ok(ids) => {
                self.loader.set_selected_seat_ids(&mut self.canvas, ids);
                true
            }
            Err(e) => {
                log::warn!("ignoring selected seat ids: {e}");
                false
            }
        }
    }

    /// Currently selected seat ids as a JSON array.
    pub fn get_selected_ids(&self) -> String {
        ids_json(&self.loader.selected_ids(&self.canvas))
    }

    /// Handle pointer down. Returns true if the canvas needs a redraw.
    pub fn handle_pointer_down(
        &mut self,
        x: f64,
        y: f64,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let event = PointerEvent::Down {
            x,
            y,
            modifiers: Modifiers {
                shift,
                ctrl,
                alt,
                meta,
            },
        };
        let before = self.canvas.len();
        let target = dispatch_pointer(&mut self.canvas, &event);
        self.marquee.handle(&self.canvas, &event, target);
        let delivered = self.flush();
        delivered > 0 || before != self.canvas.len() || self.marquee.is_active()
    }

    /// Handle pointer move. Returns true while a marquee is being dragged.
    pub fn handle_pointer_move(&mut self, x: f64, y: f64) -> bool {
        let event = PointerEvent::Move {
            x,
            y,
            modifiers: Modifiers::default(),
        };
        self.marquee.handle(&self.canvas, &event, None);
        self.marquee.rect.is_some()
    }

    /// Handle pointer up. Returns the ids inside a finished marquee as a
    /// JSON array (`[]` when no marquee was active).
    pub fn handle_pointer_up(&mut self, x: f64, y: f64) -> String {
        let event = PointerEvent::up(x, y);
        let target = dispatch_pointer(&mut self.canvas, &event);
        let hits = self.marquee.handle(&self.canvas, &event, target);
        self.flush();
        let ids: Vec<ObjectId> = hits
            .unwrap_or_default()
            .into_iter()
            .filter_map(|idx| self.canvas.object(idx))
            .map(|node| node.object.id)
            .collect();
        ids_json(&ids)
    }

    /// Current marquee rectangle as `{"x","y","width","height"}`, or `null`.
    pub fn get_marquee_rect(&self) -> String {
        match self.marquee.rect {
            Some((x, y, width, height)) => {
                json!({ "x": x, "y": y, "width": width, "height": height }).to_string()
            }
            None => "null".to_string(),
        }
    }

    /// Click a seat by id, as if the user pressed on it.
    pub fn click_seat(&mut self, seat_id: &str) -> bool {
        let Some(idx) = self.canvas.index_of(ObjectId::intern(seat_id)) else {
            return false;
        };
        let (x, y) = world_center(&self.canvas, idx);
        let fired = self.canvas.fire(&CanvasEvent {
            kind: CanvasEventKind::MouseDown,
            target: Some(idx),
            x,
            y,
        });
        self.flush();
        fired > 0
    }

    /// CSS cursor for the given canvas position.
    pub fn cursor_at(&self, x: f64, y: f64) -> String {
        cursor_at(&self.canvas, x, y).as_css().to_string()
    }

    // ─── Organizer ───────────────────────────────────────────────────────

    /// Put the seats in `ids_json` in `category` (`None` uncategorizes).
    /// Returns how many seats changed.
    pub fn assign_category(&mut self, ids_json: &str, category: Option<String>) -> usize {
        match parse_ids(ids_json) {
            Ok(ids) => self.loader.assign_category(
                &mut self.canvas,
                &ids,
                category.map(CategoryRef::new),
            ),
            Err(e) => {
                log::warn!("ignoring category assignment: {e}");
                0
            }
        }
    }

    /// Set the sale status of the seats in `ids_json`.
    pub fn set_status(&mut self, ids_json: &str, status: &str) -> usize {
        match parse_ids(ids_json) {
            Ok(ids) => self.loader.set_status(
                &mut self.canvas,
                &ids,
                SeatStatus::from(status.to_string()),
            ),
            Err(e) => {
                log::warn!("ignoring status change: {e}");
                0
            }
        }
    }

    /// The layout as it should be saved, without selection visuals.
    pub fn export_json(&self) -> String {
        match self.loader.export_document(&self.canvas).to_json() {
            Ok(json) => json,
            Err(e) => error_json(&e.to_string()),
        }
    }

    /// The canvas as an SVG document.
    pub fn render_svg(&self, background: Option<String>) -> String {
        let options = SvgOptions {
            background,
            ..SvgOptions::default()
        };
        render_svg(&self.canvas, &options)
    }

    /// Detach the click listener. The canvas keeps its contents.
    pub fn teardown(&mut self) {
        self.loader.detach(&mut self.canvas);
    }
}

impl SeatPicker {
    fn with_mode(mode: LoaderMode) -> Self {
        let outbox: Outbox = Rc::default();

        let background_box = Rc::clone(&outbox);
        let rows_box = Rc::clone(&outbox);
        let hooks = LoaderHooks {
            on_background: Some(Rc::new(move |present: bool| {
                background_box
                    .borrow_mut()
                    .push(Outgoing::Background(present));
            })),
            publish_rows: Some(Rc::new(move |rows: &[Value]| {
                match serde_json::to_string(rows) {
                    Ok(json) => rows_box.borrow_mut().push(Outgoing::Rows(json)),
                    Err(e) => log::error!("row metadata not serializable: {e}"),
                }
            })),
        };
        let options = LoaderOptions {
            mode,
            ..LoaderOptions::default()
        };
        let mut loader = SeatMapLoader::with_hooks(options, hooks);

        let selection_box = Rc::clone(&outbox);
        loader.set_on_selection_change(Some(Rc::new(move |change: &SelectionChange| {
            match serde_json::to_string(change) {
                Ok(json) => selection_box.borrow_mut().push(Outgoing::Selection(json)),
                Err(e) => log::error!("selection change not serializable: {e}"),
            }
        })));

        Self {
            canvas: Canvas::new(),
            loader,
            marquee: Marquee::new(),
            outbox,
            on_selection_change: None,
            on_background: None,
            on_rows: None,
        }
    }

    fn load_inner(
        &mut self,
        layout_json: &str,
        existing_seats_json: &str,
        categories_json: &str,
    ) -> Result<Value, String> {
        self.marquee = Marquee::new();
        let layout = match parse_layout_arg(layout_json) {
            Ok(layout) => layout,
            Err(e) => {
                log::warn!("{e}; showing no layout");
                self.loader.load(&mut self.canvas, None, &[], &[]);
                return Err(e);
            }
        };
        let existing: Vec<ExistingSeat> =
            parse_list(existing_seats_json).map_err(|e| format!("existing seats: {e}"))?;
        let categories: Vec<TicketCategory> =
            parse_list(categories_json).map_err(|e| format!("categories: {e}"))?;

        let report = self
            .loader
            .load(&mut self.canvas, layout, &existing, &categories)
            .ok_or_else(|| "load superseded".to_string())?;
        Ok(json!({
            "ok": true,
            "objects": self.canvas.objects().len(),
            "seats": report.seats_total,
            "overridden": report.seats_overridden,
            "categoriesCleared": report.categories_cleared,
            "idsGenerated": report.ids_generated,
            "hasBackground": report.has_background,
        }))
    }

    /// Deliver queued notifications to the host. Returns how many were queued.
    fn flush(&mut self) -> usize {
        let pending: Vec<Outgoing> = self.outbox.borrow_mut().drain(..).collect();
        for message in &pending {
            let result = match message {
                Outgoing::Selection(json) => self
                    .on_selection_change
                    .as_ref()
                    .map(|f| f.call1(&JsValue::NULL, &JsValue::from_str(json))),
                Outgoing::Background(present) => self
                    .on_background
                    .as_ref()
                    .map(|f| f.call1(&JsValue::NULL, &JsValue::from_bool(*present))),
                Outgoing::Rows(json) => self
                    .on_rows
                    .as_ref()
                    .map(|f| f.call1(&JsValue::NULL, &JsValue::from_str(json))),
            };
            if let Some(Err(e)) = result {
                log::error!("host callback threw: {e:?}");
            }
        }
        pending.len()
    }
}

// ─── Argument parsing ────────────────────────────────────────────────────

fn parse_layout_arg(text: &str) -> Result<Option<LayoutDocument>, String> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_str(text).map_err(|e| format!("layout: {e}"))?;
    if value.is_null() {
        return Ok(None);
    }
    parse_layout(&value)
        .map(Some)
        .map_err(|e| format!("layout: {e}"))
}

/// Empty text and `null` both mean an empty list.
fn parse_list<T: serde::de::DeserializeOwned>(text: &str) -> Result<Vec<T>, serde_json::Error> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str::<Option<Vec<T>>>(text)?.unwrap_or_default())
}

fn parse_ids(text: &str) -> Result<Vec<ObjectId>, serde_json::Error> {
    serde_json::from_str(text)
}

fn parse_optional_ids(text: &str) -> Result<Option<Vec<ObjectId>>, serde_json::Error> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(text)
}

fn ids_json(ids: &[ObjectId]) -> String {
    serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string())
}

fn error_json(message: &str) -> String {
    json!({ "ok": false, "error": message }).to_string()
}

// ─── Console logging and panic hook ──────────────────────────────────────

fn console_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("seatmap WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
            if let Err(e) = console_log::init_with_level(log::Level::Info) {
                web_sys::console::warn_1(&format!("seatmap logging unavailable: {e}").into());
            }
        });
    }
}

// ─── Standalone validation (no picker needed) ────────────────────────────

/// Check that a stored layout parses. Returns `{"ok":true,"objects":N}` or
/// `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate_layout(layout_json: &str) -> String {
    match parse_layout_arg(layout_json) {
        Ok(Some(layout)) => json!({ "ok": true, "objects": layout.scene.objects.len() }).to_string(),
        Ok(None) => json!({ "ok": true, "objects": 0 }).to_string(),
        Err(e) => error_json(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LAYOUT: &str = r#"{
        "objects": [
            { "id": "s1", "type": "circle", "customType": "seat", "left": 0, "top": 0,
              "radius": 10, "category": 1 },
            { "id": "s2", "type": "circle", "customType": "seat", "left": 40, "top": 0,
              "radius": 10, "category": 1 }
        ],
        "rows": [ { "label": "A" } ]
    }"#;

    const CATEGORIES: &str = r##"[ { "id": 1, "color": "#00ff00" } ]"##;

    fn loaded(mode: LoaderMode) -> SeatPicker {
        let mut picker = SeatPicker::with_mode(mode);
        let summary: Value =
            serde_json::from_str(&picker.load_layout(LAYOUT, "[]", CATEGORIES)).unwrap();
        assert_eq!(summary["ok"], true);
        picker
    }

    #[test]
    fn load_reports_summary_and_queues_hooks() {
        let mut picker = SeatPicker::with_mode(LoaderMode::Customer);
        let result = picker.load_inner(LAYOUT, "", "null").unwrap();

        assert_eq!(result["seats"], 2);
        assert_eq!(result["hasBackground"], false);
        assert_eq!(
            *picker.outbox.borrow(),
            vec![
                Outgoing::Background(false),
                Outgoing::Rows(r#"[{"label":"A"}]"#.to_string()),
            ]
        );
    }

    #[test]
    fn flush_drains_outbox_without_callbacks() {
        let mut picker = loaded(LoaderMode::Customer);
        assert!(picker.outbox.borrow().is_empty());

        assert!(picker.handle_pointer_down(10.0, 10.0, false, false, false, false));
        assert!(picker.outbox.borrow().is_empty());
        assert_eq!(picker.get_selected_ids(), r#"["s1"]"#);
    }

    #[test]
    fn selection_change_is_queued_as_json() {
        let mut picker = loaded(LoaderMode::Customer);
        let target = picker.canvas.index_of(ObjectId::intern("s2"));
        picker.canvas.fire(&CanvasEvent {
            kind: CanvasEventKind::MouseDown,
            target,
            x: 50.0,
            y: 10.0,
        });

        let queued = picker.outbox.borrow().clone();
        let [Outgoing::Selection(json)] = queued.as_slice() else {
            panic!("expected one selection message, got {queued:?}");
        };
        let change: Value = serde_json::from_str(json).unwrap();
        assert_eq!(change["ids"], json!(["s2"]));
        assert_eq!(change["toggled"], "s2");
        assert_eq!(change["selected"], true);
    }

    #[test]
    fn controlled_ids_round_trip() {
        let mut picker = loaded(LoaderMode::Customer);

        assert!(picker.set_selected_seat_ids(r#"["s2"]"#));
        assert_eq!(picker.get_selected_ids(), r#"["s2"]"#);
        assert!(picker.set_selected_seat_ids("[]"));
        assert_eq!(picker.get_selected_ids(), "[]");
        assert!(!picker.set_selected_seat_ids("{"));
    }

    #[test]
    fn click_seat_by_id() {
        let mut picker = loaded(LoaderMode::Customer);
        assert!(picker.click_seat("s1"));
        assert!(!picker.click_seat("missing"));
        assert_eq!(picker.get_selected_ids(), r#"["s1"]"#);
    }

    #[test]
    fn display_mode_ignores_clicks() {
        let mut picker = loaded(LoaderMode::Display);
        assert!(!picker.handle_pointer_down(10.0, 10.0, false, false, false, false));
        assert_eq!(picker.get_selected_ids(), "[]");
        assert_eq!(picker.cursor_at(10.0, 10.0), "default");
    }

    #[test]
    fn organizer_marquee_and_edits() {
        let mut picker = loaded(LoaderMode::Organizer);

        picker.handle_pointer_down(-5.0, -5.0, false, false, false, false);
        assert!(picker.handle_pointer_move(100.0, 30.0));
        assert!(picker.get_marquee_rect().contains("\"width\":105.0"));
        let hits = picker.handle_pointer_up(100.0, 30.0);
        assert_eq!(hits, r#"["s1","s2"]"#);
        assert_eq!(picker.get_marquee_rect(), "null");

        assert_eq!(picker.set_status(&hits, "sold"), 2);
        assert_eq!(picker.assign_category(r#"["s1"]"#, Some("9".into())), 1);

        let saved: Value = serde_json::from_str(&picker.export_json()).unwrap();
        // Unknown category uncategorizes and frees the seat.
        assert_eq!(saved["objects"][0].get("category"), None);
        assert_eq!(saved["objects"][0]["status"], "available");
        assert_eq!(saved["objects"][1]["category"], "1");
        assert_eq!(saved["objects"][1]["status"], "sold");
    }

    #[test]
    fn bad_inputs_report_errors() {
        let mut picker = SeatPicker::with_mode(LoaderMode::Customer);

        let result: Value =
            serde_json::from_str(&picker.load_layout("[1, 2]", "[]", "[]")).unwrap();
        assert_eq!(result["ok"], false);
        let result: Value =
            serde_json::from_str(&picker.load_layout(LAYOUT, "{}", "[]")).unwrap();
        assert!(result["error"].as_str().unwrap().starts_with("existing seats"));
        assert!(!picker.set_style("not json"));
    }

    #[test]
    fn unreadable_layout_clears_previous_one() {
        let mut picker = loaded(LoaderMode::Customer);
        assert!(picker.loader.is_bound());

        let result: Value =
            serde_json::from_str(&picker.load_layout("[1,2]", "[]", "[]")).unwrap();

        assert_eq!(result["ok"], false);
        assert!(result["error"].as_str().unwrap().starts_with("layout"));
        assert!(picker.canvas.is_empty());
        assert!(!picker.loader.is_bound());
        assert_eq!(picker.canvas.listener_count(CanvasEventKind::MouseDown), 0);
        assert!(picker.outbox.borrow().is_empty());
    }

    #[test]
    fn unreadable_layout_reports_no_background() {
        let mut picker = loaded(LoaderMode::Customer);
        let err = picker.load_inner("{not json", "", "").unwrap_err();

        assert!(err.starts_with("layout"));
        assert_eq!(*picker.outbox.borrow(), vec![Outgoing::Background(false)]);
    }

    #[test]
    fn null_layout_clears() {
        let mut picker = loaded(LoaderMode::Customer);
        let result: Value = serde_json::from_str(&picker.load_layout("null", "", "")).unwrap();
        assert_eq!(result["objects"], 0);
        assert!(picker.canvas.is_empty());
    }

    #[test]
    fn validate_layout_accepts_double_encoded() {
        let encoded = serde_json::to_string(LAYOUT).unwrap();
        assert_eq!(validate_layout(&encoded), r#"{"objects":2,"ok":true}"#);
        assert!(validate_layout("42").contains("\"ok\":false"));
    }

    #[test]
    fn svg_contains_seats() {
        let picker = loaded(LoaderMode::Customer);
        let svg = picker.render_svg(Some("#ffffff".into()));
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<circle").count(), 2);
    }
}
