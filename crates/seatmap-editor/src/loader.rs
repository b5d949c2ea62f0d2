//! Seat-map loader: layout load cycle, click handling, selection sync.
//!
//! One [`SeatMapLoader`] drives one host canvas. Each layout load runs as
//! two steps so a host can defer the second until deserialization is done:
//!
//! - [`SeatMapLoader::begin_load`] detaches the previous click listener,
//!   bumps the load generation and returns a [`PendingLoad`] ticket.
//! - [`SeatMapLoader::complete_load`] checks the ticket is still current
//!   (same generation, same canvas) and then rebuilds the canvas:
//!   load document → reconcile → background/rows notifications → labels →
//!   interaction policy → fresh selection table → initial selection →
//!   bind exactly one click listener.
//!
//! The click listener does not capture the selected-ids list or the change
//! callback. It reads both from loader-shared state when it runs, so hosts
//! can update them between clicks without reloading the layout.

use crate::labels::apply_seat_numbers;
use crate::organizer;
use crate::policy::{LoaderMode, enforce};
use crate::selection::{SelectionTable, SyncOutcome};
use seatmap_core::{
    Canvas, CanvasEvent, CanvasEventKind, CanvasId, CategoryIndex, CategoryRef, ExistingSeat,
    LayoutDocument, ListenerId, MergedStyle, ObjectId, ReconcileReport, RowMetadata,
    SceneDocument, SeatData, SeatStatus, TicketCategory, reconcile,
};
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

pub type SelectionCallback = Rc<dyn Fn(&SelectionChange)>;
pub type BackgroundCallback = Rc<dyn Fn(bool)>;
pub type RowsCallback = Rc<dyn Fn(&[RowMetadata])>;

/// Payload of the selection-change notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionChange {
    /// Full selection after the click.
    pub ids: Vec<ObjectId>,
    /// Seat records for every id in `ids` still on the canvas.
    pub seats: Vec<SeatData>,
    /// The seat that was clicked.
    pub toggled: ObjectId,
    /// Whether the click selects (`true`) or deselects it.
    pub selected: bool,
}

/// Loader configuration.
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    pub mode: LoaderMode,
    pub style: MergedStyle,
}

/// Output ports notified once per completed load.
#[derive(Clone, Default)]
pub struct LoaderHooks {
    pub on_background: Option<BackgroundCallback>,
    pub publish_rows: Option<RowsCallback>,
}

impl fmt::Debug for LoaderHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderHooks")
            .field("on_background", &self.on_background.is_some())
            .field("publish_rows", &self.publish_rows.is_some())
            .finish()
    }
}

/// Ticket for a load started with [`SeatMapLoader::begin_load`].
#[derive(Debug, Clone)]
pub struct PendingLoad {
    generation: u64,
    canvas: CanvasId,
    scene: Option<SceneDocument>,
    rows: Option<Vec<RowMetadata>>,
}

impl PendingLoad {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn canvas_id(&self) -> CanvasId {
        self.canvas
    }
}

/// State read by the click listener at call time.
#[derive(Default)]
struct Shared {
    generation: u64,
    /// Canvas the current load completed on.
    loaded: Option<CanvasId>,
    selected_seat_ids: Option<Vec<ObjectId>>,
    on_selection_change: Option<SelectionCallback>,
    table: SelectionTable,
    categories: CategoryIndex,
}

#[derive(Debug, Clone, Copy)]
struct Binding {
    canvas: CanvasId,
    listener: ListenerId,
}

pub struct SeatMapLoader {
    options: LoaderOptions,
    hooks: LoaderHooks,
    shared: Rc<RefCell<Shared>>,
    binding: Option<Binding>,
}

impl SeatMapLoader {
    pub fn new(options: LoaderOptions) -> Self {
        Self::with_hooks(options, LoaderHooks::default())
    }

    pub fn with_hooks(options: LoaderOptions, hooks: LoaderHooks) -> Self {
        Self {
            options,
            hooks,
            shared: Rc::new(RefCell::new(Shared::default())),
            binding: None,
        }
    }

    pub fn mode(&self) -> LoaderMode {
        self.options.mode
    }

    pub fn style(&self) -> &MergedStyle {
        &self.options.style
    }

    /// Takes effect on the next load.
    pub fn set_style(&mut self, style: MergedStyle) {
        self.options.style = style;
    }

    pub fn hooks_mut(&mut self) -> &mut LoaderHooks {
        &mut self.hooks
    }

    pub fn generation(&self) -> u64 {
        self.shared.borrow().generation
    }

    // ─── Load cycle ──────────────────────────────────────────────────────

    /// Load a layout in one go.
    pub fn load(
        &mut self,
        canvas: &mut Canvas,
        layout: Option<LayoutDocument>,
        existing_seats: &[ExistingSeat],
        categories: &[TicketCategory],
    ) -> Option<ReconcileReport> {
        let pending = self.begin_load(canvas, layout);
        self.complete_load(canvas, pending, existing_seats, categories)
    }

    /// Start a load: detach the current listener and supersede any load
    /// still in flight.
    pub fn begin_load(&mut self, canvas: &mut Canvas, layout: Option<LayoutDocument>) -> PendingLoad {
        self.teardown(canvas);
        let (scene, rows) = match layout {
            Some(layout) => {
                let (scene, rows) = layout.split();
                (Some(scene), rows)
            }
            None => (None, None),
        };
        let generation = self.shared.borrow().generation;
        log::debug!("{}: load #{generation} started", canvas.id());
        PendingLoad {
            generation,
            canvas: canvas.id(),
            scene,
            rows,
        }
    }

    /// Finish a load. Returns `None` without touching the canvas when the
    /// ticket was superseded or belongs to another canvas.
    pub fn complete_load(
        &mut self,
        canvas: &mut Canvas,
        pending: PendingLoad,
        existing_seats: &[ExistingSeat],
        categories: &[TicketCategory],
    ) -> Option<ReconcileReport> {
        let current = self.shared.borrow().generation;
        if pending.generation != current || pending.canvas != canvas.id() {
            log::debug!(
                "{}: dropping stale load #{} (current #{current}, {})",
                canvas.id(),
                pending.generation,
                pending.canvas
            );
            return None;
        }

        let Some(scene) = pending.scene else {
            canvas.clear();
            {
                let mut shared = self.shared.borrow_mut();
                shared.table.clear();
                shared.loaded = Some(canvas.id());
            }
            self.notify_background(false);
            return Some(ReconcileReport::default());
        };

        canvas.load_document(scene);
        let report = reconcile(canvas, existing_seats, categories);

        self.notify_background(report.has_background);
        if let (Some(rows), Some(publish)) = (&pending.rows, &self.hooks.publish_rows) {
            publish(rows);
        }
        if self.options.style.show_seat_numbers {
            apply_seat_numbers(canvas, &self.options.style);
        }

        let mut strokes = report.original_strokes.clone();
        enforce(canvas, self.options.mode, &mut strokes);

        {
            let mut shared = self.shared.borrow_mut();
            shared.table.seed(strokes);
            shared.categories = CategoryIndex::new(categories);
            shared.loaded = Some(canvas.id());
            if let Some(ids) = shared.selected_seat_ids.clone() {
                let outcome = shared.table.sync_to(canvas, &ids);
                log::debug!("{}: initial selection {:?}", canvas.id(), outcome.selected);
            }
        }

        if self.options.mode.binds_click() {
            self.bind(canvas, current);
        }
        log::debug!("{}: load #{current} complete", canvas.id());
        Some(report)
    }

    /// Detach the click listener and invalidate any in-flight load.
    ///
    /// A listener bound to a canvas other than `canvas` cannot be reached
    /// here; it stays registered on that canvas but ignores events from now on.
    pub fn teardown(&mut self, canvas: &mut Canvas) {
        self.shared.borrow_mut().generation += 1;
        let Some(binding) = self.binding.take() else {
            return;
        };
        if binding.canvas == canvas.id() {
            canvas.off(binding.listener);
        } else {
            log::debug!(
                "{}: listener left on {} is now inert",
                canvas.id(),
                binding.canvas
            );
        }
    }

    /// Unmount: detach the listener and forget `canvas`. Selection sync
    /// no longer reaches it until the next load.
    pub fn detach(&mut self, canvas: &mut Canvas) {
        self.teardown(canvas);
        let mut shared = self.shared.borrow_mut();
        if shared.loaded == Some(canvas.id()) {
            shared.loaded = None;
            shared.table.clear();
        }
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    fn notify_background(&self, present: bool) {
        if let Some(hook) = &self.hooks.on_background {
            hook(present);
        }
    }

    fn bind(&mut self, canvas: &mut Canvas, generation: u64) {
        let shared = Rc::downgrade(&self.shared);
        let slot: Rc<Cell<Option<ListenerId>>> = Rc::default();
        let own = Rc::clone(&slot);
        let listener = canvas.on(CanvasEventKind::MouseDown, move |canvas, event| {
            if !handle_click(&shared, canvas, event, generation)
                && let Some(id) = own.take()
            {
                log::debug!("{}: removing stale listener from load #{generation}", canvas.id());
                canvas.off(id);
            }
        });
        slot.set(Some(listener));
        self.binding = Some(Binding {
            canvas: canvas.id(),
            listener,
        });
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Update the host-controlled selection. `None` switches to uncontrolled
    /// mode and leaves the canvas as is; `Some` (even empty) syncs the canvas
    /// to exactly that list.
    pub fn set_selected_seat_ids(
        &mut self,
        canvas: &mut Canvas,
        ids: Option<Vec<ObjectId>>,
    ) -> Option<SyncOutcome> {
        let mut shared = self.shared.borrow_mut();
        shared.selected_seat_ids = ids.clone();
        let ids = ids?;
        if shared.loaded != Some(canvas.id()) {
            return None;
        }
        Some(shared.table.sync_to(canvas, &ids))
    }

    /// Replace the change callback. Applies to the next click, including
    /// on the listener already bound.
    pub fn set_on_selection_change(&mut self, callback: Option<SelectionCallback>) {
        self.shared.borrow_mut().on_selection_change = callback;
    }

    /// Currently selected seat ids as drawn on the canvas.
    pub fn selected_ids(&self, canvas: &Canvas) -> Vec<ObjectId> {
        self.shared.borrow().table.selected_ids(canvas)
    }

    pub fn is_controlled(&self) -> bool {
        self.shared.borrow().selected_seat_ids.is_some()
    }

    // ─── Organizer ───────────────────────────────────────────────────────

    /// Recategorize seats against the categories of the current load.
    pub fn assign_category(
        &mut self,
        canvas: &mut Canvas,
        ids: &[ObjectId],
        category: Option<CategoryRef>,
    ) -> usize {
        let mut shared = self.shared.borrow_mut();
        let Shared {
            table, categories, ..
        } = &mut *shared;
        organizer::assign_category(canvas, table, ids, category, categories)
    }

    pub fn set_status(&mut self, canvas: &mut Canvas, ids: &[ObjectId], status: SeatStatus) -> usize {
        organizer::set_status(canvas, ids, status)
    }

    /// The document to save: drawing data only, without selection visuals.
    pub fn export_document(&self, canvas: &Canvas) -> SceneDocument {
        organizer::export_document(canvas, &self.shared.borrow().table)
    }
}

impl fmt::Debug for SeatMapLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.shared.borrow();
        f.debug_struct("SeatMapLoader")
            .field("mode", &self.options.mode)
            .field("generation", &shared.generation)
            .field("controlled", &shared.selected_seat_ids.is_some())
            .field("bound", &self.binding.is_some())
            .finish()
    }
}

/// Click listener body. Ignores clicks on anything but seats. Returns false
/// once the listener is stale: its loader is gone or `generation` is no
/// longer current.
fn handle_click(shared: &Weak<RefCell<Shared>>, canvas: &mut Canvas, event: &CanvasEvent, generation: u64) -> bool {
    let Some(shared) = shared.upgrade() else {
        return false;
    };
    if shared.borrow().generation != generation {
        return false;
    }
    let Some(id) = event
        .target
        .and_then(|idx| canvas.object(idx))
        .filter(|node| node.object.is_seat())
        .map(|node| node.object.id)
    else {
        return true;
    };

    let notify = {
        let mut state = shared.borrow_mut();
        let will_be_selected = !state.table.is_selected(id);

        let ids = match state.selected_seat_ids.clone() {
            None => {
                if will_be_selected {
                    state.table.select(canvas, id);
                } else {
                    state.table.deselect(canvas, id);
                }
                state.table.selected_ids(canvas)
            }
            Some(mut ids) => {
                ids.retain(|&other| other != id);
                if will_be_selected {
                    ids.push(id);
                }
                ids
            }
        };

        state.on_selection_change.clone().map(|callback| {
            let seats = ids
                .iter()
                .filter_map(|&id| canvas.get_by_id(id))
                .map(|node| node.object.seat_data())
                .collect();
            let change = SelectionChange {
                ids,
                seats,
                toggled: id,
                selected: will_be_selected,
            };
            (callback, change)
        })
    };

    // Borrow released: the callback may call back into the loader.
    if let Some((callback, change)) = notify {
        callback(&change);
    }
    true
}
