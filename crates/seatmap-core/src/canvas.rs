//! Live canvas: the retained-mode scene graph a seat map is drawn from.
//!
//! Documents are deserialized into a `StableDiGraph` of [`CanvasObject`]s.
//! Top-level objects live in an explicit draw-order stack (back to front);
//! group → child containment is a graph edge, and child coordinates are
//! relative to the group's center. `NodeIndex` handles stay valid across
//! removals, so callers can hold on to decorations they created.
//!
//! The canvas is owned by the host. Engines populate and depopulate it and
//! react to its events through the listener registry ([`Canvas::on`] /
//! [`Canvas::off`] / [`Canvas::fire`]). Clearing the canvas does not remove
//! listeners.

use crate::document::SceneDocument;
use crate::id::ObjectId;
use crate::model::{ObjectType, SceneObject};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde_json::Map;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// ─── Interaction ─────────────────────────────────────────────────────────

/// Pointer cursor names (CSS values).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
    Move,
}

impl Cursor {
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Pointer => "pointer",
            Self::Move => "move",
        }
    }
}

/// Per-object manipulation capabilities.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interaction {
    /// Can become the canvas' active object (click or marquee).
    pub selectable: bool,
    /// Receives pointer events at all.
    pub evented: bool,
    pub has_controls: bool,
    pub has_borders: bool,
    pub lock_movement_x: bool,
    pub lock_movement_y: bool,
    pub lock_rotation: bool,
    pub lock_scaling_x: bool,
    pub lock_scaling_y: bool,
    pub hover_cursor: Cursor,
}

impl Default for Interaction {
    /// Everything a general-purpose drawing canvas allows.
    fn default() -> Self {
        Self {
            selectable: true,
            evented: true,
            has_controls: true,
            has_borders: true,
            lock_movement_x: false,
            lock_movement_y: false,
            lock_rotation: false,
            lock_scaling_x: false,
            lock_scaling_y: false,
            hover_cursor: Cursor::Move,
        }
    }
}

impl Interaction {
    /// Fully inert: no events, no manipulation, default cursor.
    pub fn locked() -> Self {
        Self {
            selectable: false,
            evented: false,
            has_controls: false,
            has_borders: false,
            lock_movement_x: true,
            lock_movement_y: true,
            lock_rotation: true,
            lock_scaling_x: true,
            lock_scaling_y: true,
            hover_cursor: Cursor::Default,
        }
    }

    /// Inert for manipulation but still receives clicks, with a pointer cursor.
    pub fn click_only() -> Self {
        Self {
            evented: true,
            hover_cursor: Cursor::Pointer,
            ..Self::locked()
        }
    }

    /// True when no move/scale/rotate/select capability is left.
    pub fn is_locked_down(&self) -> bool {
        !self.selectable
            && !self.has_controls
            && !self.has_borders
            && self.lock_movement_x
            && self.lock_movement_y
            && self.lock_rotation
            && self.lock_scaling_x
            && self.lock_scaling_y
    }
}

/// Canvas-wide behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSettings {
    /// Drag-to-select marquee.
    pub selection: bool,
    pub default_cursor: Cursor,
    pub hover_cursor: Cursor,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            selection: true,
            default_cursor: Cursor::Default,
            hover_cursor: Cursor::Move,
        }
    }
}

// ─── Objects ─────────────────────────────────────────────────────────────

/// Derived visuals drawn on behalf of a seat. Never exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecorationKind {
    /// Checkmark badge shown while a seat is selected.
    SelectionMark,
    /// Seat number text.
    SeatNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoration {
    pub owner: ObjectId,
    pub kind: DecorationKind,
}

/// A node in the live canvas.
///
/// `object.objects` is always empty here: group children are graph nodes.
#[derive(Debug, Clone)]
pub struct CanvasObject {
    pub object: SceneObject,
    pub interaction: Interaction,
    pub decoration: Option<Decoration>,
}

impl CanvasObject {
    pub fn exclude_from_export(&self) -> bool {
        self.decoration.is_some()
    }
}

// ─── Events ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanvasEventKind {
    MouseDown,
    MouseUp,
}

/// A pointer event after target resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasEvent {
    pub kind: CanvasEventKind,
    /// Topmost evented top-level object under the pointer.
    pub target: Option<NodeIndex>,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanvasId(u64);

impl fmt::Display for CanvasId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "canvas#{}", self.0)
    }
}

type Handler = Box<dyn FnMut(&mut Canvas, &CanvasEvent)>;

struct Listener {
    id: ListenerId,
    kind: CanvasEventKind,
    handler: Handler,
}

// ─── Canvas ──────────────────────────────────────────────────────────────

pub struct Canvas {
    id: CanvasId,

    /// Object storage; edges go from group → child.
    pub graph: StableDiGraph<CanvasObject, ()>,

    /// Top-level draw order, back to front.
    stack: Vec<NodeIndex>,

    /// Index from ObjectId → NodeIndex for top-level objects.
    id_index: HashMap<ObjectId, NodeIndex>,

    /// Document-level keys carried from load to export.
    meta: Map<String, serde_json::Value>,

    pub settings: CanvasSettings,

    listeners: Vec<Listener>,
    registered: HashSet<ListenerId>,
    next_listener: u64,
}

impl Canvas {
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self {
            id: CanvasId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
            graph: StableDiGraph::new(),
            stack: Vec::new(),
            id_index: HashMap::new(),
            meta: Map::new(),
            settings: CanvasSettings::default(),
            listeners: Vec::new(),
            registered: HashSet::new(),
            next_listener: 0,
        }
    }

    pub fn id(&self) -> CanvasId {
        self.id
    }

    /// Remove every object. Settings and listeners are kept.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.stack.clear();
        self.id_index.clear();
        self.meta.clear();
    }

    /// Replace the canvas contents with a document's objects.
    pub fn load_document(&mut self, document: SceneDocument) -> Vec<NodeIndex> {
        self.clear();
        self.meta = document.meta;
        let added: Vec<NodeIndex> = document.objects.into_iter().map(|o| self.add(o)).collect();
        log::debug!("{}: loaded {} objects", self.id, added.len());
        added
    }

    /// Add a top-level object (and its group children) on top of the stack.
    pub fn add(&mut self, object: SceneObject) -> NodeIndex {
        self.add_with(object, Interaction::default(), None)
    }

    /// Add a derived, non-interactive decoration on top of the stack.
    pub fn add_decoration(&mut self, object: SceneObject, decoration: Decoration) -> NodeIndex {
        self.add_with(object, Interaction::locked(), Some(decoration))
    }

    fn add_with(
        &mut self,
        object: SceneObject,
        interaction: Interaction,
        decoration: Option<Decoration>,
    ) -> NodeIndex {
        let id = object.id;
        let idx = self.insert_tree(object, interaction, decoration);
        self.stack.push(idx);
        if decoration.is_none() && !id.is_empty() {
            if self.id_index.contains_key(&id) {
                log::debug!("{}: duplicate object id {id}, keeping first", self.id);
            } else {
                self.id_index.insert(id, idx);
            }
        }
        idx
    }

    fn insert_tree(
        &mut self,
        mut object: SceneObject,
        interaction: Interaction,
        decoration: Option<Decoration>,
    ) -> NodeIndex {
        let children = std::mem::take(&mut object.objects);
        let idx = self.graph.add_node(CanvasObject {
            object,
            interaction,
            decoration,
        });
        for child in children {
            let child_idx = self.insert_tree(child, interaction, decoration);
            self.graph.add_edge(idx, child_idx, ());
        }
        idx
    }

    /// Remove a top-level object and its children, returning the object tree.
    pub fn remove(&mut self, idx: NodeIndex) -> Option<SceneObject> {
        let pos = self.stack.iter().position(|&i| i == idx)?;
        let tree = self.object_tree(idx);
        self.stack.remove(pos);
        if let Some(id) = tree.as_ref().map(|o| o.id)
            && self.id_index.get(&id) == Some(&idx)
        {
            self.id_index.remove(&id);
        }
        self.remove_subtree(idx);
        tree
    }

    fn remove_subtree(&mut self, idx: NodeIndex) {
        for child in self.children(idx) {
            self.remove_subtree(child);
        }
        self.graph.remove_node(idx);
    }

    /// Give a top-level object a new id, keeping the index in sync.
    pub fn assign_id(&mut self, idx: NodeIndex, id: ObjectId) {
        let Some(node) = self.graph.node_weight_mut(idx) else {
            return;
        };
        let old = std::mem::replace(&mut node.object.id, id);
        if self.id_index.get(&old) == Some(&idx) {
            self.id_index.remove(&old);
        }
        self.id_index.insert(id, idx);
    }

    pub fn object(&self, idx: NodeIndex) -> Option<&CanvasObject> {
        self.graph.node_weight(idx)
    }

    pub fn object_mut(&mut self, idx: NodeIndex) -> Option<&mut CanvasObject> {
        self.graph.node_weight_mut(idx)
    }

    /// Look up a top-level object by its id.
    pub fn get_by_id(&self, id: ObjectId) -> Option<&CanvasObject> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn index_of(&self, id: ObjectId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn contains_id(&self, id: ObjectId) -> bool {
        self.id_index.contains_key(&id)
    }

    /// Top-level objects in draw order (back to front), decorations included.
    pub fn top_level(&self) -> &[NodeIndex] {
        &self.stack
    }

    /// Top-level document objects (no decorations) in draw order.
    pub fn objects(&self) -> Vec<NodeIndex> {
        self.stack
            .iter()
            .copied()
            .filter(|&idx| !self.graph[idx].exclude_from_export())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Get the parent index of a group child.
    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Children of a group in document (insertion) order.
    ///
    /// Sorts by `NodeIndex` so the result is deterministic regardless of
    /// how `petgraph` iterates its adjacency list.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .collect();
        children.sort();
        children
    }

    /// The circle that carries a seat's stroke: the first circle child of a
    /// group, or the object itself.
    pub fn body(&self, idx: NodeIndex) -> NodeIndex {
        self.inner_circle(idx).unwrap_or(idx)
    }

    /// First circle child of a group.
    pub fn inner_circle(&self, idx: NodeIndex) -> Option<NodeIndex> {
        if self.graph.node_weight(idx)?.object.kind != ObjectType::Group {
            return None;
        }
        self.children(idx)
            .into_iter()
            .find(|&c| self.graph[c].object.is_circle())
    }

    /// Decorations of `kind` owned by `owner`.
    pub fn decorations_of(&self, owner: ObjectId, kind: DecorationKind) -> Vec<NodeIndex> {
        self.stack
            .iter()
            .copied()
            .filter(|&idx| self.graph[idx].decoration == Some(Decoration { owner, kind }))
            .collect()
    }

    /// Move a top-level object to the back of the draw order.
    /// Returns true if the order changed.
    pub fn send_to_back(&mut self, idx: NodeIndex) -> bool {
        match self.stack.iter().position(|&i| i == idx) {
            Some(0) | None => false,
            Some(pos) => {
                let node = self.stack.remove(pos);
                self.stack.insert(0, node);
                true
            }
        }
    }

    /// Move a top-level object to the front of the draw order.
    /// Returns true if the order changed.
    pub fn bring_to_front(&mut self, idx: NodeIndex) -> bool {
        let last = self.stack.len().saturating_sub(1);
        match self.stack.iter().position(|&i| i == idx) {
            Some(pos) if pos != last => {
                let node = self.stack.remove(pos);
                self.stack.push(node);
                true
            }
            _ => false,
        }
    }

    /// Rebuild the nested object (children folded back into `objects`).
    pub fn object_tree(&self, idx: NodeIndex) -> Option<SceneObject> {
        let node = self.graph.node_weight(idx)?;
        let mut object = node.object.clone();
        object.objects = self
            .children(idx)
            .into_iter()
            .filter_map(|child| self.object_tree(child))
            .collect();
        Some(object)
    }

    /// Serialize the canvas back to a document, leaving decorations out.
    pub fn to_document(&self) -> SceneDocument {
        SceneDocument {
            objects: self
                .objects()
                .into_iter()
                .filter_map(|idx| self.object_tree(idx))
                .collect(),
            meta: self.meta.clone(),
        }
    }

    // ─── Listeners ───────────────────────────────────────────────────────

    /// Register a handler. Handlers run in registration order.
    pub fn on(
        &mut self,
        kind: CanvasEventKind,
        handler: impl FnMut(&mut Canvas, &CanvasEvent) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.registered.insert(id);
        self.listeners.push(Listener {
            id,
            kind,
            handler: Box::new(handler),
        });
        id
    }

    /// Unregister a handler. Returns false if it was not registered.
    /// Safe to call from inside a handler.
    pub fn off(&mut self, id: ListenerId) -> bool {
        if !self.registered.remove(&id) {
            return false;
        }
        self.listeners.retain(|l| l.id != id);
        true
    }

    /// Number of registered handlers for `kind`.
    pub fn listener_count(&self, kind: CanvasEventKind) -> usize {
        self.listeners
            .iter()
            .filter(|l| l.kind == kind && self.registered.contains(&l.id))
            .count()
    }

    /// Run every handler registered for the event's kind.
    /// Returns how many handlers ran.
    pub fn fire(&mut self, event: &CanvasEvent) -> usize {
        let mut listeners = std::mem::take(&mut self.listeners);
        let mut invoked = 0;
        for listener in &mut listeners {
            if listener.kind != event.kind || !self.registered.contains(&listener.id) {
                continue;
            }
            (listener.handler)(self, event);
            invoked += 1;
        }
        // Handlers registered during dispatch were pushed onto `self.listeners`.
        listeners.append(&mut self.listeners);
        listeners.retain(|l| self.registered.contains(&l.id));
        self.listeners = listeners;
        invoked
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("id", &self.id)
            .field("objects", &self.stack.len())
            .field("settings", &self.settings)
            .field("listeners", &self.registered.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CustomType;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    fn seat(id: &str) -> SceneObject {
        SceneObject {
            id: ObjectId::intern(id),
            custom_type: Some(CustomType::Seat),
            ..SceneObject::circle(10.0)
        }
    }

    fn ids(canvas: &Canvas) -> Vec<String> {
        canvas
            .top_level()
            .iter()
            .map(|&i| canvas.graph[i].object.id.as_str().to_string())
            .collect()
    }

    #[test]
    fn load_replaces_contents_and_indexes_ids() {
        let mut canvas = Canvas::new();
        canvas.add(seat("old"));
        canvas.load_document(SceneDocument::new(vec![seat("a"), seat("b")]));

        assert_eq!(ids(&canvas), vec!["a", "b"]);
        assert!(canvas.get_by_id(ObjectId::intern("old")).is_none());
        assert!(canvas.get_by_id(ObjectId::intern("b")).is_some());
    }

    #[test]
    fn group_children_become_graph_nodes() {
        let mut canvas = Canvas::new();
        let group = SceneObject {
            id: ObjectId::intern("g"),
            ..SceneObject::group(vec![SceneObject::circle(8.0), SceneObject::text("A1")])
        };
        let idx = canvas.add(group.clone());

        let children = canvas.children(idx);
        assert_eq!(children.len(), 2);
        assert_eq!(canvas.parent(children[0]), Some(idx));
        assert_eq!(canvas.inner_circle(idx), Some(children[0]));
        assert_eq!(canvas.body(idx), children[0]);
        assert!(canvas.graph[idx].object.objects.is_empty());
        assert_eq!(canvas.object_tree(idx), Some(group));
    }

    #[test]
    fn z_order_moves() {
        let mut canvas = Canvas::new();
        let a = canvas.add(seat("a"));
        canvas.add(seat("b"));
        let c = canvas.add(seat("c"));

        assert!(canvas.send_to_back(c));
        assert_eq!(ids(&canvas), vec!["c", "a", "b"]);
        assert!(!canvas.send_to_back(c));
        assert!(canvas.bring_to_front(a));
        assert_eq!(ids(&canvas), vec!["c", "b", "a"]);
        assert!(!canvas.bring_to_front(a));
    }

    #[test]
    fn export_skips_decorations() {
        let mut canvas = Canvas::new();
        canvas.add(seat("a"));
        canvas.add_decoration(
            SceneObject::text("1"),
            Decoration {
                owner: ObjectId::intern("a"),
                kind: DecorationKind::SeatNumber,
            },
        );

        assert_eq!(canvas.len(), 2);
        let doc = canvas.to_document();
        assert_eq!(doc.objects.len(), 1);
        assert_eq!(doc.objects[0].id.as_str(), "a");
        assert_eq!(
            canvas
                .decorations_of(ObjectId::intern("a"), DecorationKind::SeatNumber)
                .len(),
            1
        );
    }

    #[test]
    fn remove_keeps_other_handles_valid() {
        let mut canvas = Canvas::new();
        let a = canvas.add(seat("a"));
        let b = canvas.add(seat("b"));

        let removed = canvas.remove(a).unwrap();
        assert_eq!(removed.id.as_str(), "a");
        assert!(canvas.object(a).is_none());
        assert_eq!(canvas.object(b).unwrap().object.id.as_str(), "b");
        assert!(!canvas.contains_id(ObjectId::intern("a")));
    }

    #[test]
    fn assign_id_reindexes() {
        let mut canvas = Canvas::new();
        let idx = canvas.add(SceneObject::circle(5.0));
        assert!(canvas.graph[idx].object.id.is_empty());

        canvas.assign_id(idx, ObjectId::intern("fresh"));
        assert_eq!(canvas.index_of(ObjectId::intern("fresh")), Some(idx));
    }

    #[test]
    fn listeners_fire_until_removed_and_survive_clear() {
        let mut canvas = Canvas::new();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let id = canvas.on(CanvasEventKind::MouseDown, move |_, _| {
            counter.set(counter.get() + 1);
        });
        let event = CanvasEvent {
            kind: CanvasEventKind::MouseDown,
            target: None,
            x: 0.0,
            y: 0.0,
        };

        canvas.clear();
        assert_eq!(canvas.fire(&event), 1);
        assert_eq!(
            canvas.fire(&CanvasEvent {
                kind: CanvasEventKind::MouseUp,
                ..event
            }),
            0
        );
        assert!(canvas.off(id));
        assert!(!canvas.off(id));
        assert_eq!(canvas.fire(&event), 0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn handlers_may_unregister_and_register_during_dispatch() {
        let mut canvas = Canvas::new();
        let slot: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));
        let own = Rc::clone(&slot);
        let id = canvas.on(CanvasEventKind::MouseDown, move |canvas, _| {
            if let Some(me) = own.take() {
                canvas.off(me);
                canvas.on(CanvasEventKind::MouseDown, |_, _| {});
            }
        });
        slot.set(Some(id));
        let event = CanvasEvent {
            kind: CanvasEventKind::MouseDown,
            target: None,
            x: 0.0,
            y: 0.0,
        };

        assert_eq!(canvas.fire(&event), 1);
        assert_eq!(canvas.listener_count(CanvasEventKind::MouseDown), 1);
        assert_eq!(canvas.fire(&event), 1);
    }

    #[test]
    fn canvases_have_distinct_ids() {
        assert_ne!(Canvas::new().id(), Canvas::new().id());
    }
}
