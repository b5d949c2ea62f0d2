pub mod canvas;
pub mod category;
pub mod document;
pub mod id;
pub mod model;
pub mod reconcile;
pub mod style;

pub use canvas::{
    Canvas, CanvasEvent, CanvasEventKind, CanvasId, CanvasObject, CanvasSettings, Cursor,
    Decoration, DecorationKind, Interaction, ListenerId,
};
pub use category::{CategoryIndex, ExistingSeat, SeatIndex, TicketCategory};
pub use document::{LayoutDocument, LayoutError, RowMetadata, SceneDocument, parse_layout};
pub use id::ObjectId;
pub use model::*;
pub use reconcile::{ReconcileReport, paint_seat, reconcile};
pub use style::{MergedStyle, SeatNumberStyle, SeatStyle};

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
