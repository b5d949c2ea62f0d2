pub mod input;
pub mod labels;
pub mod loader;
pub mod organizer;
pub mod policy;
pub mod selection;

pub use input::{Marquee, Modifiers, PointerEvent, cursor_at, dispatch_pointer};
pub use loader::{
    BackgroundCallback, LoaderHooks, LoaderOptions, PendingLoad, RowsCallback, SeatMapLoader,
    SelectionCallback, SelectionChange,
};
pub use policy::LoaderMode;
pub use selection::{SelectionTable, SyncOutcome};
