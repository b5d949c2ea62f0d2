//! Interaction policy: what a loaded canvas lets the pointer do.
//!
//! The canvas defaults to a general-purpose editor. A customer-facing seat
//! picker strips every capability and gives seats back exactly one: they
//! receive clicks and show a pointer cursor.

use seatmap_core::{Canvas, Cursor, Interaction, NodeIndex, ObjectId, Paint};
use std::collections::HashMap;

/// Which surface the loader is driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoaderMode {
    /// Seat picker: seats toggle on click, nothing else moves.
    #[default]
    Customer,
    /// Layout editor: objects stay editable, the background stays locked.
    Organizer,
    /// Read-only preview: nothing reacts to the pointer.
    Display,
}

impl LoaderMode {
    /// Whether a click listener is bound for this mode.
    pub fn binds_click(self) -> bool {
        !matches!(self, Self::Display)
    }
}

impl std::str::FromStr for LoaderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "customer" | "picker" => Ok(Self::Customer),
            "organizer" | "editor" => Ok(Self::Organizer),
            "display" | "readonly" | "read-only" => Ok(Self::Display),
            other => Err(format!("unknown loader mode: {other}")),
        }
    }
}

/// Apply `mode`'s interaction policy to every object on the canvas.
///
/// In customer mode, group seats get a uniform inner-circle stroke, and
/// `original_strokes` is filled for any seat reconciliation left without
/// a backup.
pub fn enforce(canvas: &mut Canvas, mode: LoaderMode, original_strokes: &mut HashMap<ObjectId, Paint>) {
    for idx in canvas.top_level().to_vec() {
        let node = &canvas.graph[idx];
        let interaction = if node.decoration.is_some() {
            Interaction::locked()
        } else {
            match mode {
                LoaderMode::Customer if node.object.is_seat() => Interaction::click_only(),
                LoaderMode::Organizer if !node.object.is_background() => Interaction::default(),
                _ => Interaction::locked(),
            }
        };
        set_subtree(canvas, idx, interaction);

        if mode == LoaderMode::Customer && canvas.graph[idx].object.is_seat() {
            normalize_group_seat(canvas, idx, original_strokes);
        }
    }

    let settings = &mut canvas.settings;
    match mode {
        LoaderMode::Organizer => {
            settings.selection = true;
            settings.default_cursor = Cursor::Default;
            settings.hover_cursor = Cursor::Move;
        }
        LoaderMode::Customer | LoaderMode::Display => {
            settings.selection = false;
            settings.default_cursor = Cursor::Default;
            settings.hover_cursor = Cursor::Default;
        }
    }
    log::debug!("{}: {mode:?} policy applied", canvas.id());
}

/// Top-level object takes `interaction`; group children never take events
/// of their own.
fn set_subtree(canvas: &mut Canvas, idx: NodeIndex, interaction: Interaction) {
    canvas.graph[idx].interaction = interaction;
    let mut stack = canvas.children(idx);
    while let Some(child) = stack.pop() {
        canvas.graph[child].interaction = Interaction {
            evented: false,
            hover_cursor: Cursor::Default,
            ..interaction
        };
        stack.extend(canvas.children(child));
    }
}

fn normalize_group_seat(
    canvas: &mut Canvas,
    idx: NodeIndex,
    original_strokes: &mut HashMap<ObjectId, Paint>,
) {
    let Some(circle) = canvas.inner_circle(idx) else {
        return;
    };
    let id = canvas.graph[idx].object.id;
    let circle = &mut canvas.graph[circle].object;
    circle.stroke_uniform = true;
    original_strokes
        .entry(id)
        .or_insert_with(|| circle.stroke.clone().unwrap_or_else(Paint::black));
}
