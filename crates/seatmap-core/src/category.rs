//! Backend truth consumed by reconciliation: ticket categories and
//! persisted seat records.

use crate::id::ObjectId;
use crate::model::{CategoryRef, SeatStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// A ticket category as configured for the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketCategory {
    pub id: CategoryRef,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TicketCategory {
    pub fn new(id: impl Into<CategoryRef>, color: &str) -> Self {
        Self {
            id: id.into(),
            color: Some(color.to_string()),
            name: None,
            extra: Map::new(),
        }
    }
}

/// A seat record persisted by the order backend, keyed by canvas object id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingSeat {
    pub canvas_seat_id: ObjectId,
    #[serde(default)]
    pub ticket_category_id: Option<CategoryRef>,
    #[serde(default)]
    pub status: Option<SeatStatus>,
}

/// Valid category ids plus lookup by id, built once per load.
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    valid: HashSet<CategoryRef>,
    by_id: HashMap<CategoryRef, TicketCategory>,
}

impl CategoryIndex {
    pub fn new(categories: &[TicketCategory]) -> Self {
        let mut index = Self::default();
        for category in categories {
            index.valid.insert(category.id.clone());
            index.by_id.insert(category.id.clone(), category.clone());
        }
        index
    }

    pub fn contains(&self, id: &CategoryRef) -> bool {
        self.valid.contains(id)
    }

    pub fn get(&self, id: &CategoryRef) -> Option<&TicketCategory> {
        self.by_id.get(id)
    }

    /// Display color of a known category.
    pub fn color(&self, id: &CategoryRef) -> Option<&str> {
        self.get(id)?.color.as_deref()
    }

    pub fn len(&self) -> usize {
        self.valid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valid.is_empty()
    }
}

/// Existing seat records keyed by canvas seat id.
#[derive(Debug, Clone, Default)]
pub struct SeatIndex {
    by_id: HashMap<ObjectId, ExistingSeat>,
}

impl SeatIndex {
    /// Returns `None` for an empty record list — there is nothing to override.
    pub fn build(seats: &[ExistingSeat]) -> Option<Self> {
        if seats.is_empty() {
            return None;
        }
        let by_id = seats
            .iter()
            .map(|seat| (seat.canvas_seat_id, seat.clone()))
            .collect();
        Some(Self { by_id })
    }

    pub fn get(&self, id: ObjectId) -> Option<&ExistingSeat> {
        self.by_id.get(&id)
    }
}
