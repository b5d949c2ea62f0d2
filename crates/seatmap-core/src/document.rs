//! Persisted layout documents.
//!
//! The backend stores a seat map as the canvas library's JSON, optionally
//! wrapped with a `rows` sibling that belongs to the row-labeling feature.
//! [`LayoutDocument::split`] separates the two so only drawing data reaches
//! the canvas.

use crate::model::SceneObject;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque row-labeling metadata forwarded to the host untouched.
pub type RowMetadata = Value;

/// Error raised when a stored layout cannot be read.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("layout is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("layout must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Pure drawing data: the object list plus document-level keys
/// (`version`, `background`, …) preserved for export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default)]
    pub objects: Vec<SceneObject>,

    #[serde(flatten)]
    pub meta: Map<String, Value>,
}

impl SceneDocument {
    pub fn new(objects: Vec<SceneObject>) -> Self {
        Self {
            objects,
            meta: Map::new(),
        }
    }

    pub fn to_json(&self) -> Result<String, LayoutError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A layout as stored by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutDocument {
    #[serde(flatten)]
    pub scene: SceneDocument,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<RowMetadata>>,
}

impl LayoutDocument {
    /// Parse a stored layout. Accepts the object itself or a JSON string
    /// holding it (layouts saved as text columns arrive double-encoded).
    pub fn from_json(text: &str) -> Result<Self, LayoutError> {
        let value: Value = serde_json::from_str(text)?;
        parse_layout(&value)
    }

    /// Separate drawing data from row metadata.
    pub fn split(self) -> (SceneDocument, Option<Vec<RowMetadata>>) {
        (self.scene, self.rows)
    }
}

impl From<SceneDocument> for LayoutDocument {
    fn from(scene: SceneDocument) -> Self {
        Self { scene, rows: None }
    }
}

/// Read a layout from an already-parsed JSON value.
pub fn parse_layout(value: &Value) -> Result<LayoutDocument, LayoutError> {
    match value {
        Value::Object(_) => Ok(LayoutDocument::deserialize(value)?),
        Value::String(inner) => {
            let inner: Value = serde_json::from_str(inner)?;
            match inner {
                Value::Object(_) => Ok(LayoutDocument::deserialize(&inner)?),
                other => Err(LayoutError::NotAnObject(json_kind(&other))),
            }
        }
        other => Err(LayoutError::NotAnObject(json_kind(other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "version": "5.3.0",
            "objects": [
                { "type": "circle", "id": "s1", "customType": "seat", "radius": 10 }
            ],
            "rows": [ { "label": "A", "seats": ["s1"] } ]
        })
    }

    #[test]
    fn split_extracts_rows() {
        let layout = parse_layout(&sample()).unwrap();
        let (scene, rows) = layout.split();

        assert_eq!(scene.objects.len(), 1);
        assert_eq!(scene.meta.get("version"), Some(&json!("5.3.0")));
        assert!(!scene.meta.contains_key("rows"));
        assert_eq!(rows, Some(vec![json!({ "label": "A", "seats": ["s1"] })]));
    }

    #[test]
    fn string_encoded_layout_parses_like_object() {
        let encoded = Value::String(sample().to_string());
        assert_eq!(parse_layout(&encoded).unwrap(), parse_layout(&sample()).unwrap());
    }

    #[test]
    fn from_json_handles_double_encoding() {
        let double = serde_json::to_string(&sample().to_string()).unwrap();
        let layout = LayoutDocument::from_json(&double).unwrap();
        assert_eq!(layout.scene.objects.len(), 1);
    }

    #[test]
    fn missing_objects_is_an_empty_document() {
        let layout = parse_layout(&json!({ "version": "5.3.0" })).unwrap();
        assert!(layout.scene.objects.is_empty());
        assert_eq!(layout.rows, None);
    }

    #[test]
    fn non_object_layouts_are_rejected() {
        let err = parse_layout(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, LayoutError::NotAnObject("an array")));
        assert!(LayoutDocument::from_json("{not json").is_err());
    }

    #[test]
    fn scene_meta_roundtrips_on_export() {
        let (scene, _) = parse_layout(&sample()).unwrap().split();
        let out: Value = serde_json::from_str(&scene.to_json().unwrap()).unwrap();
        assert_eq!(out["version"], "5.3.0");
        assert!(out.get("rows").is_none());
        assert_eq!(out["objects"][0]["id"], "s1");
    }
}
