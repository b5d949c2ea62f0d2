//! Scene object model for seat-map documents.
//!
//! A seat map is a flat list of top-level drawable objects (circles, groups,
//! text, a background image) as written by the canvas library's JSON
//! serializer. Objects are discriminated twice: by `type` (the drawing
//! primitive) and by `customType` (the ticketing role — `seat`,
//! `layout-background`, or nothing for decorative elements).
//!
//! Every key the canvas library writes that this crate does not model is
//! kept in `extra` so a load → export cycle loses nothing.

use crate::id::ObjectId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const TRANSPARENT: &str = "transparent";
pub const BLACK: &str = "#000000";

// ─── Lenient scalars ─────────────────────────────────────────────────────

/// A JSON scalar that may be written as a string or a number.
///
/// Backend ids and seat numbers show up both ways (`"5"` and `5`); they are
/// always compared as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum StringOrNumber {
    Str(String),
    Int(i64),
    Float(f64),
}

impl StringOrNumber {
    pub(crate) fn into_string(self) -> String {
        match self {
            Self::Str(s) => s,
            Self::Int(n) => n.to_string(),
            Self::Float(f) if f.fract() == 0.0 && f.is_finite() => format!("{}", f as i64),
            Self::Float(f) => f.to_string(),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Str(s) => s.trim().parse().ok(),
            Self::Int(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
        }
    }
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<StringOrNumber>::deserialize(d)?.map(StringOrNumber::into_string))
}

fn opt_lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(Option::<StringOrNumber>::deserialize(d)?.and_then(|v| v.as_f64()))
}

// ─── Discriminators ──────────────────────────────────────────────────────

/// Drawing primitive (`type` in the document).
///
/// Both the lowercase (`"circle"`) and class-name (`"Circle"`) spellings are
/// accepted; unknown types are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ObjectType {
    Circle,
    Rect,
    Ellipse,
    Group,
    Text,
    IText,
    Textbox,
    Image,
    Path,
    Polygon,
    Line,
    Other(String),
}

impl ObjectType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Circle => "circle",
            Self::Rect => "rect",
            Self::Ellipse => "ellipse",
            Self::Group => "group",
            Self::Text => "text",
            Self::IText => "i-text",
            Self::Textbox => "textbox",
            Self::Image => "image",
            Self::Path => "path",
            Self::Polygon => "polygon",
            Self::Line => "line",
            Self::Other(s) => s,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text | Self::IText | Self::Textbox)
    }
}

impl From<String> for ObjectType {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "circle" => Self::Circle,
            "rect" => Self::Rect,
            "ellipse" => Self::Ellipse,
            "group" => Self::Group,
            "text" => Self::Text,
            "i-text" | "itext" => Self::IText,
            "textbox" => Self::Textbox,
            "image" => Self::Image,
            "path" => Self::Path,
            "polygon" => Self::Polygon,
            "line" => Self::Line,
            _ => Self::Other(s),
        }
    }
}

impl From<ObjectType> for String {
    fn from(t: ObjectType) -> Self {
        t.as_str().to_string()
    }
}

/// Ticketing role of an object (`customType` in the document).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CustomType {
    Seat,
    LayoutBackground,
    Other(String),
}

impl From<String> for CustomType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "seat" => Self::Seat,
            "layout-background" => Self::LayoutBackground,
            _ => Self::Other(s),
        }
    }
}

impl From<CustomType> for String {
    fn from(t: CustomType) -> Self {
        match t {
            CustomType::Seat => "seat".into(),
            CustomType::LayoutBackground => "layout-background".into(),
            CustomType::Other(s) => s,
        }
    }
}

/// Sale status of a seat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SeatStatus {
    #[default]
    Available,
    Sold,
    Locked,
    Reserved,
    Other(String),
}

impl SeatStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Available => "available",
            Self::Sold => "sold",
            Self::Locked => "locked",
            Self::Reserved => "reserved",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for SeatStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "available" => Self::Available,
            "sold" => Self::Sold,
            "locked" => Self::Locked,
            "reserved" => Self::Reserved,
            _ => Self::Other(s),
        }
    }
}

impl From<SeatStatus> for String {
    fn from(s: SeatStatus) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a ticket category id. Written as a string or a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CategoryRef(String);

impl CategoryRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for CategoryRef {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(Self(StringOrNumber::deserialize(d)?.into_string()))
    }
}

impl fmt::Display for CategoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<i64> for CategoryRef {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

// ─── Paint ───────────────────────────────────────────────────────────────

/// Fill or stroke paint: a CSS color string, or a gradient/pattern object
/// that is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Paint {
    Color(String),
    Gradient(Value),
}

impl Paint {
    pub fn color(c: &str) -> Self {
        Self::Color(c.to_string())
    }

    pub fn transparent() -> Self {
        Self::color(TRANSPARENT)
    }

    pub fn black() -> Self {
        Self::color(BLACK)
    }

    pub fn as_color(&self) -> Option<&str> {
        match self {
            Self::Color(c) => Some(c),
            Self::Gradient(_) => None,
        }
    }
}

/// Horizontal placement of `left` relative to the object's box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginX {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical placement of `top` relative to the object's box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginY {
    #[default]
    Top,
    Center,
    Bottom,
}

impl OriginX {
    /// Fraction of the box width that lies left of `left`.
    pub fn factor(self) -> f64 {
        match self {
            Self::Left => 0.0,
            Self::Center => 0.5,
            Self::Right => 1.0,
        }
    }

    fn is_default(&self) -> bool {
        *self == Self::Left
    }
}

impl OriginY {
    /// Fraction of the box height that lies above `top`.
    pub fn factor(self) -> f64 {
        match self {
            Self::Top => 0.0,
            Self::Center => 0.5,
            Self::Bottom => 1.0,
        }
    }

    fn is_default(&self) -> bool {
        *self == Self::Top
    }
}

// ─── Attributes ──────────────────────────────────────────────────────────

/// Denormalized seat attributes read by the ticketing UI.
///
/// `category` and `status` mirror the canonical fields on [`SceneObject`];
/// `number` and `price` are owned here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatAttributes {
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub status: Option<SeatStatus>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_or_number"
    )]
    pub number: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_lenient_f64"
    )]
    pub price: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ─── Scene objects ───────────────────────────────────────────────────────

fn unit_scale() -> f64 {
    1.0
}

fn is_unit_scale(v: &f64) -> bool {
    (*v - 1.0).abs() < f64::EPSILON
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// A single drawable object as it appears in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneObject {
    #[serde(rename = "type")]
    pub kind: ObjectType,

    /// Empty when the document did not carry one.
    #[serde(default, skip_serializing_if = "ObjectId::is_empty")]
    pub id: ObjectId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_type: Option<CustomType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SeatStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<SeatAttributes>,

    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default = "unit_scale", skip_serializing_if = "is_unit_scale")]
    pub scale_x: f64,
    #[serde(default = "unit_scale", skip_serializing_if = "is_unit_scale")]
    pub scale_y: f64,
    #[serde(default, skip_serializing_if = "OriginX::is_default")]
    pub origin_x: OriginX,
    #[serde(default, skip_serializing_if = "OriginY::is_default")]
    pub origin_y: OriginY,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Paint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Paint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub stroke_uniform: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<Value>,

    /// Children of a group, in draw order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objects: Vec<SceneObject>,

    /// Keys written by the canvas library that are not modelled here.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SceneObject {
    pub fn new(kind: ObjectType) -> Self {
        Self {
            kind,
            id: ObjectId::empty(),
            custom_type: None,
            category: None,
            status: None,
            attributes: None,
            left: 0.0,
            top: 0.0,
            width: None,
            height: None,
            radius: None,
            scale_x: 1.0,
            scale_y: 1.0,
            origin_x: OriginX::Left,
            origin_y: OriginY::Top,
            fill: None,
            stroke: None,
            stroke_width: None,
            stroke_uniform: false,
            opacity: None,
            text: None,
            font_size: None,
            font_family: None,
            font_weight: None,
            objects: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn circle(radius: f64) -> Self {
        Self {
            radius: Some(radius),
            ..Self::new(ObjectType::Circle)
        }
    }

    pub fn text(content: &str) -> Self {
        Self {
            text: Some(content.to_string()),
            ..Self::new(ObjectType::Text)
        }
    }

    pub fn group(children: Vec<SceneObject>) -> Self {
        Self {
            objects: children,
            ..Self::new(ObjectType::Group)
        }
    }

    pub fn is_seat(&self) -> bool {
        matches!(self.custom_type, Some(CustomType::Seat))
    }

    pub fn is_background(&self) -> bool {
        matches!(self.custom_type, Some(CustomType::LayoutBackground))
    }

    pub fn is_circle(&self) -> bool {
        self.kind == ObjectType::Circle
    }

    /// Seat number as shown to customers, from `attributes.number`.
    pub fn seat_number(&self) -> Option<&str> {
        self.attributes.as_ref()?.number.as_deref()
    }

    /// Copy the canonical `category`/`status` into `attributes`.
    pub fn mirror_attributes(&mut self) {
        let attrs = self.attributes.get_or_insert_with(SeatAttributes::default);
        attrs.category = self.category.clone();
        attrs.status = self.status.clone();
    }

    /// Scaled extent of the object's box.
    pub fn size(&self) -> (f64, f64) {
        match (self.radius, &self.kind) {
            (Some(r), ObjectType::Circle) => (2.0 * r * self.scale_x, 2.0 * r * self.scale_y),
            _ => {
                let (w, h) = match (self.width, self.height) {
                    (Some(w), Some(h)) => (w, h),
                    _ if self.kind.is_text() => estimate_text_box(self),
                    (w, h) => (w.unwrap_or(0.0), h.unwrap_or(0.0)),
                };
                (w * self.scale_x, h * self.scale_y)
            }
        }
    }

    /// Axis-aligned box in the parent's coordinate space.
    pub fn bounds(&self) -> Bounds {
        let (width, height) = self.size();
        Bounds {
            x: self.left - width * self.origin_x.factor(),
            y: self.top - height * self.origin_y.factor(),
            width,
            height,
        }
    }

    /// Denormalized record handed to selection listeners.
    pub fn seat_data(&self) -> SeatData {
        let attrs = self.attributes.as_ref();
        SeatData {
            id: self.id,
            number: attrs.and_then(|a| a.number.clone()),
            price: attrs.and_then(|a| a.price),
            category: self.category.clone(),
            status: self.status.clone().unwrap_or_default(),
        }
    }
}

/// Text boxes without explicit dimensions: rough metrics from the font size.
fn estimate_text_box(obj: &SceneObject) -> (f64, f64) {
    let size = obj.font_size.unwrap_or(16.0);
    let chars = obj.text.as_deref().map_or(0, |t| t.chars().count());
    (chars as f64 * size * 0.6, size * 1.16)
}

// ─── Seat data ───────────────────────────────────────────────────────────

/// Seat record reported to the host on every selection change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatData {
    pub id: ObjectId,
    pub number: Option<String>,
    pub price: Option<f64>,
    pub category: Option<CategoryRef>,
    pub status: SeatStatus,
}

// ─── Bounds ──────────────────────────────────────────────────────────────

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if this box intersects with a rectangle (AABB overlap).
    pub fn intersects_rect(&self, rx: f64, ry: f64, rw: f64, rh: f64) -> bool {
        self.x < rx + rw
            && self.x + self.width > rx
            && self.y < ry + rh
            && self.y + self.height > ry
    }
}
