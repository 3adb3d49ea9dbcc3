//! The rendered tree the serializer walks.
//!
//! A rendered tree is owned by whatever laid it out (a browser, a headless
//! renderer). The walker only needs the handful of reads in
//! [`RenderedElement`]; [`ElementSnapshot`] is an owned copy of those reads
//! that can travel as JSON.

use std::collections::BTreeMap;
use kurbo::Rect;
use serde::{Serialize, Deserialize};

/// Computed style properties the walker reads.
pub const TRACKED_PROPERTIES: &[&str] = &[
    "display",
    "visibility",
    "opacity",
    "overflow",
    "color",
    "background-color",
    "background-image",
    "border-color",
    "border-top-color",
    "border-width",
    "border-top-width",
    "border-top-left-radius",
    "border-top-right-radius",
    "border-bottom-right-radius",
    "border-bottom-left-radius",
    "box-shadow",
    "font-family",
    "font-size",
    "font-weight",
    "line-height",
    "letter-spacing",
    "text-align",
    "text-transform",
];

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
#[serde(transparent)]
pub struct ComputedStyle(BTreeMap<String, String>);

impl ComputedStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// The resolved value, or `""` when the property was not captured.
    pub fn get(&self, property: &str) -> &str {
        self.0.get(property).map(|v| v.as_str()).unwrap_or("")
    }

    /// First non-empty value among `properties`.
    pub fn first_of(&self, properties: &[&str]) -> &str {
        properties
            .iter()
            .map(|p| self.get(p))
            .find(|v| !v.trim().is_empty())
            .unwrap_or("")
    }

    pub fn set(&mut self, property: impl Into<String>, value: impl Into<String>) {
        self.0.insert(property.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ComputedStyle {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

pub trait RenderedElement: Sized {
    fn tag_name(&self) -> String;
    /// Whitespace-separated class tokens.
    fn class_name(&self) -> String;
    /// Child elements in source order; text nodes are not included.
    fn children(&self) -> Vec<Self>;
    /// Concatenated text of this element and all of its descendants.
    fn text_content(&self) -> String;
    /// Border box in absolute (viewport) coordinates.
    fn bounding_box(&self) -> Rect;
    fn computed_style(&self) -> ComputedStyle;
    /// True for an embedded vector graphic root (`<svg>`).
    fn is_vector_graphic(&self) -> bool;
    /// Serialized markup of the element itself, children included.
    fn markup(&self) -> String;

    fn has_class(&self, token: &str) -> bool {
        self.class_name().split_whitespace().any(|c| c == token)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug, Default)]
#[serde(default)]
pub struct SnapshotRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

fn default_tag() -> String {
    "div".to_string()
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct ElementSnapshot {
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(default, rename = "class")]
    pub class_name: String,
    /// Text owned directly by this element, not by its children.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub rect: SnapshotRect,
    #[serde(default)]
    pub style: ComputedStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,
    #[serde(default)]
    pub children: Vec<ElementSnapshot>,
}

impl Default for ElementSnapshot {
    fn default() -> Self {
        Self {
            tag: default_tag(),
            class_name: String::new(),
            text: String::new(),
            rect: SnapshotRect::default(),
            style: ComputedStyle::default(),
            markup: None,
            children: Vec::new(),
        }
    }
}

/// Snapshots are walked by reference, so children are never copied.
impl<'a> RenderedElement for &'a ElementSnapshot {
    fn tag_name(&self) -> String {
        self.tag.to_lowercase()
    }

    fn class_name(&self) -> String {
        self.class_name.clone()
    }

    fn children(&self) -> Vec<Self> {
        let this: &'a ElementSnapshot = self;
        this.children.iter().collect()
    }

    fn text_content(&self) -> String {
        let mut text = self.text.clone();
        for child in &self.children {
            text.push_str(&child.text_content());
        }
        text
    }

    fn bounding_box(&self) -> Rect {
        Rect::from_origin_size((self.rect.x, self.rect.y), (self.rect.width, self.rect.height))
    }

    fn computed_style(&self) -> ComputedStyle {
        self.style.clone()
    }

    fn is_vector_graphic(&self) -> bool {
        self.tag.eq_ignore_ascii_case("svg")
    }

    fn markup(&self) -> String {
        self.markup.clone().unwrap_or_default()
    }
}
