use serde::{de, Serialize, Deserialize, Deserializer};
use serde_json::Value;
use crate::lenient;
use crate::types::{CornerRadii, Effect, Paint, TextAlign, TextCase};

/// The only interchange version this crate reads or writes.
pub const FORMAT_VERSION: i64 = 1;

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct InterchangeDocument {
    pub version: i64,
    pub pages: Vec<VisualNode>,
}

impl InterchangeDocument {
    pub fn new(pages: Vec<VisualNode>) -> Self {
        Self { version: FORMAT_VERSION, pages }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Geometry and naming shared by every node variant. Coordinates are relative
/// to the parent node's origin.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
#[serde(default)]
pub struct NodeBase {
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(deserialize_with = "lenient::number")]
    pub x: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub y: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub width: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub height: f64,
}

#[derive(Serialize, Clone, PartialEq, Debug)]
#[serde(tag = "type")]
pub enum VisualNode {
    #[serde(rename = "FRAME")]
    Frame(FrameNode),
    #[serde(rename = "TEXT")]
    Text(TextNode),
    #[serde(rename = "VECTOR")]
    Vector(VectorNode),
}

// "SVG" is the older name for VECTOR; any other type reads as a frame.
impl<'de> Deserialize<'de> for VisualNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let node = match value.get("type").and_then(Value::as_str) {
            Some("TEXT") => TextNode::deserialize(value).map(VisualNode::Text),
            Some("VECTOR") | Some("SVG") => VectorNode::deserialize(value).map(VisualNode::Vector),
            Some("FRAME") | None => FrameNode::deserialize(value).map(VisualNode::Frame),
            Some(other) => {
                log::debug!("reading node type `{}` as a frame", other);
                FrameNode::deserialize(value).map(VisualNode::Frame)
            }
        };
        node.map_err(de::Error::custom)
    }
}

impl VisualNode {
    pub fn base(&self) -> &NodeBase {
        match self {
            VisualNode::Frame(n) => &n.base,
            VisualNode::Text(n) => &n.base,
            VisualNode::Vector(n) => &n.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut NodeBase {
        match self {
            VisualNode::Frame(n) => &mut n.base,
            VisualNode::Text(n) => &mut n.base,
            VisualNode::Vector(n) => &mut n.base,
        }
    }

    pub fn children(&self) -> &[VisualNode] {
        match self {
            VisualNode::Frame(n) => &n.children,
            _ => &[],
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct FrameNode {
    #[serde(flatten)]
    pub base: NodeBase,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub fills: Option<Vec<Paint>>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub strokes: Option<Vec<Paint>>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub stroke_weight: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(flatten)]
    pub radii: CornerRadii,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub effects: Option<Vec<Effect>>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub clips_content: Option<bool>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub children: Vec<VisualNode>,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct TextNode {
    #[serde(flatten)]
    pub base: NodeBase,
    #[serde(default, deserialize_with = "lenient::text")]
    pub characters: String,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, deserialize_with = "lenient::weight", skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<u16>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub line_height_px: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub letter_spacing_px: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub text_align_horizontal: Option<TextAlign>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub text_case: Option<TextCase>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub fills: Option<Vec<Paint>>,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
pub struct VectorNode {
    #[serde(flatten)]
    pub base: NodeBase,
    #[serde(default, deserialize_with = "lenient::text")]
    pub svg: String,
}
