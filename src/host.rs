//! The design tool on the receiving end of an import.
//!
//! A host owns the objects it creates; the reconstructor only drives it
//! through [`DesignHost`] and never reads them back beyond a node's width.

use async_trait::async_trait;
use serde::{Serialize, Deserialize};
use crate::error::HostError;
use crate::types::{CornerRadii, Effect, FontName, Paint, TextAlign, TextCase};

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(pub u32);

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum NodeKind<'a> {
    Frame,
    Text,
    Rectangle,
    /// Native vector object built from SVG markup.
    Vector(&'a str),
}

#[derive(Clone, PartialEq, Debug)]
pub enum NodeProperty {
    Name(String),
    Position { x: f64, y: f64 },
    Size { width: f64, height: f64 },
    /// Turns off text auto-resize and pins the box to this size.
    FixedSize { width: f64, height: f64 },
    Fills(Vec<Paint>),
    Strokes(Vec<Paint>),
    StrokeWeight(f64),
    Opacity(f64),
    CornerRadii(CornerRadii),
    Effects(Vec<Effect>),
    ClipsContent(bool),
    FontName(FontName),
    Characters(String),
    FontSize(f64),
    LineHeightPx(f64),
    LetterSpacingPx(f64),
    TextAlign(TextAlign),
    TextCase(TextCase),
}

impl NodeProperty {
    pub fn label(&self) -> &'static str {
        match self {
            NodeProperty::Name(_) => "name",
            NodeProperty::Position { .. } => "position",
            NodeProperty::Size { .. } => "size",
            NodeProperty::FixedSize { .. } => "fixed size",
            NodeProperty::Fills(_) => "fills",
            NodeProperty::Strokes(_) => "strokes",
            NodeProperty::StrokeWeight(_) => "stroke weight",
            NodeProperty::Opacity(_) => "opacity",
            NodeProperty::CornerRadii(_) => "corner radii",
            NodeProperty::Effects(_) => "effects",
            NodeProperty::ClipsContent(_) => "clips content",
            NodeProperty::FontName(_) => "font name",
            NodeProperty::Characters(_) => "characters",
            NodeProperty::FontSize(_) => "font size",
            NodeProperty::LineHeightPx(_) => "line height",
            NodeProperty::LetterSpacingPx(_) => "letter spacing",
            NodeProperty::TextAlign(_) => "text align",
            NodeProperty::TextCase(_) => "text case",
        }
    }
}

/// Status posted to the host's message channel when an import ends.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HostMessage {
    Success { message: String },
    Error { message: String },
}

impl HostMessage {
    pub fn is_success(&self) -> bool {
        matches!(self, HostMessage::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            HostMessage::Success { message } | HostMessage::Error { message } => message,
        }
    }
}

#[async_trait(?Send)]
pub trait DesignHost {
    /// Makes `font` usable by text nodes. Rejects when the font is unavailable.
    async fn load_font(&mut self, font: &FontName) -> Result<(), HostError>;

    fn create_node(&mut self, kind: NodeKind<'_>) -> Result<NodeId, HostError>;

    fn set_property(&mut self, node: NodeId, property: NodeProperty) -> Result<(), HostError>;

    /// Appends `child` to `parent`, or to the current page when `parent` is `None`.
    fn append_child(&mut self, parent: Option<NodeId>, child: NodeId) -> Result<(), HostError>;

    /// Width of the node as created, which may differ from the width requested.
    fn node_width(&self, node: NodeId) -> Result<f64, HostError>;

    fn fit_to_view(&mut self, nodes: &[NodeId]);

    fn post_message(&mut self, message: HostMessage);
}
