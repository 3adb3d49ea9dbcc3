//! Replays an interchange document against a [`DesignHost`].
//!
//! Pages are laid out left to right, each node is built depth-first, and every
//! optional property goes through [`Reconstructor::try_set`] so a host
//! rejecting one property never stops the node or the import. Only shape and
//! version validation, an unloadable font chain, or a failing node creation
//! end an import early; nodes created up to that point are left in place.

use futures::future::{FutureExt, LocalBoxFuture};
use serde_json::Value;
use crate::document::{FrameNode, InterchangeDocument, TextNode, VectorNode, VisualNode, FORMAT_VERSION};
use crate::error::{HostError, ImportError};
use crate::host::{DesignHost, HostMessage, NodeId, NodeKind, NodeProperty};
use crate::options::ImportOptions;
use crate::types::{style_for_weight, FontName, Paint, SolidFill, TextCase};

#[derive(Clone, PartialEq, Debug)]
pub struct ImportSummary {
    pub pages: usize,
    pub nodes: usize,
    pub page_ids: Vec<NodeId>,
}

/// Parses `json` and imports it, reporting the outcome to the host.
pub async fn import_json<H: DesignHost>(host: &mut H, json: &str, options: &ImportOptions) -> Result<ImportSummary, ImportError> {
    let payload: Value = match serde_json::from_str(json) {
        Ok(payload) => payload,
        Err(err) => {
            log::warn!("import payload is not JSON: {}", err);
            return report(host, Err(ImportError::InvalidFormat));
        }
    };
    import_document(host, payload, options).await
}

/// Imports an already-parsed payload, reporting the outcome to the host.
pub async fn import_document<H: DesignHost>(host: &mut H, payload: Value, options: &ImportOptions) -> Result<ImportSummary, ImportError> {
    let result = Reconstructor::new(&mut *host, options).run(payload).await;
    report(host, result)
}

fn report<H: DesignHost>(host: &mut H, result: Result<ImportSummary, ImportError>) -> Result<ImportSummary, ImportError> {
    let message = match &result {
        Ok(summary) => {
            log::info!("imported {} page(s) with {} node(s)", summary.pages, summary.nodes);
            HostMessage::Success { message: format!("Imported {} page(s)", summary.pages) }
        }
        Err(err) => {
            log::error!("{}", err);
            HostMessage::Error { message: err.to_string() }
        }
    };
    host.post_message(message);
    result
}

/// Checks the payload shape and version before anything is created.
pub fn validate(payload: Value) -> Result<InterchangeDocument, ImportError> {
    if !payload.get("pages").map_or(false, Value::is_array) {
        return Err(ImportError::InvalidFormat);
    }
    let version = payload.get("version").cloned().unwrap_or(Value::Null);
    if version.as_i64() != Some(FORMAT_VERSION) {
        return Err(ImportError::UnsupportedVersion(version));
    }
    Ok(serde_json::from_value(payload)?)
}

fn positive_or(value: f64, fallback: f64) -> f64 {
    if value > 0.0 { value } else { fallback }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

pub struct Reconstructor<'a, H: DesignHost> {
    host: &'a mut H,
    options: &'a ImportOptions,
    created: usize,
}

impl<'a, H: DesignHost> Reconstructor<'a, H> {
    pub fn new(host: &'a mut H, options: &'a ImportOptions) -> Self {
        Self { host, options, created: 0 }
    }

    pub async fn run(mut self, payload: Value) -> Result<ImportSummary, ImportError> {
        let document = validate(payload)?;

        let mut offset = 0.0;
        let mut page_ids = Vec::with_capacity(document.pages.len());
        for mut page in document.pages {
            let base = page.base_mut();
            base.x = offset;
            base.y = 0.0;
            let id = self.build(&page, None).await?;
            offset += self.host.node_width(id)? + self.options.page_gap;
            page_ids.push(id);
        }

        self.host.fit_to_view(&page_ids);
        Ok(ImportSummary { pages: page_ids.len(), nodes: self.created, page_ids })
    }

    fn build<'b>(&'b mut self, node: &'b VisualNode, parent: Option<NodeId>) -> LocalBoxFuture<'b, Result<NodeId, ImportError>> {
        async move {
            let id = match node {
                VisualNode::Text(text) => self.build_text(text).await?,
                VisualNode::Vector(vector) => self.build_vector(vector)?,
                VisualNode::Frame(frame) => self.build_frame(frame).await?,
            };
            self.apply_common(id, node);
            self.host.append_child(parent, id)?;
            self.created += 1;
            Ok(id)
        }
        .boxed_local()
    }

    async fn build_text(&mut self, text: &TextNode) -> Result<NodeId, ImportError> {
        let font = self.resolve_font(text).await?;
        let id = self.host.create_node(NodeKind::Text)?;
        self.host.set_property(id, NodeProperty::FontName(font))?;

        let characters = if text.characters.is_empty() { " ".to_string() } else { text.characters.clone() };
        self.host.set_property(id, NodeProperty::Characters(characters))?;

        if let Some(size) = text.font_size.filter(|s| *s > 0.0) {
            self.try_set(id, NodeProperty::FontSize(size));
        }
        if let Some(line_height) = text.line_height_px.filter(|v| *v != 0.0) {
            self.try_set(id, NodeProperty::LineHeightPx(line_height));
        }
        if let Some(spacing) = text.letter_spacing_px.filter(|v| *v != 0.0) {
            self.try_set(id, NodeProperty::LetterSpacingPx(spacing));
        }
        if let Some(align) = text.text_align_horizontal {
            self.try_set(id, NodeProperty::TextAlign(align));
        }
        if let Some(case) = text.text_case.filter(|c| *c != TextCase::Original) {
            self.try_set(id, NodeProperty::TextCase(case));
        }
        self.try_set(id, NodeProperty::FixedSize {
            width: text.base.width.max(1.0),
            height: text.base.height.max(1.0),
        });
        if let Some(fills) = text.fills.as_ref().filter(|f| !f.is_empty()) {
            self.try_set(id, NodeProperty::Fills(fills.clone()));
        }
        Ok(id)
    }

    /// Requested family and weight first, then each configured fallback in turn.
    async fn resolve_font(&mut self, text: &TextNode) -> Result<FontName, ImportError> {
        let options = self.options;
        let family = text
            .font_family
            .as_deref()
            .and_then(|f| f.split(',').next())
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or("Inter");
        let requested = FontName::new(family, style_for_weight(text.font_weight.unwrap_or(400)));

        let chain = std::iter::once(requested.clone()).chain(options.fallback_fonts.iter().cloned());
        for font in chain {
            match self.host.load_font(&font).await {
                Ok(()) => return Ok(font),
                Err(err) => log::info!("could not load font {}: {}", font, err),
            }
        }
        Err(ImportError::FontUnavailable { family: requested.family })
    }

    fn build_vector(&mut self, vector: &VectorNode) -> Result<NodeId, ImportError> {
        let fallback = self.options.default_vector_size;
        let width = positive_or(vector.base.width, fallback).max(1.0);
        let height = positive_or(vector.base.height, fallback).max(1.0);

        let created = if vector.svg.trim().is_empty() {
            Err(HostError::InvalidMarkup("empty markup".to_string()))
        } else {
            self.host.create_node(NodeKind::Vector(&vector.svg))
        };
        let id = match created {
            Ok(id) => id,
            Err(err) => {
                log::warn!("using a placeholder for vector '{}': {}", vector.base.name, err);
                let id = self.host.create_node(NodeKind::Rectangle)?;
                let placeholder = Paint::Solid(SolidFill { color: self.options.placeholder_color, opacity: 1.0 });
                self.try_set(id, NodeProperty::Fills(vec![placeholder]));
                id
            }
        };
        self.try_set(id, NodeProperty::Size { width, height });
        Ok(id)
    }

    async fn build_frame(&mut self, frame: &FrameNode) -> Result<NodeId, ImportError> {
        let id = self.host.create_node(NodeKind::Frame)?;
        self.try_set(id, NodeProperty::Size {
            width: frame.base.width.max(1.0),
            height: frame.base.height.max(1.0),
        });
        // hosts give new frames an opaque background
        self.try_set(id, NodeProperty::Fills(Vec::new()));
        self.try_set(id, NodeProperty::ClipsContent(frame.clips_content.unwrap_or(false)));

        for child in &frame.children {
            self.build(child, Some(id)).await?;
        }
        Ok(id)
    }

    fn apply_common(&mut self, id: NodeId, node: &VisualNode) {
        let base = node.base();
        let name = if base.name.trim().is_empty() { "Layer".to_string() } else { base.name.clone() };
        self.try_set(id, NodeProperty::Name(name));
        self.try_set(id, NodeProperty::Position { x: finite_or_zero(base.x), y: finite_or_zero(base.y) });

        let VisualNode::Frame(frame) = node else { return };
        if let Some(fills) = &frame.fills {
            self.try_set(id, NodeProperty::Fills(fills.clone()));
        }
        if let Some(strokes) = frame.strokes.as_ref().filter(|s| !s.is_empty()) {
            self.try_set(id, NodeProperty::Strokes(strokes.clone()));
        }
        if let Some(weight) = frame.stroke_weight.filter(|w| *w > 0.0) {
            self.try_set(id, NodeProperty::StrokeWeight(weight));
        }
        if let Some(opacity) = frame.opacity.filter(|o| *o < 1.0) {
            self.try_set(id, NodeProperty::Opacity(opacity));
        }
        if !frame.radii.is_zero() {
            self.try_set(id, NodeProperty::CornerRadii(frame.radii));
        }
        if let Some(effects) = frame.effects.as_ref().filter(|e| !e.is_empty()) {
            self.try_set(id, NodeProperty::Effects(effects.clone()));
        }
    }

    fn try_set(&mut self, id: NodeId, property: NodeProperty) {
        let label = property.label();
        if let Err(err) = self.host.set_property(id, property) {
            log::warn!("skipping {} on node {}: {}", label, id.0, err);
        }
    }
}
