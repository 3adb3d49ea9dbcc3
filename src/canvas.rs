use std::collections::HashSet;
use async_trait::async_trait;
use kurbo::{BezPath, Circle, Ellipse, Line, Rect, Shape};
use serde::{Serialize, Deserialize};
use wasm_bindgen::prelude::*;
use crate::error::{HostError, ImportError};
use crate::host::{DesignHost, HostMessage, NodeId, NodeKind, NodeProperty};
use crate::options::ImportOptions;
use crate::reconstruct::{self, ImportSummary};
use crate::types::{ColorValue, CornerRadii, Effect, FontName, Paint, SolidFill, TextAlign, TextCase};

const DEFAULT_FONTS: &[(&str, &[&str])] = &[
    ("Inter", &["Regular", "Medium", "Semi Bold", "Bold"]),
    ("Roboto", &["Regular", "Medium", "Bold"]),
];

const VECTOR_FALLBACK_SIZE: f64 = 24.0;
const PATH_TOLERANCE: f64 = 0.1;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "UPPERCASE")]
pub enum LayerKind {
    Frame,
    Text,
    Rectangle,
    Vector,
}

impl LayerKind {
    fn label(&self) -> &'static str {
        match self {
            LayerKind::Frame => "frame",
            LayerKind::Text => "text",
            LayerKind::Rectangle => "rectangle",
            LayerKind::Vector => "vector",
        }
    }
}

/// One drawable outline of a vector layer, in the layer's own coordinates.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VectorPath {
    pub path_data: String,
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: u32,
    pub kind: LayerKind,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fills: Vec<Paint>,
    pub strokes: Vec<Paint>,
    pub stroke_weight: f64,
    pub opacity: f64,
    #[serde(flatten)]
    pub corner_radii: CornerRadii,
    pub effects: Vec<Effect>,
    pub clips_content: bool,
    pub characters: String,
    pub font: Option<FontName>,
    pub font_size: f64,
    /// `None` means automatic line height.
    pub line_height_px: Option<f64>,
    pub letter_spacing_px: f64,
    pub text_align: TextAlign,
    pub text_case: TextCase,
    pub auto_resize: bool,
    pub paths: Vec<VectorPath>,
    pub children: Vec<u32>,
    pub parent: Option<u32>,
}

impl Layer {
    fn new(id: u32, kind: LayerKind) -> Self {
        let white = Paint::Solid(SolidFill { color: ColorValue::gray(1.0), opacity: 1.0 });
        let fills = match kind {
            LayerKind::Frame => vec![white],
            LayerKind::Rectangle => vec![Paint::Solid(SolidFill { color: ColorValue::gray(0.85), opacity: 1.0 })],
            LayerKind::Text => vec![Paint::Solid(SolidFill { color: ColorValue::gray(0.0), opacity: 1.0 })],
            LayerKind::Vector => Vec::new(),
        };
        let (width, height) = match kind {
            LayerKind::Text => (0.0, 0.0),
            _ => (100.0, 100.0),
        };
        Layer {
            id,
            kind,
            name: match kind {
                LayerKind::Frame => "Frame",
                LayerKind::Text => "Text",
                LayerKind::Rectangle => "Rectangle",
                LayerKind::Vector => "Vector",
            }
            .to_string(),
            x: 0.0,
            y: 0.0,
            width,
            height,
            fills,
            strokes: Vec::new(),
            stroke_weight: 1.0,
            opacity: 1.0,
            corner_radii: CornerRadii::default(),
            effects: Vec::new(),
            clips_content: kind == LayerKind::Frame,
            characters: String::new(),
            font: None,
            font_size: 12.0,
            line_height_px: None,
            letter_spacing_px: 0.0,
            text_align: TextAlign::Left,
            text_case: TextCase::Original,
            auto_resize: kind == LayerKind::Text,
            paths: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// In-memory design surface that accepts reconstructed documents.
#[wasm_bindgen]
pub struct Canvas {
    pub(crate) layers: Vec<Layer>,
    pub(crate) roots: Vec<u32>,
    pub(crate) next_id: u32,
    available_fonts: HashSet<FontName>,
    loaded_fonts: HashSet<FontName>,
    messages: Vec<HostMessage>,
    options: ImportOptions,
    pub viewport_x: f64,
    pub viewport_y: f64,
    pub viewport_zoom: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

#[wasm_bindgen]
impl Canvas {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Canvas {
        console_error_panic_hook::set_once();
        Canvas::default()
    }

    pub fn register_font(&mut self, family: &str, style: &str) {
        self.available_fonts.insert(FontName::new(family, style));
    }

    pub fn set_import_options(&mut self, options: JsValue) -> Result<(), JsValue> {
        self.options = serde_wasm_bindgen::from_value(options)?;
        Ok(())
    }

    /// Imports an interchange document and returns the resulting status message as JSON.
    pub fn import_json(&mut self, json: &str) -> String {
        // canvas futures complete without suspending
        match futures::executor::block_on(self.import(json)) {
            Ok(summary) => log::debug!("canvas holds {} layer(s) after importing {} page(s)", self.layers.len(), summary.pages),
            Err(err) => log::debug!("canvas import stopped: {}", err),
        }
        match self.messages.last() {
            Some(message) => serde_json::to_string(message)
                .unwrap_or_else(|e| format!("{{\"error\": \"Failed to encode status: {}\"}}", e)),
            None => "{}".to_string(),
        }
    }

    pub fn get_layers_json(&self) -> String {
        serde_json::to_string(&self.layers).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn get_viewport(&self) -> String {
        serde_json::json!({ "x": self.viewport_x, "y": self.viewport_y, "zoom": self.viewport_zoom }).to_string()
    }

    pub fn get_messages_json(&self) -> String {
        serde_json::to_string(&self.messages).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn clear(&mut self) {
        self.layers.clear();
        self.roots.clear();
        self.messages.clear();
        self.next_id = 1;
        self.viewport_x = 0.0;
        self.viewport_y = 0.0;
        self.viewport_zoom = 1.0;
    }
}

impl Default for Canvas {
    fn default() -> Self {
        let fonts = DEFAULT_FONTS
            .iter()
            .flat_map(|(family, styles)| styles.iter().map(move |style| FontName::new(*family, *style)));
        Self::with_fonts(fonts)
    }
}

impl Canvas {
    pub fn with_fonts(fonts: impl IntoIterator<Item = FontName>) -> Self {
        Canvas {
            layers: Vec::new(),
            roots: Vec::new(),
            next_id: 1,
            available_fonts: fonts.into_iter().collect(),
            loaded_fonts: HashSet::new(),
            messages: Vec::new(),
            options: ImportOptions::default(),
            viewport_x: 0.0,
            viewport_y: 0.0,
            viewport_zoom: 1.0,
            viewport_width: 800.0,
            viewport_height: 600.0,
        }
    }

    pub async fn import(&mut self, json: &str) -> Result<ImportSummary, ImportError> {
        let options = self.options.clone();
        reconstruct::import_json(self, json, &options).await
    }

    pub fn layer(&self, id: NodeId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id.0)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Top-level layers in the order they were appended.
    pub fn roots(&self) -> Vec<&Layer> {
        self.roots.iter().filter_map(|id| self.layer(NodeId(*id))).collect()
    }

    pub fn children_of(&self, id: NodeId) -> Vec<&Layer> {
        self.layer(id)
            .map(|l| l.children.iter().filter_map(|c| self.layer(NodeId(*c))).collect())
            .unwrap_or_default()
    }

    pub fn messages(&self) -> &[HostMessage] {
        &self.messages
    }

    fn detach(&mut self, child: u32) {
        self.roots.retain(|id| *id != child);
        for layer in &mut self.layers {
            layer.children.retain(|id| *id != child);
        }
    }
}

fn find_layer(layers: &mut [Layer], id: NodeId) -> Result<&mut Layer, HostError> {
    layers.iter_mut().find(|l| l.id == id.0).ok_or(HostError::UnknownNode(id.0))
}

fn only_on(layer: &Layer, kinds: &[LayerKind], property: &'static str) -> Result<(), HostError> {
    if kinds.contains(&layer.kind) {
        Ok(())
    } else {
        Err(HostError::Unsupported { property, kind: layer.kind.label() })
    }
}

fn reject(property: &'static str, reason: impl Into<String>) -> HostError {
    HostError::Rejected { property, reason: reason.into() }
}

fn check_unit(property: &'static str, value: f64) -> Result<(), HostError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(reject(property, format!("{} is outside 0..1", value)))
    }
}

fn type_of(raw: &serde_json::Value) -> &str {
    raw.get("type").and_then(|t| t.as_str()).unwrap_or("(none)")
}

fn check_paint(property: &'static str, paint: &Paint) -> Result<(), HostError> {
    match paint {
        Paint::Solid(fill) => check_unit(property, fill.opacity),
        Paint::GradientLinear(gradient) => {
            if gradient.gradient_stops.len() < 2 {
                return Err(reject(property, "gradients need at least two stops"));
            }
            for stop in &gradient.gradient_stops {
                check_unit(property, stop.position)?;
            }
            Ok(())
        }
        Paint::Unsupported(raw) => Err(reject(property, format!("unsupported paint type {}", type_of(raw)))),
    }
}

/// Text edits other than picking the font need the current font loaded.
fn check_font_loaded(layer: &Layer, loaded: &HashSet<FontName>) -> Result<(), HostError> {
    match &layer.font {
        Some(font) if loaded.contains(font) => Ok(()),
        Some(font) => Err(HostError::FontNotLoaded(font.clone())),
        None => Err(HostError::MissingFont),
    }
}

#[async_trait(?Send)]
impl DesignHost for Canvas {
    async fn load_font(&mut self, font: &FontName) -> Result<(), HostError> {
        if !self.available_fonts.contains(font) {
            return Err(HostError::FontUnavailable(font.clone()));
        }
        self.loaded_fonts.insert(font.clone());
        Ok(())
    }

    fn create_node(&mut self, kind: NodeKind<'_>) -> Result<NodeId, HostError> {
        let id = self.next_id;
        let layer = match kind {
            NodeKind::Frame => Layer::new(id, LayerKind::Frame),
            NodeKind::Text => Layer::new(id, LayerKind::Text),
            NodeKind::Rectangle => Layer::new(id, LayerKind::Rectangle),
            NodeKind::Vector(markup) => {
                let graphic = parse_vector_markup(markup)?;
                let mut layer = Layer::new(id, LayerKind::Vector);
                layer.width = graphic.width;
                layer.height = graphic.height;
                layer.paths = graphic.paths;
                layer
            }
        };
        self.layers.push(layer);
        self.next_id += 1;
        Ok(NodeId(id))
    }

    fn set_property(&mut self, node: NodeId, property: NodeProperty) -> Result<(), HostError> {
        let layer = find_layer(&mut self.layers, node)?;
        match property {
            NodeProperty::Name(name) => layer.name = name,
            NodeProperty::Position { x, y } => {
                layer.x = x;
                layer.y = y;
            }
            NodeProperty::Size { width, height } => {
                if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
                    return Err(reject("size", format!("{}x{} is not a positive size", width, height)));
                }
                layer.width = width;
                layer.height = height;
            }
            NodeProperty::FixedSize { width, height } => {
                only_on(layer, &[LayerKind::Text], "fixed size")?;
                if !(width > 0.0 && height > 0.0) {
                    return Err(reject("fixed size", format!("{}x{} is not a positive size", width, height)));
                }
                layer.width = width;
                layer.height = height;
                layer.auto_resize = false;
            }
            NodeProperty::Fills(paints) => {
                for paint in &paints {
                    check_paint("fills", paint)?;
                }
                layer.fills = paints;
            }
            NodeProperty::Strokes(paints) => {
                if paints.iter().any(|p| !p.is_solid()) {
                    return Err(reject("strokes", "only solid strokes are supported"));
                }
                for paint in &paints {
                    check_paint("strokes", paint)?;
                }
                layer.strokes = paints;
            }
            NodeProperty::StrokeWeight(weight) => {
                if weight < 0.0 {
                    return Err(reject("stroke weight", "must not be negative"));
                }
                layer.stroke_weight = weight;
            }
            NodeProperty::Opacity(opacity) => {
                check_unit("opacity", opacity)?;
                layer.opacity = opacity;
            }
            NodeProperty::CornerRadii(radii) => {
                only_on(layer, &[LayerKind::Frame, LayerKind::Rectangle], "corner radii")?;
                let values = [radii.top_left_radius, radii.top_right_radius, radii.bottom_right_radius, radii.bottom_left_radius];
                if values.iter().any(|r| *r < 0.0) {
                    return Err(reject("corner radii", "must not be negative"));
                }
                layer.corner_radii = radii;
            }
            NodeProperty::Effects(effects) => {
                for effect in &effects {
                    match effect {
                        Effect::DropShadow(shadow) if shadow.radius < 0.0 => {
                            return Err(reject("effects", "shadow radius must not be negative"));
                        }
                        Effect::DropShadow(_) => {}
                        Effect::Unsupported(raw) => {
                            return Err(reject("effects", format!("unsupported effect type {}", type_of(raw))));
                        }
                    }
                }
                layer.effects = effects;
            }
            NodeProperty::ClipsContent(clips) => {
                only_on(layer, &[LayerKind::Frame], "clips content")?;
                layer.clips_content = clips;
            }
            NodeProperty::FontName(font) => {
                only_on(layer, &[LayerKind::Text], "font name")?;
                if !self.loaded_fonts.contains(&font) {
                    return Err(HostError::FontNotLoaded(font));
                }
                layer.font = Some(font);
            }
            NodeProperty::Characters(characters) => {
                only_on(layer, &[LayerKind::Text], "characters")?;
                check_font_loaded(layer, &self.loaded_fonts)?;
                layer.characters = characters;
            }
            NodeProperty::FontSize(size) => {
                only_on(layer, &[LayerKind::Text], "font size")?;
                check_font_loaded(layer, &self.loaded_fonts)?;
                if size < 1.0 {
                    return Err(reject("font size", "must be at least 1"));
                }
                layer.font_size = size;
            }
            NodeProperty::LineHeightPx(line_height) => {
                only_on(layer, &[LayerKind::Text], "line height")?;
                check_font_loaded(layer, &self.loaded_fonts)?;
                layer.line_height_px = Some(line_height);
            }
            NodeProperty::LetterSpacingPx(spacing) => {
                only_on(layer, &[LayerKind::Text], "letter spacing")?;
                check_font_loaded(layer, &self.loaded_fonts)?;
                layer.letter_spacing_px = spacing;
            }
            NodeProperty::TextAlign(align) => {
                only_on(layer, &[LayerKind::Text], "text align")?;
                layer.text_align = align;
            }
            NodeProperty::TextCase(case) => {
                only_on(layer, &[LayerKind::Text], "text case")?;
                check_font_loaded(layer, &self.loaded_fonts)?;
                layer.text_case = case;
            }
        }
        Ok(())
    }

    fn append_child(&mut self, parent: Option<NodeId>, child: NodeId) -> Result<(), HostError> {
        if self.layer(child).is_none() {
            return Err(HostError::UnknownNode(child.0));
        }
        if let Some(parent) = parent {
            let target = self.layer(parent).ok_or(HostError::UnknownNode(parent.0))?;
            only_on(target, &[LayerKind::Frame], "children")?;
        }

        self.detach(child.0);
        match parent {
            Some(parent) => find_layer(&mut self.layers, parent)?.children.push(child.0),
            None => self.roots.push(child.0),
        }
        find_layer(&mut self.layers, child)?.parent = parent.map(|p| p.0);
        Ok(())
    }

    fn node_width(&self, node: NodeId) -> Result<f64, HostError> {
        self.layer(node).map(|l| l.width).ok_or(HostError::UnknownNode(node.0))
    }

    fn fit_to_view(&mut self, nodes: &[NodeId]) {
        let bounds = nodes
            .iter()
            .filter_map(|id| self.layer(*id))
            .map(Layer::bounds)
            .reduce(|a, b| a.union(b));
        let Some(bounds) = bounds else { return };
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return;
        }

        let zoom = (self.viewport_width / bounds.width()).min(self.viewport_height / bounds.height());
        self.viewport_zoom = zoom;
        self.viewport_x = (self.viewport_width - bounds.width() * zoom) / 2.0 - bounds.x0 * zoom;
        self.viewport_y = (self.viewport_height - bounds.height() * zoom) / 2.0 - bounds.y0 * zoom;
    }

    fn post_message(&mut self, message: HostMessage) {
        log::debug!("canvas message: {}", message.message());
        self.messages.push(message);
    }
}

struct VectorGraphic {
    width: f64,
    height: f64,
    paths: Vec<VectorPath>,
}

#[derive(Clone)]
struct PathStyle {
    fill: String,
    stroke: String,
    stroke_width: f64,
}

impl Default for PathStyle {
    fn default() -> Self {
        Self { fill: "#000000".to_string(), stroke: "transparent".to_string(), stroke_width: 1.0 }
    }
}

fn parse_length(value: &str) -> Option<f64> {
    value.trim().trim_end_matches("px").parse::<f64>().ok().filter(|v| *v > 0.0)
}

fn parse_number(node: roxmltree::Node, attribute: &str) -> f64 {
    node.attribute(attribute).and_then(|s| s.trim().parse::<f64>().ok()).unwrap_or(0.0)
}

fn parse_vector_markup(markup: &str) -> Result<VectorGraphic, HostError> {
    let doc = roxmltree::Document::parse(markup).map_err(|e| HostError::InvalidMarkup(e.to_string()))?;
    let root = doc.root_element();
    if root.tag_name().name() != "svg" {
        return Err(HostError::InvalidMarkup(format!("expected <svg>, found <{}>", root.tag_name().name())));
    }

    let mut width = root.attribute("width").and_then(parse_length);
    let mut height = root.attribute("height").and_then(parse_length);
    if let Some(viewbox) = root.attribute("viewBox") {
        let parts: Vec<f64> = viewbox
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter_map(|s| s.parse::<f64>().ok())
            .collect();
        if parts.len() == 4 {
            width = width.or(Some(parts[2]));
            height = height.or(Some(parts[3]));
        }
    }

    let mut paths = Vec::new();
    collect_paths(root, &resolve_style(root, &PathStyle::default()), &mut paths);
    Ok(VectorGraphic {
        width: width.filter(|w| *w > 0.0).unwrap_or(VECTOR_FALLBACK_SIZE),
        height: height.filter(|h| *h > 0.0).unwrap_or(VECTOR_FALLBACK_SIZE),
        paths,
    })
}

fn collect_paths(node: roxmltree::Node, inherited: &PathStyle, paths: &mut Vec<VectorPath>) {
    for child in node.children() {
        if !child.is_element() {
            continue;
        }
        let style = resolve_style(child, inherited);
        let outline = match child.tag_name().name() {
            "rect" => {
                let x = parse_number(child, "x");
                let y = parse_number(child, "y");
                let rect = Rect::new(x, y, x + parse_number(child, "width"), y + parse_number(child, "height"));
                let rx = parse_number(child, "rx").max(parse_number(child, "ry"));
                Some(if rx > 0.0 { rect.to_rounded_rect(rx).to_path(PATH_TOLERANCE) } else { rect.to_path(PATH_TOLERANCE) })
            }
            "circle" => {
                let center = (parse_number(child, "cx"), parse_number(child, "cy"));
                Some(Circle::new(center, parse_number(child, "r")).to_path(PATH_TOLERANCE))
            }
            "ellipse" => {
                let center = (parse_number(child, "cx"), parse_number(child, "cy"));
                let radii = (parse_number(child, "rx"), parse_number(child, "ry"));
                Some(Ellipse::new(center, radii, 0.0).to_path(PATH_TOLERANCE))
            }
            "line" => {
                let line = Line::new(
                    (parse_number(child, "x1"), parse_number(child, "y1")),
                    (parse_number(child, "x2"), parse_number(child, "y2")),
                );
                Some(line.to_path(PATH_TOLERANCE))
            }
            "polyline" | "polygon" => {
                let closed = child.tag_name().name() == "polygon";
                child.attribute("points").and_then(|points| polyline(points, closed))
            }
            "path" => child.attribute("d").and_then(|d| BezPath::from_svg(d).ok()),
            "defs" | "style" | "title" | "desc" | "clipPath" | "mask" => None,
            _ => {
                collect_paths(child, &style, paths);
                None
            }
        };
        if let Some(outline) = outline {
            paths.push(VectorPath {
                path_data: outline.to_svg(),
                fill: style.fill,
                stroke: style.stroke,
                stroke_width: style.stroke_width,
            });
        }
    }
}

fn polyline(points: &str, closed: bool) -> Option<BezPath> {
    let coords: Vec<f64> = points
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter_map(|s| s.parse::<f64>().ok())
        .collect();
    let mut pairs = coords.chunks_exact(2);
    let first = pairs.next()?;
    let mut path = BezPath::new();
    path.move_to((first[0], first[1]));
    for pair in pairs {
        path.line_to((pair[0], pair[1]));
    }
    if closed {
        path.close_path();
    }
    Some(path)
}

fn resolve_style(node: roxmltree::Node, parent: &PathStyle) -> PathStyle {
    let mut fill = node.attribute("fill");
    let mut stroke = node.attribute("stroke");
    let mut stroke_width = node.attribute("stroke-width");
    if let Some(inline) = node.attribute("style") {
        for declaration in inline.split(';') {
            let Some((key, value)) = declaration.split_once(':') else { continue };
            match key.trim() {
                "fill" => fill = Some(value.trim()),
                "stroke" => stroke = Some(value.trim()),
                "stroke-width" => stroke_width = Some(value.trim()),
                _ => {}
            }
        }
    }

    let paint = |value: &str| if value == "none" { "transparent".to_string() } else { value.to_string() };
    let mut style = parent.clone();
    if let Some(fill) = fill {
        style.fill = paint(fill);
    }
    if let Some(stroke) = stroke {
        style.stroke = paint(stroke);
    }
    if let Some(width) = stroke_width.and_then(|w| w.trim_end_matches("px").parse::<f64>().ok()) {
        style.stroke_width = width;
    }
    style
}
