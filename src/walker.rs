use kurbo::{Point, Rect};
use crate::document::{FrameNode, InterchangeDocument, NodeBase, TextNode, VectorNode, VisualNode};
use crate::error::ExportError;
use crate::options::ExportOptions;
use crate::style::{parse_border_radius, parse_borders, parse_color, parse_effects, parse_fills, parse_float};
use crate::tree::{ComputedStyle, RenderedElement};
use crate::types::{Paint, TextAlign, TextCase};

/// Serializes every page marked beneath `root` into a fresh interchange document.
pub fn export_document<E: RenderedElement>(root: E, options: &ExportOptions) -> Result<InterchangeDocument, ExportError> {
    let mut markers = Vec::new();
    collect_pages(&root, &options.page_marker, &mut markers);
    log::debug!("found {} `{}` page markers", markers.len(), options.page_marker);

    let pages: Vec<VisualNode> = markers.iter().filter_map(serialize_page).collect();
    if pages.is_empty() {
        return Err(ExportError::NoPages { marker: options.page_marker.clone() });
    }
    Ok(InterchangeDocument::new(pages))
}

// Document order, root excluded, nested markers included.
fn collect_pages<E: RenderedElement>(element: &E, marker: &str, pages: &mut Vec<E>) {
    for child in element.children() {
        let is_page = child.has_class(marker);
        let mut nested = Vec::new();
        collect_pages(&child, marker, &mut nested);
        if is_page {
            pages.push(child);
        }
        pages.append(&mut nested);
    }
}

/// Serializes one page; the page itself is re-zeroed to (0, 0).
pub fn serialize_page<E: RenderedElement>(page: &E) -> Option<VisualNode> {
    let origin = page.bounding_box().origin();
    let mut node = serialize_element(page, origin)?;
    let base = node.base_mut();
    base.x = 0.0;
    base.y = 0.0;
    Some(node)
}

/// Serializes `element` with geometry relative to `parent_origin` (absolute).
pub fn serialize_element<E: RenderedElement>(element: &E, parent_origin: Point) -> Option<VisualNode> {
    let style = element.computed_style();
    let rect = element.bounding_box();
    if !is_visible(&style, rect) {
        log::trace!("skipping invisible <{}>", element.tag_name());
        return None;
    }

    let base = NodeBase {
        name: node_name(element),
        x: (rect.x0 - parent_origin.x).round(),
        y: (rect.y0 - parent_origin.y).round(),
        width: rect.width().round(),
        height: rect.height().round(),
    };

    if element.is_vector_graphic() {
        return Some(VisualNode::Vector(VectorNode {
            base,
            svg: resolve_current_color(&element.markup(), style.get("color")),
        }));
    }

    let children = element.children();
    if children.is_empty() {
        let text = element.text_content();
        let text = text.trim();
        if !text.is_empty() {
            return Some(VisualNode::Text(serialize_text(text, &style, base)));
        }
    }

    let border = parse_borders(&style);
    let origin = rect.origin();
    Some(VisualNode::Frame(FrameNode {
        base,
        fills: Some(parse_fills(&style)),
        strokes: Some(border.strokes),
        stroke_weight: Some(border.weight),
        opacity: Some(parse_float(style.get("opacity")).unwrap_or(1.0)),
        radii: parse_border_radius(&style),
        effects: Some(parse_effects(style.get("box-shadow"))),
        clips_content: Some(style.get("overflow").trim() != "visible"),
        children: children.iter().filter_map(|child| serialize_element(child, origin)).collect(),
    }))
}

fn is_visible(style: &ComputedStyle, rect: Rect) -> bool {
    if style.get("display").trim() == "none" || style.get("visibility").trim() == "hidden" {
        return false;
    }
    if parse_float(style.get("opacity")) == Some(0.0) {
        return false;
    }
    !(rect.width() == 0.0 && rect.height() == 0.0)
}

/// First class token that is not a generated `_` hash, else the lower-case tag.
pub fn node_name<E: RenderedElement>(element: &E) -> String {
    element
        .class_name()
        .split_whitespace()
        .find(|c| !c.starts_with('_'))
        .map(str::to_string)
        .unwrap_or_else(|| element.tag_name().to_lowercase())
}

/// Replaces every `currentColor` token in captured markup with the resolved color.
pub fn resolve_current_color(markup: &str, color: &str) -> String {
    let color = color.trim();
    if color.is_empty() {
        return markup.to_string();
    }
    markup.replace("currentColor", color)
}

fn serialize_text(text: &str, style: &ComputedStyle, base: NodeBase) -> TextNode {
    let fills = parse_color(style.get("color")).map(Paint::solid).into_iter().collect();
    let family = style
        .get("font-family")
        .split(',')
        .next()
        .unwrap_or("")
        .trim()
        .replace(['"', '\''], "");

    TextNode {
        base,
        characters: text.to_string(),
        font_size: parse_float(style.get("font-size")).map(f64::round),
        font_family: Some(family).filter(|f| !f.is_empty()),
        font_weight: Some(
            parse_float(style.get("font-weight"))
                .filter(|w| *w >= 1.0 && *w <= 1000.0)
                .map(|w| w as u16)
                .unwrap_or(400),
        ),
        line_height_px: parse_float(style.get("line-height")),
        letter_spacing_px: parse_float(style.get("letter-spacing")),
        text_align_horizontal: Some(TextAlign::from_css(style.get("text-align"))),
        text_case: Some(TextCase::from_css(style.get("text-transform"))),
        fills: Some(fills),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ElementSnapshot;
    use serde_json::{json, Value};

    fn snapshot(value: Value) -> ElementSnapshot {
        serde_json::from_value(value).unwrap()
    }

    fn page(children: Value) -> ElementSnapshot {
        snapshot(json!({
            "class": "root",
            "rect": { "x": 0, "y": 0, "width": 800, "height": 2000 },
            "children": [{
                "class": "pdf-page",
                "rect": { "x": 100.4, "y": 50.2, "width": 595.3, "height": 842 },
                "style": { "background-color": "rgb(255, 255, 255)", "overflow": "hidden" },
                "children": children
            }]
        }))
    }

    fn first_page(root: &ElementSnapshot) -> FrameNode {
        let document = export_document(root, &ExportOptions::default()).unwrap();
        match document.pages.into_iter().next() {
            Some(VisualNode::Frame(frame)) => frame,
            other => panic!("expected frame page, got {:?}", other),
        }
    }

    #[test]
    fn page_is_rezeroed_and_children_rebased() {
        let root = page(json!([{
            "class": "card",
            "rect": { "x": 120.6, "y": 70.5, "width": 200.4, "height": 40.6 },
            "children": [{
                "class": "badge",
                "rect": { "x": 130, "y": 75, "width": 10, "height": 10 },
                "style": { "background-color": "rgb(0, 0, 0)" }
            }]
        }]));
        let page = first_page(&root);
        assert_eq!((page.base.x, page.base.y), (0.0, 0.0));
        assert_eq!((page.base.width, page.base.height), (595.0, 842.0));
        assert_eq!(page.clips_content, Some(true));

        let VisualNode::Frame(card) = &page.children[0] else { panic!("expected frame") };
        assert_eq!((card.base.x, card.base.y, card.base.width, card.base.height), (20.0, 20.0, 200.0, 41.0));
        let badge = card.children[0].base();
        assert_eq!((badge.x, badge.y), (9.0, 5.0));
    }

    #[test]
    fn invisible_subtrees_are_skipped() {
        let root = page(json!([
            { "class": "faded", "rect": { "x": 110, "y": 60, "width": 10, "height": 10 },
              "style": { "opacity": "0" },
              "children": [{ "class": "inner", "text": "hidden", "rect": { "x": 110, "y": 60, "width": 5, "height": 5 } }] },
            { "class": "gone", "style": { "display": "none" }, "rect": { "x": 0, "y": 0, "width": 5, "height": 5 } },
            { "class": "ghost", "style": { "visibility": "hidden" }, "rect": { "x": 0, "y": 0, "width": 5, "height": 5 } },
            { "class": "empty", "rect": { "x": 110, "y": 60, "width": 0, "height": 0 } },
            { "class": "rule", "rect": { "x": 110, "y": 60, "width": 100, "height": 0 },
              "style": { "border-top-color": "rgb(0, 0, 0)", "border-top-width": "1px" } }
        ]));
        let page = first_page(&root);
        assert_eq!(page.children.len(), 1);
        assert_eq!(page.children[0].base().name, "rule");
        assert_eq!(page.children[0].base().height, 0.0);
    }

    #[test]
    fn text_leaf_reads_typography() {
        let root = page(json!([{
            "tag": "H1",
            "class": "_h4sh hero-title",
            "text": "  Hello world ",
            "rect": { "x": 110, "y": 60, "width": 300, "height": 48 },
            "style": {
                "color": "rgba(17, 17, 17, 0.8)",
                "font-family": "\"Space Grotesk\", Inter, sans-serif",
                "font-size": "15.6px",
                "font-weight": "700",
                "line-height": "normal",
                "letter-spacing": "0.5px",
                "text-align": "end",
                "text-transform": "uppercase"
            }
        }]));
        let page = first_page(&root);
        let VisualNode::Text(text) = &page.children[0] else { panic!("expected text") };
        assert_eq!(text.base.name, "hero-title");
        assert_eq!(text.characters, "Hello world");
        assert_eq!(text.font_family.as_deref(), Some("Space Grotesk"));
        assert_eq!(text.font_size, Some(16.0));
        assert_eq!(text.font_weight, Some(700));
        assert_eq!(text.line_height_px, None);
        assert_eq!(text.letter_spacing_px, Some(0.5));
        assert_eq!(text.text_align_horizontal, Some(TextAlign::Right));
        assert_eq!(text.text_case, Some(TextCase::Upper));
        let fills = text.fills.as_ref().unwrap();
        assert_eq!(fills.len(), 1);
        assert!(matches!(fills[0], Paint::Solid(ref s) if s.opacity == 0.8));
    }

    #[test]
    fn text_defaults_when_style_is_unparseable() {
        let root = page(json!([{
            "tag": "span",
            "text": "x",
            "rect": { "x": 110, "y": 60, "width": 10, "height": 10 },
            "style": { "font-weight": "bold", "color": "currentcolor" }
        }]));
        let page = first_page(&root);
        let VisualNode::Text(text) = &page.children[0] else { panic!("expected text") };
        assert_eq!(text.base.name, "span");
        assert_eq!(text.font_weight, Some(400));
        assert_eq!(text.font_size, None);
        assert_eq!(text.fills, Some(vec![]));
    }

    #[test]
    fn vector_markup_resolves_current_color() {
        let root = page(json!([{
            "tag": "svg",
            "rect": { "x": 110, "y": 60, "width": 24, "height": 24 },
            "style": { "color": "rgb(20, 241, 149)" },
            "markup": "<svg viewBox=\"0 0 24 24\" stroke=\"currentColor\"><path d=\"M0 0L24 24\" fill=\"currentColor\"/></svg>",
            "children": [{ "tag": "path", "rect": { "x": 110, "y": 60, "width": 24, "height": 24 } }]
        }]));
        let page = first_page(&root);
        let VisualNode::Vector(vector) = &page.children[0] else { panic!("expected vector") };
        assert_eq!(vector.base.name, "svg");
        assert!(!vector.svg.contains("currentColor"));
        assert_eq!(vector.svg.matches("rgb(20, 241, 149)").count(), 2);
        assert_eq!((vector.base.width, vector.base.height), (24.0, 24.0));
    }

    #[test]
    fn frame_style_degrades_to_defaults() {
        let root = page(json!([{
            "class": "box",
            "rect": { "x": 110, "y": 60, "width": 50, "height": 50 },
            "style": {
                "opacity": "bogus",
                "overflow": "visible",
                "background-image": "linear-gradient(45deg, nonsense)",
                "box-shadow": "rgba(0, 0, 0, 0.2) 0px 1px 2px",
                "border-top-left-radius": "12px"
            },
            "children": [{ "tag": "i", "rect": { "x": 110, "y": 60, "width": 1, "height": 1 } }]
        }]));
        let page = first_page(&root);
        let VisualNode::Frame(frame) = &page.children[0] else { panic!("expected frame") };
        assert_eq!(frame.opacity, Some(1.0));
        assert_eq!(frame.clips_content, Some(false));
        assert_eq!(frame.fills, Some(vec![]));
        assert_eq!(frame.strokes, Some(vec![]));
        assert_eq!(frame.stroke_weight, Some(0.0));
        assert_eq!(frame.effects.as_ref().map(Vec::len), Some(1));
        assert_eq!(frame.radii.top_left_radius, 12.0);
        // childless and textless elements stay frames
        assert!(matches!(frame.children[0], VisualNode::Frame(_)));
    }

    #[test]
    fn every_marker_becomes_a_page() {
        let root = snapshot(json!({
            "children": [
                { "class": "pdf-page", "rect": { "x": 0, "y": 0, "width": 10, "height": 10 } },
                { "class": "wrapper", "rect": { "x": 0, "y": 20, "width": 10, "height": 10 },
                  "children": [{ "class": "pdf-page first", "rect": { "x": 0, "y": 20, "width": 10, "height": 10 } }] }
            ]
        }));
        let document = export_document(&root, &ExportOptions::default()).unwrap();
        assert_eq!(document.version, 1);
        assert_eq!(document.pages.len(), 2);
        assert!(document.pages.iter().all(|p| p.base().x == 0.0 && p.base().y == 0.0));
    }

    #[test]
    fn missing_markers_fail_the_export() {
        let root = snapshot(json!({ "children": [{ "class": "page", "rect": { "width": 10, "height": 10 } }] }));
        let err = export_document(&root, &ExportOptions::default()).unwrap_err();
        assert!(matches!(err, ExportError::NoPages { ref marker } if marker == "pdf-page"));

        let options = ExportOptions { page_marker: "page".to_string() };
        assert!(export_document(&root, &options).is_ok());
    }

    #[test]
    fn repeated_exports_are_identical() {
        let root = page(json!([{ "class": "t", "text": "Same", "rect": { "x": 110, "y": 60, "width": 10, "height": 10 } }]));
        let first = export_document(&root, &ExportOptions::default()).unwrap().to_json().unwrap();
        let second = export_document(&root, &ExportOptions::default()).unwrap().to_json().unwrap();
        assert_eq!(first, second);
    }
}
