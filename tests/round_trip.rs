use futures::executor::block_on;
use scene_bridge::{
    export_document, Canvas, ElementSnapshot, ExportOptions, FontName, HostMessage, LayerKind, Paint,
};
use serde_json::{json, Value};

fn brochure() -> ElementSnapshot {
    let page = |x: f64, children: Value| {
        json!({
            "class": "pdf-page _p1",
            "rect": { "x": x, "y": 40, "width": 595, "height": 842 },
            "style": { "background-color": "rgb(255, 255, 255)", "overflow": "hidden" },
            "children": children
        })
    };

    serde_json::from_value(json!({
        "tag": "main",
        "rect": { "x": 0, "y": 0, "width": 1400, "height": 1000 },
        "children": [
            page(20.0, json!([
                {
                    "class": "card",
                    "rect": { "x": 60, "y": 80, "width": 300, "height": 120 },
                    "style": {
                        "background-image": "linear-gradient(90deg, rgb(255, 0, 0) 0%, rgb(0, 0, 255) 100%)",
                        "border-color": "rgb(10, 10, 10)",
                        "border-width": "2px",
                        "border-top-left-radius": "8px",
                        "border-top-right-radius": "8px",
                        "border-bottom-right-radius": "8px",
                        "border-bottom-left-radius": "8px",
                        "box-shadow": "rgba(0, 0, 0, 0.25) 0px 4px 12px 0px",
                        "overflow": "visible"
                    }
                },
                {
                    "tag": "h1",
                    "class": "title",
                    "text": "Spring catalogue",
                    "rect": { "x": 60, "y": 220, "width": 400, "height": 40 },
                    "style": {
                        "color": "rgb(17, 17, 17)",
                        "font-family": "\"Space Grotesk\", sans-serif",
                        "font-size": "32px",
                        "font-weight": "700",
                        "text-transform": "uppercase"
                    }
                },
                {
                    "tag": "svg",
                    "class": "icon",
                    "rect": { "x": 500, "y": 60, "width": 24, "height": 24 },
                    "style": { "color": "rgb(255, 0, 0)" },
                    "markup": "<svg viewBox=\"0 0 24 24\"><path d=\"M0 0L24 24\" stroke=\"currentColor\"/></svg>"
                },
                {
                    "tag": "svg",
                    "rect": { "x": 540, "y": 60, "width": 16, "height": 16 },
                    "markup": "<svg><path"
                }
            ])),
            page(700.0, json!([]))
        ]
    }))
    .unwrap()
}

#[test]
fn exported_pages_rebuild_on_the_canvas() {
    let document = export_document(&brochure(), &ExportOptions::default()).unwrap();
    let json = document.to_json().unwrap();

    let payload: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(payload["version"], 1);
    assert_eq!(payload["pages"].as_array().map(Vec::len), Some(2));
    assert_eq!(payload["pages"][0]["name"], "pdf-page");

    let mut canvas = Canvas::with_fonts([FontName::new("Inter", "Regular")]);
    let summary = block_on(canvas.import(&json)).unwrap();
    assert_eq!(summary.pages, 2);
    assert_eq!(canvas.messages(), &[HostMessage::Success { message: "Imported 2 page(s)".into() }]);

    let roots = canvas.roots();
    assert_eq!(roots.len(), 2);
    assert_eq!((roots[0].x, roots[0].y), (0.0, 0.0));
    assert_eq!(roots[1].x, 695.0);

    let first = summary.page_ids[0];
    let children = canvas.children_of(first);
    let kinds: Vec<LayerKind> = children.iter().map(|l| l.kind).collect();
    assert_eq!(kinds, vec![LayerKind::Frame, LayerKind::Text, LayerKind::Vector, LayerKind::Rectangle]);

    let card = children[0];
    assert_eq!((card.x, card.y, card.width, card.height), (40.0, 40.0, 300.0, 120.0));
    assert!(matches!(card.fills.as_slice(), [Paint::GradientLinear(g)] if g.gradient_stops.len() == 2));
    assert_eq!(card.strokes.len(), 1);
    assert_eq!(card.stroke_weight, 2.0);
    assert_eq!(card.corner_radii.top_left_radius, 8.0);
    assert_eq!(card.effects.len(), 1);
    assert!(!card.clips_content);

    let title = children[1];
    assert_eq!(title.characters, "Spring catalogue");
    assert_eq!(title.font, Some(FontName::new("Inter", "Regular")));
    assert_eq!(title.font_size, 32.0);
    assert!(!title.auto_resize);

    let icon = children[2];
    assert_eq!(icon.name, "icon");
    assert_eq!(icon.paths.len(), 1);
    assert_eq!(icon.paths[0].stroke, "rgb(255, 0, 0)");

    let broken = children[3];
    assert_eq!(broken.name, "svg");
    assert_eq!((broken.x, broken.y, broken.width, broken.height), (520.0, 20.0, 16.0, 16.0));
}

#[test]
fn exports_are_deterministic() {
    let root = brochure();
    let a = export_document(&root, &ExportOptions::default()).unwrap().to_json().unwrap();
    let b = export_document(&root, &ExportOptions::default()).unwrap().to_json().unwrap();
    assert_eq!(a, b);
}

#[test]
fn foreign_versions_leave_the_canvas_empty() {
    let mut canvas = Canvas::default();
    let status = canvas.import_json(r#"{"version":2,"pages":[]}"#);
    assert_eq!(status, r#"{"type":"error","message":"Unsupported format version: 2"}"#);
    assert!(canvas.layers().is_empty());
}

#[test]
fn custom_page_marker() {
    let root: ElementSnapshot = serde_json::from_value(json!({
        "children": [{ "class": "sheet", "rect": { "width": 10, "height": 10 } }]
    }))
    .unwrap();
    assert!(export_document(&root, &ExportOptions::default()).is_err());

    let options = ExportOptions { page_marker: "sheet".into() };
    let document = export_document(&root, &options).unwrap();
    assert_eq!(document.pages.len(), 1);
}

#[test]
fn unsupported_paints_and_effects_are_skipped_per_property() {
    let mut canvas = Canvas::default();
    let page = json!({
        "type": "FRAME", "name": "page", "width": 200, "height": 200,
        "fills": [
            { "type": "SOLID", "color": { "r": 1, "g": 1, "b": 1 }, "opacity": 1 },
            { "type": "GRADIENT_RADIAL", "gradientStops": [] }
        ],
        "effects": [{ "type": "INNER_SHADOW", "radius": 4 }],
        "opacity": 0.5,
        "children": [
            { "type": "TEXT", "name": "label", "characters": "Hi", "fontWeight": 450.5, "width": 20, "height": 10 },
            { "type": "GROUP", "name": "cluster", "width": 30, "height": 30 }
        ]
    });
    let summary = block_on(canvas.import(&json!({ "version": 1, "pages": [page] }).to_string())).unwrap();
    assert_eq!(summary.nodes, 3);
    assert!(canvas.messages()[0].is_success());

    let page = canvas.roots()[0];
    assert!(page.fills.is_empty());
    assert!(page.effects.is_empty());
    assert_eq!(page.opacity, 0.5);

    let children = canvas.children_of(summary.page_ids[0]);
    assert_eq!(children[0].font, Some(FontName::new("Inter", "Medium")));
    assert_eq!(children[0].characters, "Hi");
    assert_eq!(children[1].kind, LayerKind::Frame);
    assert_eq!(children[1].name, "cluster");
}

#[test]
fn no_text_layer_without_a_font() {
    let mut canvas = Canvas::with_fonts([]);
    let page = json!({ "type": "FRAME", "width": 10, "height": 10, "children": [{ "type": "TEXT", "characters": "x" }] });
    let status = canvas.import_json(&json!({ "version": 1, "pages": [page] }).to_string());

    assert!(status.contains("\"type\":\"error\""));
    assert!(canvas.layers().iter().all(|l| l.kind != LayerKind::Text));
}
