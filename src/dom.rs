//! [`RenderedElement`] over a live browser DOM.

use kurbo::Rect;
use web_sys::Element;
use crate::tree::{ComputedStyle, RenderedElement, TRACKED_PROPERTIES};

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

#[derive(Clone, Debug)]
pub struct DomElement(pub Element);

impl From<Element> for DomElement {
    fn from(element: Element) -> Self {
        DomElement(element)
    }
}

impl RenderedElement for DomElement {
    fn tag_name(&self) -> String {
        self.0.tag_name().to_lowercase()
    }

    fn class_name(&self) -> String {
        // `className` is an SVGAnimatedString on svg elements
        self.0.get_attribute("class").unwrap_or_default()
    }

    fn children(&self) -> Vec<Self> {
        let collection = self.0.children();
        (0..collection.length())
            .filter_map(|i| collection.item(i))
            .map(DomElement)
            .collect()
    }

    fn text_content(&self) -> String {
        self.0.text_content().unwrap_or_default()
    }

    fn bounding_box(&self) -> Rect {
        let rect = self.0.get_bounding_client_rect();
        Rect::from_origin_size((rect.x(), rect.y()), (rect.width(), rect.height()))
    }

    fn computed_style(&self) -> ComputedStyle {
        let declaration = web_sys::window().and_then(|w| w.get_computed_style(&self.0).ok().flatten());
        let Some(declaration) = declaration else {
            log::warn!("no computed style for <{}>", self.tag_name());
            return ComputedStyle::new();
        };
        TRACKED_PROPERTIES
            .iter()
            .map(|property| (*property, declaration.get_property_value(property).unwrap_or_default()))
            .collect()
    }

    fn is_vector_graphic(&self) -> bool {
        self.0.local_name() == "svg" && self.0.namespace_uri().as_deref() == Some(SVG_NAMESPACE)
    }

    fn markup(&self) -> String {
        self.0.outer_html()
    }
}
