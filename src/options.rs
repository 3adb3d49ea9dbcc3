use serde::{Serialize, Deserialize};
use crate::types::{ColorValue, FontName};

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportOptions {
    /// Class token that marks the root element of one page.
    pub page_marker: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { page_marker: "pdf-page".to_string() }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default, rename_all = "camelCase")]
pub struct ImportOptions {
    /// Horizontal gap between consecutive pages.
    pub page_gap: f64,
    /// Tried in order after the requested font fails to load.
    pub fallback_fonts: Vec<FontName>,
    /// Fill of the rectangle that stands in for unparseable vector markup.
    pub placeholder_color: ColorValue,
    /// Edge length used when a vector entry carries no size.
    pub default_vector_size: f64,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            page_gap: 100.0,
            fallback_fonts: vec![FontName::new("Inter", "Regular"), FontName::new("Roboto", "Regular")],
            placeholder_color: ColorValue::gray(0.9),
            default_vector_size: 24.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_options_keep_defaults() {
        let options: ImportOptions = serde_json::from_value(json!({ "pageGap": 40 })).unwrap();
        assert_eq!(options.page_gap, 40.0);
        assert_eq!(options.fallback_fonts, ImportOptions::default().fallback_fonts);

        let options: ExportOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(options.page_marker, "pdf-page");
    }
}
