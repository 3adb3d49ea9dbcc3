use serde::{Serialize, Deserialize, Deserializer};
use serde_json::Value;
use kurbo::Vec2;
use crate::lenient;

fn default_one() -> f64 {
    1.0
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug, Default)]
pub struct ColorValue {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl ColorValue {
    pub fn gray(value: f64) -> Self {
        Self { r: value, g: value, b: value }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default = "default_one")]
    pub a: f64,
}

impl Rgba {
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(&self) -> ColorValue {
        ColorValue { r: self.r, g: self.g, b: self.b }
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0.0
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct GradientStop {
    pub color: Rgba,
    pub position: f64, // 0.0 to 1.0
}

/// Row-major 2x3 affine matrix in unit-box space: `[[a, b, c], [d, e, f]]`.
pub type GradientTransform = [[f64; 3]; 2];

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GradientFill {
    pub gradient_stops: Vec<GradientStop>,
    pub gradient_transform: GradientTransform,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct SolidFill {
    pub color: ColorValue,
    #[serde(default = "default_one")]
    pub opacity: f64,
}

#[derive(Serialize, Clone, PartialEq, Debug)]
#[serde(tag = "type")]
pub enum Paint {
    #[serde(rename = "SOLID")]
    Solid(SolidFill),
    #[serde(rename = "GRADIENT_LINEAR")]
    GradientLinear(GradientFill),
    /// A paint this crate cannot model, kept as read so the host can reject it.
    #[serde(skip_serializing)]
    Unsupported(Value),
}

impl<'de> Deserialize<'de> for Paint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let paint = lenient::tagged(&value, "SOLID")
            .map(Paint::Solid)
            .or_else(|| lenient::tagged(&value, "GRADIENT_LINEAR").map(Paint::GradientLinear));
        Ok(paint.unwrap_or(Paint::Unsupported(value)))
    }
}

impl Paint {
    pub fn solid(color: Rgba) -> Self {
        Paint::Solid(SolidFill { color: color.rgb(), opacity: color.a })
    }

    pub fn is_solid(&self) -> bool {
        matches!(self, Paint::Solid(_))
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct ShadowEffect {
    pub color: Rgba,
    pub offset: Vec2,
    pub radius: f64,
    #[serde(default)]
    pub spread: f64,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

#[derive(Serialize, Clone, PartialEq, Debug)]
#[serde(tag = "type")]
pub enum Effect {
    #[serde(rename = "DROP_SHADOW")]
    DropShadow(ShadowEffect),
    #[serde(skip_serializing)]
    Unsupported(Value),
}

impl<'de> Deserialize<'de> for Effect {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(lenient::tagged(&value, "DROP_SHADOW")
            .map(Effect::DropShadow)
            .unwrap_or(Effect::Unsupported(value)))
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct CornerRadii {
    #[serde(deserialize_with = "lenient::number")]
    pub top_left_radius: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub top_right_radius: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub bottom_right_radius: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub bottom_left_radius: f64,
}

impl CornerRadii {
    pub fn is_zero(&self) -> bool {
        self.top_left_radius == 0.0
            && self.top_right_radius == 0.0
            && self.bottom_right_radius == 0.0
            && self.bottom_left_radius == 0.0
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justified,
}

impl TextAlign {
    pub fn from_css(value: &str) -> Self {
        match value.trim() {
            "center" => TextAlign::Center,
            "right" | "end" => TextAlign::Right,
            "justify" => TextAlign::Justified,
            _ => TextAlign::Left,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TextCase {
    Upper,
    Lower,
    Title,
    #[default]
    Original,
}

impl TextCase {
    pub fn from_css(value: &str) -> Self {
        match value.trim() {
            "uppercase" => TextCase::Upper,
            "lowercase" => TextCase::Lower,
            "capitalize" => TextCase::Title,
            _ => TextCase::Original,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Hash, Debug)]
pub struct FontName {
    pub family: String,
    pub style: String,
}

impl FontName {
    pub fn new(family: impl Into<String>, style: impl Into<String>) -> Self {
        Self { family: family.into(), style: style.into() }
    }
}

impl std::fmt::Display for FontName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.family, self.style)
    }
}

const WEIGHT_STYLES: [(u16, &str); 9] = [
    (100, "Thin"),
    (200, "Extra Light"),
    (300, "Light"),
    (400, "Regular"),
    (500, "Medium"),
    (600, "Semi Bold"),
    (700, "Bold"),
    (800, "Extra Bold"),
    (900, "Black"),
];

/// Named font style for a numeric weight; off-grid weights snap to the nearest hundred.
pub fn style_for_weight(weight: u16) -> &'static str {
    let rounded = ((weight as f64 / 100.0).round() * 100.0) as u16;
    WEIGHT_STYLES
        .iter()
        .find(|(w, _)| *w == weight)
        .or_else(|| WEIGHT_STYLES.iter().find(|(w, _)| *w == rounded))
        .map(|(_, style)| *style)
        .unwrap_or("Regular")
}
